use std::io::Read;

use tracing::{debug, trace, warn};

use crate::bytes::Bytes;
use crate::unit::{Unit, SYNC_BYTE, UNIT_LEN};
use crate::{Error, Result};

/// Synchronizer counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    /// Number of complete units produced.
    pub units: usize,
    /// Bytes discarded while scanning for a sync byte.
    pub skipped: usize,
    /// Number of sync bytes that were not followed by a full unit.
    pub truncated: usize,
}

/// Synchronizer scans a byte stream for the sync byte and assembles fixed size units.
///
/// Synchronization is best-effort and forward-only. Bytes consumed for a unit that
/// could not be filled are never rescanned for a sync byte.
pub struct Synchronizer<R>
where
    R: Read,
{
    bytes: Bytes<R>,
    stats: SyncStats,
}

impl<R> Synchronizer<R>
where
    R: Read,
{
    pub fn new(reader: R) -> Self {
        Synchronizer {
            bytes: Bytes::new(reader),
            stats: SyncStats::default(),
        }
    }

    /// Scan until the next sync byte, returning its stream offset or `Ok(None)` when
    /// the source is exhausted first.
    fn scan(&mut self) -> Result<Option<usize>> {
        let start = self.bytes.offset();
        while let Some(b) = self.bytes.next()? {
            if b == SYNC_BYTE {
                let offset = self.bytes.offset() - 1;
                if offset > start {
                    debug!(skipped = offset - start, offset, "resynchronized");
                    self.stats.skipped += offset - start;
                }
                return Ok(Some(offset));
            }
        }
        self.stats.skipped += self.bytes.offset() - start;
        Ok(None)
    }

    /// Read the next unit.
    ///
    /// Returns `Ok(None)` at the end of the stream.
    ///
    /// # Errors
    /// [Error::Truncated] if a sync byte was found but the stream ended before a full
    /// unit was read. Reading may continue after this error, and will typically
    /// produce `Ok(None)`. [Error::Io] for any source error other than interrupts,
    /// which should be treated as fatal.
    pub fn read_unit(&mut self) -> Result<Option<Unit>> {
        let Some(offset) = self.scan()? else {
            return Ok(None);
        };

        let mut buf = [0u8; UNIT_LEN];
        buf[0] = SYNC_BYTE;
        let got = 1 + self.bytes.fill(&mut buf[1..])?;
        if got != UNIT_LEN {
            warn!(offset, got, "truncated unit");
            self.stats.truncated += 1;
            return Err(Error::Truncated {
                offset,
                got,
                wanted: UNIT_LEN,
            });
        }

        self.stats.units += 1;
        let unit = Unit::from_array(buf);
        trace!(offset, %unit, "unit");
        Ok(Some(unit))
    }

    /// Number of bytes consumed from the source so far.
    pub fn offset(&self) -> usize {
        self.bytes.offset()
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }
}

impl<R> IntoIterator for Synchronizer<R>
where
    R: Read,
{
    type Item = Result<Unit>;
    type IntoIter = UnitIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        UnitIter {
            sync: self,
            done: false,
        }
    }
}

/// Iterates over synchronized units. Created using `Synchronizer::into_iter`.
///
/// ## Errors
/// Truncated units are provided as [Error::Truncated] and iteration continues. An
/// [Error::Io] is provided once, after which the iterator ends.
pub struct UnitIter<R>
where
    R: Read,
{
    sync: Synchronizer<R>,
    done: bool,
}

impl<R> UnitIter<R>
where
    R: Read,
{
    pub fn stats(&self) -> SyncStats {
        self.sync.stats()
    }
}

impl<R> Iterator for UnitIter<R>
where
    R: Read,
{
    type Item = Result<Unit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.sync.read_unit() {
            Ok(Some(unit)) => Some(Ok(unit)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                if !err.is_recoverable() {
                    self.done = true;
                }
                Some(Err(err))
            }
        }
    }
}

/// Creates an iterator that produces synchronized units from `reader`.
///
/// Any partial unit at the end of the stream is provided as an error. For more
/// control over the process see [Synchronizer].
pub fn read_units<R>(reader: R) -> UnitIter<R>
where
    R: Read,
{
    Synchronizer::new(reader).into_iter()
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    fn unit_with(fill: u8) -> Vec<u8> {
        let mut dat = vec![fill; UNIT_LEN];
        dat[0] = SYNC_BYTE;
        dat
    }

    #[test]
    fn empty_source_is_end_of_stream() {
        let mut sync = Synchronizer::new(&[][..]);
        assert!(sync.read_unit().unwrap().is_none());
        assert_eq!(sync.stats(), SyncStats::default());
    }

    #[test]
    fn source_without_marker_is_end_of_stream() {
        let dat = vec![0u8; 1000];
        let mut sync = Synchronizer::new(&dat[..]);
        assert!(sync.read_unit().unwrap().is_none());
        assert_eq!(sync.stats().skipped, 1000);
        assert_eq!(sync.stats().units, 0);
    }

    #[test]
    fn skips_leading_garbage() {
        let mut dat = vec![0x00, 0x01, 0x02, 0x03, 0x04];
        dat.extend(unit_with(0xaa));
        let mut sync = Synchronizer::new(&dat[..]);

        let unit = sync.read_unit().unwrap().expect("expected a unit");
        assert_eq!(unit.as_bytes(), &dat[5..]);
        assert_eq!(sync.stats().skipped, 5);
        assert_eq!(sync.offset(), 5 + UNIT_LEN);
    }

    #[test]
    fn truncated_unit_is_an_error() {
        let dat = &unit_with(0x11)[..100];
        let mut sync = Synchronizer::new(dat);

        match sync.read_unit() {
            Err(Error::Truncated { offset, got, wanted }) => {
                assert_eq!(offset, 0);
                assert_eq!(got, 100);
                assert_eq!(wanted, UNIT_LEN);
            }
            zult => panic!("expected truncated error, got {zult:?}"),
        }
        assert!(sync.read_unit().unwrap().is_none());
        assert_eq!(sync.stats().truncated, 1);
    }

    #[test]
    fn consecutive_units() {
        let mut dat = unit_with(0x01);
        dat.extend(unit_with(0x02));
        let units: Vec<Unit> = read_units(&dat[..]).map(|z| z.unwrap()).collect();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].as_bytes()[1], 0x01);
        assert_eq!(units[1].as_bytes()[1], 0x02);
    }

    #[test]
    fn failed_unit_bytes_are_not_rescanned() {
        // A marker inside a unit consumed by a failed read is not revisited.
        let mut dat = unit_with(0x00);
        dat[50] = SYNC_BYTE;
        let dat = &dat[..120];
        let zults: Vec<_> = read_units(dat).collect();
        assert_eq!(zults.len(), 1);
        assert!(matches!(zults[0], Err(Error::Truncated { got: 120, .. })));
    }

    struct Failing;

    impl io::Read for Failing {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "boom"))
        }
    }

    #[test]
    fn io_error_ends_iteration() {
        let zults: Vec<_> = read_units(Failing).collect();
        assert_eq!(zults.len(), 1);
        assert!(matches!(zults[0], Err(Error::Io(_))));
    }
}
