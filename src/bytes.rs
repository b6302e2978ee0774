use std::io::{self, ErrorKind};

/// Bytes reads from a reader one byte at a time or in bulk while keeping track of
/// the stream offset.
///
/// Reads are forward-only; nothing is ever pushed back.
pub struct Bytes<R>
where
    R: io::Read,
{
    reader: R,
    num_read: usize,
    buf: [u8; 1],
}

impl<R> Bytes<R>
where
    R: io::Read,
{
    pub fn new(reader: R) -> Self {
        Bytes {
            reader,
            num_read: 0,
            buf: [0u8; 1],
        }
    }

    /// Read the next byte, or `Ok(None)` if the reader is exhausted.
    pub fn next(&mut self) -> Result<Option<u8>, io::Error> {
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.num_read += 1;
                    return Ok(Some(self.buf[0]));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// Fill `buf` tolerating short reads. Returns the number of bytes actually
    /// filled, which is less than `buf.len()` only if the reader was exhausted.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    self.num_read += n;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(filled)
    }

    /// Number of bytes consumed from the reader so far.
    pub fn offset(&self) -> usize {
        self.num_read
    }
}
