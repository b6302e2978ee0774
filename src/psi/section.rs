use crate::{Error, Result};

/// Take `n` bytes from the front of `dat`.
pub(crate) fn take<'a>(dat: &mut &'a [u8], n: usize, what: &str) -> Result<&'a [u8]> {
    if dat.len() < n {
        return Err(Error::Section(format!(
            "{what}: wanted {n} bytes, {} available",
            dat.len()
        )));
    }
    let (head, tail) = dat.split_at(n);
    *dat = tail;
    Ok(head)
}

pub(crate) fn take_u16(dat: &mut &[u8], what: &str) -> Result<u16> {
    let x = take(dat, 2, what)?;
    Ok(u16::from_be_bytes([x[0], x[1]]))
}

/// Take a loop prefixed by a 12-bit length.
pub(crate) fn take_loop<'a>(dat: &mut &'a [u8], what: &str) -> Result<&'a [u8]> {
    let len = take_u16(dat, what)? & 0x0fff;
    take(dat, usize::from(len), what)
}

/// A long form PSI section borrowed from the unit carrying it.
///
/// The CRC is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    pub table_id: u8,
    /// table_id_extension, whose meaning depends on the table
    pub extension: u16,
    pub version: u8,
    pub current_next: bool,
    pub section_number: u8,
    pub last_section_number: u8,
    /// Bytes after the 8 byte header, without the CRC.
    pub data: &'a [u8],
}

impl<'a> Section<'a> {
    /// Bytes of header preceding `section_length`.
    pub const PREFIX_LEN: usize = 3;
    /// Full long form header length.
    pub const HEADER_LEN: usize = 8;
    pub const CRC_LEN: usize = 4;
    /// Table id value used for stuffing after the last section in a unit.
    pub const STUFFING: u8 = 0xff;

    /// Decode a section starting at the first byte of `dat`. Returns the section and
    /// the total number of bytes it occupies.
    ///
    /// # Errors
    /// [Error::IncompleteSection] if `dat` does not hold the entire section, or
    /// [Error::Section] if the header is not a long form header.
    pub fn decode(dat: &'a [u8]) -> Result<(Section<'a>, usize)> {
        if dat.len() < Self::PREFIX_LEN {
            return Err(Error::Section("not enough bytes for section header".into()));
        }
        let table_id = dat[0];
        if dat[1] & 0x80 == 0 {
            return Err(Error::Section(format!(
                "table {table_id:#04x} is not a long form section"
            )));
        }
        let section_length = usize::from(u16::from_be_bytes([dat[1], dat[2]]) & 0x0fff);
        let total = Self::PREFIX_LEN + section_length;
        if section_length < Self::HEADER_LEN - Self::PREFIX_LEN + Self::CRC_LEN {
            return Err(Error::Section(format!(
                "table {table_id:#04x} section length {section_length} too short"
            )));
        }
        if dat.len() < total {
            return Err(Error::IncompleteSection {
                table_id,
                length: total,
                available: dat.len(),
            });
        }

        Ok((
            Section {
                table_id,
                extension: u16::from_be_bytes([dat[3], dat[4]]),
                version: (dat[5] >> 1) & 0x1f,
                current_next: dat[5] & 0x1 == 1,
                section_number: dat[6],
                last_section_number: dat[7],
                data: &dat[Self::HEADER_LEN..total - Self::CRC_LEN],
            },
            total,
        ))
    }
}

/// Iterates the complete sections in a unit payload that starts a section, i.e.,
/// one with the payload unit start indicator set. The first payload byte is the
/// pointer field.
///
/// Iteration stops at stuffing, at the end of the payload, or after the first error.
pub struct Sections<'a> {
    dat: &'a [u8],
    done: bool,
}

impl<'a> Sections<'a> {
    #[must_use]
    pub fn new(payload: &'a [u8]) -> Self {
        let Some((&pointer, rest)) = payload.split_first() else {
            return Sections { dat: &[], done: true };
        };
        // Bytes before the pointer target belong to a section started in an earlier
        // unit, which we do not reassemble.
        let dat = rest.get(usize::from(pointer)..).unwrap_or_default();
        Sections { dat, done: false }
    }
}

impl<'a> Iterator for Sections<'a> {
    type Item = Result<Section<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.dat.is_empty() || self.dat[0] == Section::STUFFING {
            return None;
        }
        match Section::decode(self.dat) {
            Ok((section, total)) => {
                self.dat = &self.dat[total..];
                Some(Ok(section))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
