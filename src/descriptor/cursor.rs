use std::fmt::Display;

use serde::Serialize;

use super::{Error, Result};

/// Text with the character set identifier byte that preceded it.
///
/// The identifier is reported as-is; no codepage translation is done. Text bytes
/// are mapped one-to-one onto characters (ISO 8859-1).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CharSetString {
    /// `None` for a zero length string, which has no room for an identifier.
    pub charset: Option<u8>,
    pub text: String,
}

impl Display for CharSetString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

pub(crate) fn latin1(dat: &[u8]) -> String {
    dat.iter().copied().map(char::from).collect()
}

/// Bounds checked sequential reader over a single descriptor payload.
///
/// Every read checks the remaining length first and advances the position by
/// exactly the number of bytes it consumed.
#[derive(Debug)]
pub struct Cursor<'a> {
    tag: u8,
    dat: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// `tag` is only used to attribute errors.
    #[must_use]
    pub fn new(tag: u8, dat: &'a [u8]) -> Self {
        Cursor { tag, dat, pos: 0 }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.dat.len() - self.pos
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dat.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dat.is_empty()
    }

    fn check(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::Truncated {
                tag: self.tag,
                offset: self.pos,
                wanted: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.check(n)?;
        let dat = &self.dat[self.pos..self.pos + n];
        self.pos += n;
        Ok(dat)
    }

    /// Consume `n` bytes and return a cursor limited to them. Offsets reported by
    /// the returned cursor are relative to its own start.
    pub fn split(&mut self, n: usize) -> Result<Cursor<'a>> {
        Ok(Cursor::new(self.tag, self.take(n)?))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let dat = self.take(2)?;
        Ok(u16::from_be_bytes([dat[0], dat[1]]))
    }

    /// Read a byte and split it into its high and low nibbles.
    pub fn read_nibbles(&mut self) -> Result<(u8, u8)> {
        let b = self.read_u8()?;
        Ok((b >> 4, b & 0xf))
    }

    /// Consume exactly `n` bytes as text.
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String> {
        Ok(latin1(self.take(n)?))
    }

    /// Consume a character set identifier byte followed by `n - 1` bytes of text.
    pub fn read_charset_string(&mut self, n: usize) -> Result<CharSetString> {
        if n == 0 {
            return Ok(CharSetString::default());
        }
        let dat = self.take(n)?;
        Ok(CharSetString {
            charset: Some(dat[0]),
            text: latin1(&dat[1..]),
        })
    }

    /// Consume a length byte `L` and then [Cursor::read_charset_string] of `L`.
    pub fn read_prefixed_charset_string(&mut self) -> Result<CharSetString> {
        let len = self.read_u8()?;
        self.read_charset_string(usize::from(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_string_advances() {
        let mut cur = Cursor::new(0, b"engfra");
        assert_eq!(cur.read_fixed_string(3).unwrap(), "eng");
        assert_eq!(cur.position(), 3);
        assert_eq!(cur.read_fixed_string(3).unwrap(), "fra");
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn charset_string() {
        let mut cur = Cursor::new(0, &[0x05, b'a', b'b', 0xff]);
        let s = cur.read_charset_string(3).unwrap();
        assert_eq!(s.charset, Some(5));
        assert_eq!(s.text, "ab");
        assert_eq!(cur.position(), 3);
    }

    #[test]
    fn charset_string_zero_length() {
        let mut cur = Cursor::new(0, &[]);
        let s = cur.read_charset_string(0).unwrap();
        assert_eq!(s, CharSetString::default());
        assert_eq!(cur.position(), 0);
    }

    #[test]
    fn prefixed_charset_string() {
        let mut cur = Cursor::new(0, &[0x03, 0x00, b'h', b'i', 0x99]);
        let s = cur.read_prefixed_charset_string().unwrap();
        assert_eq!(s.charset, Some(0));
        assert_eq!(s.text, "hi");
        assert_eq!(cur.position(), 4, "cursor should advance by 1 + L");
    }

    #[test]
    fn prefixed_string_longer_than_payload() {
        let mut cur = Cursor::new(0x4d, &[0x09, 0x00, b'h']);
        let err = cur.read_prefixed_charset_string().unwrap_err();
        assert_eq!(
            err,
            Error::Truncated {
                tag: 0x4d,
                offset: 1,
                wanted: 9,
                available: 2,
            }
        );
    }

    #[test]
    fn latin1_maps_high_bytes() {
        assert_eq!(latin1(&[b'c', 0xe9]), "c\u{e9}");
    }

    #[test]
    fn read_u16_big_endian() {
        let mut cur = Cursor::new(0, &[0x12, 0x34]);
        assert_eq!(cur.read_u16().unwrap(), 0x1234);
        assert!(cur.read_u8().is_err());
    }

    #[test]
    fn split_is_bounded() {
        let mut cur = Cursor::new(0x4e, &[1, 2, 3, 4, 5]);
        cur.read_u8().unwrap();
        let mut sub = cur.split(2).unwrap();
        assert_eq!(cur.position(), 3);
        assert_eq!(sub.read_u16().unwrap(), 0x0203);
        assert!(matches!(
            sub.read_u8(),
            Err(Error::Truncated {
                offset: 2,
                available: 0,
                ..
            })
        ));
        assert!(cur.split(3).is_err());
    }
}
