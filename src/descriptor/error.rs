/// Descriptor decoding errors.
///
/// All of these are confined to a single descriptor. Sibling descriptors in the same
/// loop can still be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A read would go past the end of the descriptor payload.
    #[error("descriptor {tag:#04x} truncated: wanted {wanted} bytes at offset {offset}, {available} available")]
    Truncated {
        tag: u8,
        /// Payload offset of the failed read
        offset: usize,
        wanted: usize,
        available: usize,
    },

    /// An extended event item ran past the declared end of the items region.
    #[error("descriptor {tag:#04x} item ends at offset {offset}, past items region end {end}")]
    ItemsOverrun { tag: u8, offset: usize, end: usize },

    /// The declared descriptor length is shorter than the fixed fields already read.
    #[error("descriptor {tag:#04x} length {length} is less than the {consumed} bytes consumed")]
    LengthUnderflow {
        tag: u8,
        length: usize,
        consumed: usize,
    },

    /// A descriptor declares more bytes than remain in its enclosing loop.
    #[error("descriptor {tag:#04x} at loop offset {offset} declares {length} bytes, {available} available")]
    LoopOverrun {
        tag: u8,
        offset: usize,
        length: usize,
        available: usize,
    },
}

impl Error {
    /// Tag of the descriptor that failed to decode.
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            Error::Truncated { tag, .. }
            | Error::ItemsOverrun { tag, .. }
            | Error::LengthUnderflow { tag, .. }
            | Error::LoopOverrun { tag, .. } => *tag,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
