#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Source level IO failure. These end a run.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A sync marker was found but the source ran dry before a full unit could be
    /// read. The bytes read for the unit are consumed.
    #[error("truncated unit at offset {offset}: got {got} of {wanted} bytes")]
    Truncated {
        /// Stream offset of the sync marker for the failed unit
        offset: usize,
        /// Number of bytes read, including the sync marker
        got: usize,
        wanted: usize,
    },

    #[error("invalid section: {0}")]
    Section(String),

    /// A section that does not fit in the unit that starts it. Sections spanning
    /// several units are not reassembled.
    #[error("section {table_id:#04x} needs {length} bytes, {available} available in unit")]
    IncompleteSection {
        table_id: u8,
        length: usize,
        available: usize,
    },

    #[error("render failed: {0}")]
    Render(String),
}

impl Error {
    /// True for errors that only affect a single unit and after which reading may
    /// continue.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
