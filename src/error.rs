use thiserror::Error;

use crate::structure::DataFormat;

/// Convenience result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type returned by every reader, writer, and accumulator.
///
/// [`Error::EndOfEntries`] is not a failure: it signals that a reader has
/// been drained. Use [`Error::is_end_of_entries`] to tell it apart from real
/// errors, even when a driving loop has wrapped it with positional context.
#[derive(Debug, Error)]
pub enum Error {
    /// The structure names a format this crate cannot read or write.
    #[error("unsupported data format: {0}")]
    UnsupportedFormat(String),

    /// The codec needs a schema and the structure has none.
    #[error("schema required for {0} format")]
    SchemaRequired(DataFormat),

    /// The schema's root `type` is neither `array` nor `object`.
    #[error("invalid schema root type: {0}")]
    InvalidRootType(String),

    /// Malformed input for the declared format.
    #[error("{format} decode error: {message}")]
    Decode { format: DataFormat, message: String },

    /// An object-rooted writer received the same key twice.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A writer was handed a value it has no representation for.
    #[error("unsupported value shape: {0}")]
    UnsupportedValueShape(String),

    /// The structure names a compression codec that is not registered.
    #[error("unsupported compression: {0}")]
    UnsupportedCompression(String),

    /// The reader is exhausted.
    #[error("end of entries")]
    EndOfEntries,

    /// An error annotated with the index of the entry being processed.
    #[error("entry {index}: {source}")]
    AtEntry {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    /// Operation attempted on a component that has already been closed.
    #[error("{0} is closed")]
    Closed(&'static str),

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parse or write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "io-xlsx")]
    /// Spreadsheet container error (feature-gated behind `io-xlsx`).
    #[error("xlsx error: {0}")]
    Xlsx(String),
}

impl Error {
    /// Shorthand for a [`Error::Decode`] with a formatted message.
    pub(crate) fn decode(format: DataFormat, message: impl Into<String>) -> Self {
        Self::Decode {
            format,
            message: message.into(),
        }
    }

    /// Wraps `self` with the index of the entry that produced it.
    #[must_use]
    pub fn at_entry(self, index: usize) -> Self {
        match self {
            // the sentinel is never wrapped
            Self::EndOfEntries => Self::EndOfEntries,
            other => Self::AtEntry {
                index,
                source: Box::new(other),
            },
        }
    }

    /// Returns `true` when this error is the end-of-stream sentinel.
    #[must_use]
    pub fn is_end_of_entries(&self) -> bool {
        match self {
            Self::EndOfEntries => true,
            Self::AtEntry { source, .. } => source.is_end_of_entries(),
            _ => false,
        }
    }
}

#[cfg(feature = "io-xlsx")]
impl From<calamine::XlsxError> for Error {
    fn from(err: calamine::XlsxError) -> Self {
        Self::Xlsx(err.to_string())
    }
}

#[cfg(feature = "io-xlsx")]
impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Xlsx(err.to_string())
    }
}
