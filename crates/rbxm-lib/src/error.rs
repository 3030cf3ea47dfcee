//! Error types for rbxm-lib

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Decoder error type. A load either produces a complete document or one of
/// these; there is no partial success.
#[derive(Error, Debug)]
pub enum Error {
    /// Cannot open, size, or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Magic or signature mismatch, or a textual-sibling path
    #[error("unrecognized file format")]
    UnrecognizedFormat,

    /// File header carries a version this reader does not understand
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u16),

    /// A format tag inside a recognized chunk is outside the enumerated set
    #[error("unrecognized layout: {0}")]
    UnrecognizedLayout(String),

    /// Decompression size mismatch, out-of-range index, inconsistent counts
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    /// A read would cross the end of a buffer
    #[error("truncated data: {needed} bytes requested at offset {offset}")]
    Truncated { offset: usize, needed: usize },
}

impl Error {
    /// Create an unrecognized-layout error
    pub fn layout(msg: impl Into<String>) -> Self {
        Error::UnrecognizedLayout(msg.into())
    }

    /// Create a corrupt-payload error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptPayload(msg.into())
    }
}
