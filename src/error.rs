use thiserror::Error;

/// Errors produced by the QOI stream reader, writer, encoder and decoder.
#[derive(Error, Debug)]
pub enum QoiError {
    // Caller errors, detected before any I/O
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("Invalid argument width")]
    InvalidArgumentWidth,
    #[error("Invalid argument height")]
    InvalidArgumentHeight,
    #[error("Invalid argument channel count: {0}")]
    InvalidArgumentChannels(u8),
    #[error("Invalid argument size: expected {expected} bytes, got {actual}")]
    InvalidArgumentSize { expected: usize, actual: usize },
    #[error("Too many pixels: {pixels} exceeds the limit of {limit}")]
    TooManyPixels { pixels: u64, limit: u64 },

    // Stream errors
    #[error("Invalid format: magic bytes do not match 'qoif'")]
    InvalidFormat,
    #[error("Invalid header: {0}")]
    InvalidHeader(&'static str),
    #[error("Corrupt stream: {0}")]
    CorruptStream(&'static str),
    #[error("Truncated stream")]
    TruncatedStream,
    #[error("End of stream")]
    EndOfStream,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QoiError {
    /// True for the caller-side argument errors.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::InvalidArgumentWidth
                | Self::InvalidArgumentHeight
                | Self::InvalidArgumentChannels(_)
                | Self::InvalidArgumentSize { .. }
                | Self::TooManyPixels { .. }
        )
    }

    /// Exhaustion of the source is reported as truncation once the caller
    /// expects more pixel data.
    pub(crate) fn into_truncated(self) -> Self {
        match self {
            Self::EndOfStream => Self::TruncatedStream,
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, QoiError>;
