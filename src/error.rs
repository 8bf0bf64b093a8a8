//! Decoder error types.

use thiserror::Error;

/// GIF decoding errors.
#[derive(Error, Debug)]
pub enum GifError {
    /// The cursor ran past the end of the input buffer.
    #[error("Unexpected end of input")]
    Eof,

    /// The header is neither `GIF87a` nor `GIF89a`.
    #[error("Invalid GIF signature")]
    InvalidSignature,

    /// A structural constraint of the stream was violated.
    #[error("Malformed stream: {0}")]
    Malformed(String),

    /// A valid but unsupported feature was encountered.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Decoder result type.
pub type Result<T> = std::result::Result<T, GifError>;

impl GifError {
    /// Create a `Malformed` error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        GifError::Malformed(msg.into())
    }

    /// Create an `Unsupported` error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        GifError::Unsupported(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GifError::malformed("bad block size");
        assert!(err.to_string().contains("bad block size"));

        assert_eq!(GifError::Eof.to_string(), "Unexpected end of input");
    }
}
