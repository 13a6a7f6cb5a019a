//! Error types for mkvtag-matroska.

use std::io;
use thiserror::Error;

/// Result type for mkvtag-matroska operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for mkvtag-matroska operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Low-level EBML failure (I/O, malformed header at a fatal point).
    #[error("EBML error: {0}")]
    Ebml(#[from] mkvtag_ebml::Error),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream is not a Matroska or WebM document.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The SeekHead reservation left a gap that no Void element can fill.
    #[error("SeekHead reservation of {reserved} bytes leaves {remaining} unusable byte(s)")]
    SeekReservation { reserved: u64, remaining: u64 },

    /// The file was opened without write access.
    #[error("File is read-only")]
    ReadOnly,
}

impl Error {
    /// Create an unsupported format error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Whether the error means the input is not a supported container.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Self::UnsupportedFormat(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unsupported("DocType \"avi\"");
        assert_eq!(err.to_string(), "Unsupported format: DocType \"avi\"");

        let err = Error::SeekReservation {
            reserved: 100,
            remaining: 1,
        };
        assert_eq!(
            err.to_string(),
            "SeekHead reservation of 100 bytes leaves 1 unusable byte(s)"
        );
    }

    #[test]
    fn test_error_from_ebml() {
        let err = Error::from(mkvtag_ebml::Error::VoidTooSmall(1));
        assert!(matches!(err, Error::Ebml(_)));
        assert!(!err.is_unsupported_format());
        assert!(Error::unsupported("x").is_unsupported_format());
    }
}
