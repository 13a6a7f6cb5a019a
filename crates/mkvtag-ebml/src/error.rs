//! Error types for mkvtag-ebml.

use std::io;
use thiserror::Error;

/// Result type for EBML operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for EBML operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A variable-length integer could not be decoded.
    #[error("Invalid variable-length integer at offset {offset}")]
    InvalidVint { offset: u64 },

    /// An element ID was longer than four bytes.
    #[error("Invalid element ID at offset {offset}")]
    InvalidElementId { offset: u64 },

    /// An element claims to extend past its parent or the stream.
    #[error("Element 0x{id:X} at offset {offset} overflows its container")]
    ElementOverflow { id: u32, offset: u64 },

    /// A numeric element has a payload length its type does not allow.
    #[error("Element 0x{id:X} has invalid {kind} payload length {size}")]
    InvalidPayload { id: u32, kind: &'static str, size: u64 },

    /// A size does not fit into an eight byte EBML size field.
    #[error("Size {0} cannot be encoded as an EBML size")]
    SizeTooLarge(u64),

    /// A Void element cannot be encoded in the requested number of bytes.
    #[error("Cannot encode a Void element of {0} bytes")]
    VoidTooSmall(u64),

    /// A shift would move data before the start of the stream.
    #[error("Shift moves data out of bounds")]
    ShiftOverflow,
}

impl Error {
    /// Whether this error came from reading a malformed element header.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::InvalidVint { .. } | Self::InvalidElementId { .. } | Self::ElementOverflow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidVint { offset: 12 };
        assert_eq!(err.to_string(), "Invalid variable-length integer at offset 12");

        let err = Error::ElementOverflow {
            id: 0x1A45DFA3,
            offset: 0,
        };
        assert_eq!(
            err.to_string(),
            "Element 0x1A45DFA3 at offset 0 overflows its container"
        );

        let err = Error::VoidTooSmall(1);
        assert_eq!(err.to_string(), "Cannot encode a Void element of 1 bytes");
    }

    #[test]
    fn test_is_malformed() {
        assert!(Error::InvalidVint { offset: 0 }.is_malformed());
        assert!(Error::InvalidElementId { offset: 0 }.is_malformed());
        assert!(!Error::VoidTooSmall(1).is_malformed());
        assert!(!Error::SizeTooLarge(u64::MAX).is_malformed());
    }
}
