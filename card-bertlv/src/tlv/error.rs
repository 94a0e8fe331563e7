//! TLV error type

use thiserror::Error;

use super::parser::ParseError;

/// Errors returned by the TLV decoder and encoder
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TLVError {
    /// The buffer is not a well-formed TLV structure
    ///
    /// The wrapped [`ParseError`] tells where and why; callers should treat
    /// every cause alike.
    #[error("Invalid TLV structure: {0}")]
    InvalidStructure(#[from] ParseError),

    /// The tag id does not fit in three bytes
    #[error("Tag id out of range: 0x{0:X}")]
    OutOfRange(u32),

    /// The value is too long for a two-byte length field
    #[error("Value too long: {0} bytes (max 65535)")]
    ValueTooLong(usize),
}

/// Result type alias for TLV operations
pub type TLVResult<T> = Result<T, TLVError>;
