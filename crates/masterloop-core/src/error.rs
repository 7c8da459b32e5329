//! Error types shared by the COS and DevSync codecs.

use thiserror::Error;

/// Errors that can occur while encoding or decoding Masterloop binary payloads.
///
/// Every failure aborts the current encode/decode call. No partial results
/// are returned, so callers must discard the whole message on error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Format or protocol version is not supported.
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u16),

    /// Encoder was asked to produce a header flag combination it cannot emit.
    #[error("Unsupported header flags: 0x{0:02X}")]
    UnsupportedHeaderFlags(u8),

    /// Data type is outside the supported set for the active version.
    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// Wire observation type nibble is not a defined type.
    #[error("Unsupported observation type: {0}")]
    UnsupportedObservationType(u8),

    /// Message does not have the expected structure (magic mismatch, bad region table, ...).
    #[error("Invalid data format: {0}")]
    InvalidDataFormat(String),

    /// Observation id is not declared by the device template.
    #[error("Unknown observation id: {0}")]
    UnknownObservationId(u16),

    /// Observation id does not fit in the 12-bit descriptor field.
    #[error("Observation id {0} exceeds the 12-bit maximum of 4095")]
    InvalidObservationId(u16),

    /// Buffer was exhausted in the middle of a read.
    #[error("Unexpected end of data at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEndOfData {
        /// Cursor position where the read started.
        offset: usize,
        /// Bytes required by the read.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// Timestamp cannot be represented in the selected wire width.
    #[error("Timestamp out of range: {0}")]
    TimestampOutOfRange(String),

    /// Length-prefixed field is larger than its prefix can express.
    #[error("Length {length} exceeds maximum {max}")]
    LengthOverflow {
        /// Actual length.
        length: usize,
        /// Largest length the prefix can carry.
        max: usize,
    },

    /// String field is not valid UTF-8 (or ASCII where ASCII is required).
    #[error("Invalid text in string field at offset {0}")]
    InvalidUtf8(usize),

    /// DevSync request encoding has no defined wire layout yet.
    #[error("DevSync request encoding is not supported")]
    RequestEncodingUnsupported,
}

impl CodecError {
    /// Create an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        CodecError::InvalidDataFormat(message.into())
    }

    /// Create an unsupported data type error.
    pub fn unsupported_data_type(name: impl std::fmt::Display) -> Self {
        CodecError::UnsupportedDataType(name.to_string())
    }

    /// Create a timestamp range error.
    pub fn timestamp_out_of_range(message: impl Into<String>) -> Self {
        CodecError::TimestampOutOfRange(message.into())
    }
}

/// Result type alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
