//! Error types for the binary crate

use mapkit_core::MapKitError;

/// Cursor and writer errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BinaryError {
    /// Read past the end of the buffer
    #[error("Buffer underrun at {position}: needed {needed} bytes, {remaining} remaining")]
    Underrun {
        position: usize,
        needed: usize,
        remaining: usize,
    },

    /// Seek target outside the buffer
    #[error("Seek to {position} outside buffer of length {len}")]
    SeekOutOfRange { position: usize, len: usize },

    /// String ran to the end of the buffer without its terminator
    #[error("Missing terminator 0x{terminator:02X} for string starting at {position}")]
    MissingTerminator { position: usize, terminator: u8 },

    /// Raw code conversion failed
    #[error(transparent)]
    RawCode(#[from] RawCodeError),
}

impl BinaryError {
    /// Whether this error came from running out of input
    pub fn is_underrun(&self) -> bool {
        matches!(self, BinaryError::Underrun { .. } | BinaryError::MissingTerminator { .. })
    }
}

/// Raw code encoding and decoding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RawCodeError {
    /// A 0x00 byte, reserved as the null sentinel
    #[error("Raw code contains a null byte")]
    NullByte,

    /// A 0xFF byte, which the format cannot represent
    #[error("Raw code contains unsupported byte 0xFF")]
    Unsupported,

    /// The carry chain ran into 0xFF while encoding
    #[error("Raw code overflow while encoding {value}")]
    Overflow { value: i32 },

    /// Encoded form is neither 1 nor 4 bytes
    #[error("Invalid raw code length: {0}")]
    InvalidLength(usize),

    /// Character outside the single-byte range
    #[error("Invalid raw code character: {0:?}")]
    InvalidChar(char),
}

impl From<BinaryError> for MapKitError {
    fn from(err: BinaryError) -> Self {
        MapKitError::Binary(err.to_string())
    }
}

impl From<RawCodeError> for MapKitError {
    fn from(err: RawCodeError) -> Self {
        MapKitError::RawCode(err.to_string())
    }
}

/// Result type for binary operations
pub type Result<T> = std::result::Result<T, BinaryError>;
