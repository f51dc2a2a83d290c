//! Error types for frame parsing

use thiserror::Error;

/// Result type for frame parsing operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while extracting data bytes from a located frame
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame ended before the expected data byte
    #[error("frame truncated: no data byte at offset {offset}")]
    MissingByte { offset: usize },

    /// Token at the expected position does not parse as a hex byte
    #[error("not a hex byte: {token}")]
    InvalidHex { token: String },
}
