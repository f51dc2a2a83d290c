//! Device link errors

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum LinkError {
    #[error("Connection unavailable: {0}")]
    ConnectionUnavailable(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Device response timeout")]
    Timeout,
}
