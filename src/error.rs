//! Error types for the Archipelago console client.

use thiserror::Error;

/// Errors that can occur when using the console client.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Failed to send a frame through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a frame from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was already closed.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize or deserialize a protocol frame.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server address was empty or could not be used.
    #[error("invalid server address: {0:?}")]
    InvalidAddress(String),

    /// Opening the connection took longer than the configured timeout.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for console client operations.
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            ConsoleError::InvalidAddress(String::new()).to_string(),
            r#"invalid server address: """#
        );
        assert_eq!(ConsoleError::Timeout.to_string(), "operation timed out");
        assert_eq!(
            ConsoleError::TransportClosed.to_string(),
            "transport connection closed"
        );
    }

    #[test]
    fn json_errors_convert() {
        let err: ConsoleError = serde_json::from_str::<u8>("nope").unwrap_err().into();
        assert!(matches!(err, ConsoleError::Serialization(_)));
    }
}
