//! Error types for the YesSQL client
//!
//! Provides a unified error type for all operations.
//!
//! Server-signaled errors (an `ERR` response) are NOT represented here: they
//! decode into [`Status::Error`](crate::protocol::Status::Error) and reach the
//! caller as an ordinary value.

use thiserror::Error;

use crate::protocol::Field;

/// Result type alias using ClientError
pub type Result<T> = std::result::Result<T, ClientError>;

/// Unified error type for client operations
#[derive(Debug, Error)]
pub enum ClientError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed mid-frame: received {received} of {expected} bytes")]
    ConnectionClosed { received: u64, expected: u64 },

    #[error("Invalid frame length prefix: {0} (must be at least 8)")]
    InvalidFrameLength(u64),

    #[error("Frame too large: {len} bytes (max {max})")]
    FrameTooLarge { len: u64, max: u64 },

    #[error("Connection unusable after an earlier transport error")]
    ConnectionBroken,

    // -------------------------------------------------------------------------
    // Encoding Errors
    // -------------------------------------------------------------------------
    #[error("{field} too long: {len} bytes (max {max})")]
    FieldTooLong { field: Field, len: usize, max: u64 },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// True for failures of the underlying connection.
    ///
    /// The current operation is lost and the connection should be dropped.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Io(_)
                | ClientError::ConnectionClosed { .. }
                | ClientError::InvalidFrameLength(_)
                | ClientError::FrameTooLarge { .. }
                | ClientError::ConnectionBroken
        )
    }
}
