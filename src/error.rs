//! Error types for chatwire.
//!
//! [`ServiceError`] is the only error that crosses the RPC boundary.
//! [`TransportError`] stays inside transports and the RPC layer; it is
//! logged and collapsed into `ServiceError::Unknown` before reaching the
//! caller.

use std::time::Duration;

use thiserror::Error;

use crate::schema::ResponseStatus;

/// Outcome of a failed RPC exchange as seen by the caller.
///
/// Carries no retry state. Callers decide on retries from the status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The server decoded the request and rejected it.
    #[error("Server error {0}: {1}")]
    ServerError(ResponseStatus, String),

    /// Any other failure: transport, timeout, undecodable or missing response.
    #[error("Unknown RPC failure")]
    Unknown,
}

impl ServiceError {
    /// Server-reported status, if the server produced one.
    pub fn status(&self) -> Option<ResponseStatus> {
        match self {
            ServiceError::ServerError(status, _) => Some(*status),
            ServiceError::Unknown => None,
        }
    }
}

/// Transport-level failure.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to connect to the server socket.
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] std::io::Error),

    /// Exchange timed out waiting for a response.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Framing or connection-state error.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// I/O error while connecting or exchanging frames.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused => {
                TransportError::ConnectionFailed(err)
            }
            _ => TransportError::Io(err),
        }
    }
}
