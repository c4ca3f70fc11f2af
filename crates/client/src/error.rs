//! Errors surfaced to callers of the client.

use std::fmt;

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a request did not produce a result.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The server handled the request and reported a failure.
    #[error("server error: {0}")]
    Application(String),

    /// The connection ended while the request was pending.
    #[error("connection {} (code: {code}, reason: {reason})", CloseStatus::from(.was_clean))]
    ConnectionLost {
        /// Close code.
        code: u16,
        /// Close reason.
        reason: String,
        /// Whether a close handshake took place.
        was_clean: bool,
    },

    /// The reply for this request could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The request could not be encoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// The connection manager is no longer running.
    #[error("client stopped")]
    Stopped,
}

/// "closed" after a close handshake, "aborted" otherwise.
struct CloseStatus(bool);

impl From<&bool> for CloseStatus {
    fn from(was_clean: &bool) -> Self {
        Self(*was_clean)
    }
}

impl fmt::Display for CloseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "closed" } else { "aborted" })
    }
}
