use thiserror::Error;

/// Errors reported by transports.
///
/// Transport errors are informational: every fatal error is followed by a
/// close event, which is what ends the connection.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The target URL is not usable by this transport.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Establishing the connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Reading or writing failed on an established connection.
    #[error("I/O error: {0}")]
    Io(String),

    /// A frame arrived that the transport cannot hand to the handler.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The connection is closed.
    #[error("connection closed")]
    ConnectionClosed,
}
