use thiserror::Error;

use crate::RequestId;

/// Errors produced while encoding or decoding wire messages.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The outer envelope could not be parsed.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// The envelope parsed but its payload did not.
    #[error("invalid payload for request {request_id}: {message}")]
    InvalidPayload {
        /// Id carried by the envelope.
        request_id: RequestId,
        /// Parser message.
        message: String,
    },

    /// Serialization failed.
    #[error("failed to serialize: {0}")]
    Serialize(String),
}

impl CodecError {
    /// Request id the failed message belonged to, when it could be read.
    #[must_use]
    pub const fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::InvalidPayload { request_id, .. } => Some(*request_id),
            Self::InvalidEnvelope(_) | Self::Serialize(_) => None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}
