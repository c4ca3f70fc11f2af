use keyhub_wire::Action;
use thiserror::Error;

/// Result type for SDK calls.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors from hub and instance clients.
#[derive(Debug, Error)]
pub enum Error {
    /// The request failed or the server rejected it.
    #[error(transparent)]
    Client(#[from] keyhub_client::Error),

    /// Host, port or suffix do not form a valid address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The server answered with a result of the wrong shape.
    #[error("{action} returned an unexpected result: {message}")]
    UnexpectedResult {
        /// Action whose result could not be interpreted.
        action: Action,
        /// What was wrong with it.
        message: String,
    },
}
