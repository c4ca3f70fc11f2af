//! Transport abstraction for keyhub clients.
//!
//! A transport turns a URL into a message-oriented, bidirectional connection.
//! Connecting never blocks: the transport starts work in the background and
//! reports progress through the four callbacks of a [`TransportHandler`]
//! bound to that one connection:
//!
//! - `on_open` once the connection is ready to send
//! - `on_message` for every inbound text frame
//! - `on_error` for failures (informational)
//! - `on_close` exactly once when the connection ends, including when it never
//!   opened
//!
//! Concrete transports live in separate crates.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::TransportError;

use std::fmt::Debug;
use std::sync::Arc;

use url::Url;

/// Close code for a normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code used when a close frame carried no status.
pub const NO_STATUS_RECEIVED: u16 = 1005;

/// Close code used when the connection dropped without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Describes how a connection ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloseEvent {
    /// Close code.
    pub code: u16,
    /// Close reason; may be empty.
    pub reason: String,
    /// Whether a close handshake took place.
    pub was_clean: bool,
}

impl CloseEvent {
    /// A clean close with the given code and reason.
    pub fn clean(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            was_clean: true,
        }
    }

    /// An unclean close (code 1006).
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self {
            code: ABNORMAL_CLOSURE,
            reason: reason.into(),
            was_clean: false,
        }
    }
}

/// Callbacks a transport invokes for one connection.
pub trait TransportHandler: Send + Sync + 'static {
    /// The connection is ready to send.
    fn on_open(&self);

    /// The connection ended.
    fn on_close(&self, event: CloseEvent);

    /// A text frame arrived.
    fn on_message(&self, text: String);

    /// Something went wrong; a close follows if the error was fatal.
    fn on_error(&self, error: TransportError);
}

/// The sending half of a connection, owned by whoever called `connect`.
pub trait Connection: Debug + Send + 'static {
    /// Queues a text frame for sending.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::ConnectionClosed` if the connection is gone.
    fn send(&self, text: String) -> Result<(), TransportError>;

    /// Closes the connection and detaches its handler.
    ///
    /// The handler may still observe callbacks that were already in flight.
    fn close(&self);
}

/// Factory for connections.
pub trait Transport: Debug + Send + Sync + 'static {
    /// Starts connecting to `url`, reporting through `handler`.
    ///
    /// Must be called from within a tokio runtime if the transport spawns
    /// background work.
    fn connect(&self, url: &Url, handler: Arc<dyn TransportHandler>) -> Box<dyn Connection>;
}
