//! Request/response client over a reconnecting message transport.
//!
//! [`RpcClient`] sends named actions with up to two string options and
//! returns a future per request that settles when the server replies with the
//! same request id. Behind the handle a single task owns the connection:
//!
//! - requests made before the connection opens are queued and flushed in
//!   submission order on open
//! - replies are matched to callers by id, in whatever order they arrive
//! - when the connection closes every pending request is rejected and a new
//!   connection (a new *epoch*, with ids starting again at 1) is made after a
//!   fixed delay, forever
//!
//! # Example
//!
//! ```no_run
//! use keyhub_client::{ClientConfig, RpcClient};
//! use keyhub_transport_ws::WebSocketTransport;
//! use url::Url;
//!
//! async fn example() -> keyhub_client::Result<()> {
//!     let url = Url::parse("ws://localhost:8372/ws1").unwrap();
//!     let client = RpcClient::connect(ClientConfig::new(url), WebSocketTransport::new());
//!
//!     client.send_request("SET", "k1", "v1").await?;
//!     let value = client.send_request("GET", "k1", "").await?;
//!     println!("{value}");
//!     Ok(())
//! }
//! ```
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod client;
mod config;
pub mod correlator;
mod error;
mod manager;
pub mod queue;

pub use client::RpcClient;
pub use config::{ClientConfig, DEFAULT_RECONNECT_DELAY};
pub use correlator::RequestCorrelator;
pub use error::{Error, Result};
pub use manager::{ConnectionState, ConnectionStatus, Epoch};
pub use queue::{PendingQueue, QueuedSend};

pub use keyhub_wire::{Action, Request, RequestId, Value};
