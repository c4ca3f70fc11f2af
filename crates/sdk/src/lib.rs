//! Typed clients for the keyhub hub and its key-value instances.
//!
//! The hub listens on `ws://host:port/ctl` and starts or stops instances; each
//! instance serves a key-value store on `ws://host:port/ws<suffix>`. Both
//! clients sit on a reconnecting [`RpcClient`](keyhub_client::RpcClient) and
//! only choose action names and interpret results.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod config;
mod error;
mod hub;
mod instance;
mod result;

pub use config::{Config, DEFAULT_HOST, DEFAULT_PORT};
pub use error::{Error, Result};
pub use hub::HubClient;
pub use instance::InstanceClient;

pub use keyhub_client::{ConnectionState, ConnectionStatus, Epoch, RpcClient};
