//! Wire format for the keyhub request/response protocol.
//!
//! Every message is a JSON envelope carrying a request id and a payload. The
//! payload is itself JSON, serialized into a string inside the envelope:
//!
//! ```text
//! {"request_id": 1, "payload": "{\"action\":\"GET\",\"option_1\":\"k\",\"option_2\":\"\"}"}
//! {"request_id": 1, "payload": "{\"success\":true,\"result\":\"v\",\"error\":\"\"}"}
//! ```
//!
//! Decoding is permissive: the capitalized field names used by older servers
//! are accepted, a payload may arrive as an object instead of a string, and a
//! single frame may hold several newline-separated envelopes.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod action;
mod codec;
mod error;
mod message;

pub use action::Action;
pub use codec::{decode, decode_frame, decode_request, encode, encode_response};
pub use error::CodecError;
pub use message::{Request, RequestId, Response};

/// Re-exported so callers can name result payloads without a direct dependency.
pub use serde_json::Value;
