use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of a request within one connection epoch.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Outbound payload: an action and up to two options.
///
/// Options are opaque strings. Anything `ToString` is accepted by the
/// builders, so numbers and other primitives travel in their string form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Action name, e.g. `GET`.
    #[serde(alias = "Action")]
    pub action: String,
    /// First option; empty when unused.
    #[serde(default, alias = "Option1")]
    pub option_1: String,
    /// Second option; empty when unused.
    #[serde(default, alias = "Option2")]
    pub option_2: String,
}

impl Request {
    /// Creates a request with both options empty.
    pub fn new(action: impl ToString) -> Self {
        Self {
            action: action.to_string(),
            option_1: String::new(),
            option_2: String::new(),
        }
    }

    /// Sets the first option.
    #[must_use]
    pub fn with_option_1(mut self, option: impl ToString) -> Self {
        self.option_1 = option.to_string();
        self
    }

    /// Sets the second option.
    #[must_use]
    pub fn with_option_2(mut self, option: impl ToString) -> Self {
        self.option_2 = option.to_string();
        self
    }
}

/// A decoded reply.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    /// Id of the request this reply settles.
    pub request_id: RequestId,
    /// Whether the server handled the request.
    pub success: bool,
    /// Result value; `null` when the server sent none.
    pub result: Value,
    /// Server error text; empty on success.
    pub error: String,
}

impl Response {
    /// A successful reply.
    #[must_use]
    pub fn success(request_id: RequestId, result: impl Into<Value>) -> Self {
        Self {
            request_id,
            success: true,
            result: result.into(),
            error: String::new(),
        }
    }

    /// A failed reply.
    #[must_use]
    pub fn failure(request_id: RequestId, error: impl Into<String>) -> Self {
        Self {
            request_id,
            success: false,
            result: Value::Null,
            error: error.into(),
        }
    }

    /// Splits the reply into its result or its error text.
    ///
    /// # Errors
    ///
    /// Returns the server error text when `success` is false.
    pub fn into_result(self) -> Result<Value, String> {
        if self.success {
            Ok(self.result)
        } else {
            Err(self.error)
        }
    }
}
