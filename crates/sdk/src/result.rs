//! Interpretation of `result` values.
//!
//! Servers send structured results as JSON text inside a string. Native JSON
//! values are accepted too.

use keyhub_wire::{Action, Value};
use serde::de::DeserializeOwned;

use crate::Error;

/// Decodes a structured result; `null` yields the empty default.
pub fn structured<T>(action: Action, value: Value) -> Result<T, Error>
where
    T: DeserializeOwned + Default,
{
    let value = match value {
        Value::String(text) => {
            serde_json::from_str(&text).map_err(|e| unexpected(action, e.to_string()))?
        }
        other => other,
    };

    if value.is_null() {
        return Ok(T::default());
    }

    serde_json::from_value(value).map_err(|e| unexpected(action, e.to_string()))
}

/// Extracts a plain string result.
pub fn text(action: Action, value: Value) -> Result<String, Error> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(unexpected(action, format!("expected a string, got {other}"))),
    }
}

fn unexpected(action: Action, message: String) -> Error {
    Error::UnexpectedResult { action, message }
}
