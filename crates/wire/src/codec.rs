use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CodecError, Request, RequestId, Response};

#[derive(Serialize)]
struct OutboundEnvelope {
    request_id: RequestId,
    payload: String,
}

#[derive(Deserialize)]
struct InboundEnvelope {
    #[serde(alias = "RequestId")]
    request_id: RequestId,
    #[serde(default, alias = "Payload")]
    payload: Value,
}

#[derive(Deserialize, Serialize)]
struct ResponsePayload {
    #[serde(default, alias = "Success")]
    success: bool,
    #[serde(default, alias = "Result")]
    result: Value,
    #[serde(default, alias = "Error")]
    error: Option<String>,
}

/// Encodes `request` under `request_id` into a wire string.
///
/// # Errors
///
/// Returns `CodecError::Serialize` if serialization fails, which does not
/// happen for string fields.
pub fn encode(request: &Request, request_id: RequestId) -> Result<String, CodecError> {
    let envelope = OutboundEnvelope {
        request_id,
        payload: serde_json::to_string(request)?,
    };

    Ok(serde_json::to_string(&envelope)?)
}

/// Encodes a reply the way a server would.
///
/// # Errors
///
/// Returns `CodecError::Serialize` if the result value fails to serialize.
pub fn encode_response(response: &Response) -> Result<String, CodecError> {
    let payload = ResponsePayload {
        success: response.success,
        result: response.result.clone(),
        error: Some(response.error.clone()),
    };
    let envelope = OutboundEnvelope {
        request_id: response.request_id,
        payload: serde_json::to_string(&payload)?,
    };

    Ok(serde_json::to_string(&envelope)?)
}

/// Decodes a single reply envelope.
///
/// # Errors
///
/// Returns `CodecError::InvalidEnvelope` when the outer object is malformed
/// and `CodecError::InvalidPayload` when only the payload is.
pub fn decode(text: &str) -> Result<Response, CodecError> {
    let envelope: InboundEnvelope = serde_json::from_str(text.trim())
        .map_err(|e| CodecError::InvalidEnvelope(e.to_string()))?;

    decode_envelope(envelope)
}

/// Decodes every envelope in a frame.
///
/// Servers may coalesce queued replies into one frame, usually separated by
/// newlines, and a single reply may itself span several lines. The frame is
/// read as a stream of JSON values; after a syntax error the rest of the frame
/// is decoded line by line so one bad line does not hide the others.
pub fn decode_frame(frame: &str) -> Vec<Result<Response, CodecError>> {
    let mut decoded = Vec::new();
    let mut values = serde_json::Deserializer::from_str(frame).into_iter::<Value>();

    while let Some(value) = values.next() {
        match value {
            Ok(value) => decoded.push(
                serde_json::from_value(value)
                    .map_err(|e| CodecError::InvalidEnvelope(e.to_string()))
                    .and_then(decode_envelope),
            ),
            Err(_) => {
                let rest = frame.get(values.byte_offset()..).unwrap_or_default();
                decoded.extend(
                    rest.lines()
                        .filter(|line| !line.trim().is_empty())
                        .map(decode),
                );
                break;
            }
        }
    }

    decoded
}

fn decode_envelope(envelope: InboundEnvelope) -> Result<Response, CodecError> {
    let request_id = envelope.request_id;

    let payload: ResponsePayload =
        parse_payload(envelope.payload).map_err(|message| CodecError::InvalidPayload {
            request_id,
            message,
        })?;

    Ok(Response {
        request_id,
        success: payload.success,
        result: payload.result,
        error: payload.error.unwrap_or_default(),
    })
}

/// Decodes a request envelope the way a server would.
///
/// # Errors
///
/// Returns `CodecError::InvalidEnvelope` or `CodecError::InvalidPayload`.
pub fn decode_request(text: &str) -> Result<(RequestId, Request), CodecError> {
    let envelope: InboundEnvelope = serde_json::from_str(text.trim())
        .map_err(|e| CodecError::InvalidEnvelope(e.to_string()))?;
    let request_id = envelope.request_id;

    let request = parse_payload(envelope.payload).map_err(|message| {
        CodecError::InvalidPayload {
            request_id,
            message,
        }
    })?;

    Ok((request_id, request))
}

// The payload is normally a JSON string holding an object; accept the object
// itself too.
fn parse_payload<T>(payload: Value) -> Result<T, String>
where
    T: for<'de> Deserialize<'de>,
{
    match payload {
        Value::String(inner) => serde_json::from_str(&inner).map_err(|e| e.to_string()),
        Value::Object(_) => serde_json::from_value(payload).map_err(|e| e.to_string()),
        other => Err(format!("expected payload string or object, got {other}")),
    }
}
