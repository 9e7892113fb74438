/**
 * Inbound body classification.
 *
 * A response body is one of:
 * - not JSON at all (including non-UTF-8 bytes) → `Error::MalformedResponse`
 * - a document with an `error` member shaped `{code, message}` →
 *   `Error::Protocol`. This check wins over any sibling keys.
 * - a document with an `error` member of any other shape →
 *   `Error::MalformedResponse`
 * - anything else → success, the whole document is the body
 */
use serde_json::Value;

use crate::error::{Error, ProtocolError};
use crate::protocol::constants::ERROR_MARKER;

/**
 * Parses `body` and classifies it.
 *
 * # Returns
 * * `Ok(Value)`: the decoded success document.
 * * `Err(Error::MalformedResponse)`: invalid JSON or a malformed error marker.
 * * `Err(Error::Protocol)`: the server signalled an application error.
 */
pub fn decode_body(body: &[u8]) -> Result<Value, Error> {
    let doc: Value = serde_json::from_slice(body).map_err(|e| Error::MalformedResponse {
        reason: format!("body is not valid JSON: {e}"),
    })?;

    match doc.get(ERROR_MARKER) {
        None => Ok(doc),
        Some(marker) => Err(classify_error_marker(marker)),
    }
}

fn classify_error_marker(marker: &Value) -> Error {
    let (Some(code), Some(message)) = (marker.get("code"), marker.get("message")) else {
        return Error::MalformedResponse {
            reason: format!("error marker without code and message: {marker}"),
        };
    };

    let message = match message {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    ProtocolError::new(code.clone(), message).into()
}
