/**
 * The outbound envelope: the JSON object actually POSTed for one call.
 *
 * Two shapes:
 * ```json
 * { "token": "<opaque>", "module": "<name>", "data": { ... } }   // module call
 * { "token": "<opaque>", "data": { ... } }                       // custom handler
 * ```
 *
 * The token is forwarded verbatim; the client never inspects it.
 */
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::UsageError;

#[derive(Debug, Clone, Serialize)]
pub struct Envelope<'a> {
    /// Opaque application-level credential.
    pub token: &'a str,

    /// Target module. Absent for custom-handler calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<&'a str>,

    /// Named data fields for the module or handler.
    pub data: &'a Map<String, Value>,
}

impl<'a> Envelope<'a> {
    /// Envelope for a standard module call.
    pub fn module_call(token: &'a str, module: &'a str, data: &'a Map<String, Value>) -> Self {
        Self {
            token,
            module: Some(module),
            data,
        }
    }

    /// Envelope for a call to a custom handler (no `module` key).
    pub fn custom_call(token: &'a str, data: &'a Map<String, Value>) -> Self {
        Self {
            token,
            module: None,
            data,
        }
    }
}

/**
 * Converts caller-supplied data into the `data` mapping of an envelope.
 *
 * Anything `Serialize` is accepted as long as it serializes to a JSON
 * object; everything else is a `UsageError`.
 */
pub fn data_to_map<D: Serialize + ?Sized>(data: &D) -> Result<Map<String, Value>, UsageError> {
    match serde_json::to_value(data) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(UsageError::DataNotObject),
        Err(e) => Err(UsageError::Serialize(e.to_string())),
    }
}
