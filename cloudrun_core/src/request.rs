/**
 * Prepared requests.
 *
 * A `Request` accumulates the target module and its named data fields
 * so a call can be assembled step by step and sent (possibly several
 * times) with `Connection::send_prepared_request`.
 *
 * Every `Request` owns its own data map; two requests never share one.
 */
use std::fs::File;
use std::io::Read;
use std::path::Path;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::UsageError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    module: String,
    #[serde(default)]
    data: Map<String, Value>,
}

impl Request {
    /// Creates a request for `module` with no data fields.
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            data: Map::new(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Sets field `name` to `value`, replacing any previous value.
    pub fn set_data(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(name.into(), value.into());
    }

    /**
     * Reads `reader` to the end and stores its content under `name` as a
     * standard base64 string.
     *
     * The reader is taken by value and dropped before this returns, on
     * success and on error alike. Passing a `File` closes it.
     *
     * The reader must yield the raw bytes to embed. Any transformation it
     * applies (e.g. text decoding) ends up in the payload as-is.
     *
     * On error the data map is left unchanged.
     */
    pub fn set_data_from_file<R: Read>(
        &mut self,
        name: impl Into<String>,
        mut reader: R,
    ) -> std::io::Result<()> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        drop(reader);

        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        self.data.insert(name.into(), Value::String(encoded));
        Ok(())
    }

    /// Opens `path` for binary reading and embeds it like `set_data_from_file`.
    pub fn set_data_from_path(
        &mut self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> std::io::Result<()> {
        let file = File::open(path)?;
        self.set_data_from_file(name, file)
    }

    /**
     * Removes field `name` and returns its value.
     *
     * Removing a field that does not exist is an error
     * (`UsageError::UnknownField`), not a no-op.
     */
    pub fn remove_data(&mut self, name: &str) -> Result<Value, UsageError> {
        self.data
            .remove(name)
            .ok_or_else(|| UsageError::UnknownField(name.to_string()))
    }

    /// Removes every data field. The module is kept.
    pub fn clear_data(&mut self) {
        self.data.clear();
    }
}

/**
 * Accepts a request-shaped document:
 * ```json
 * { "module": "<non-empty name>", "data": { ... } }
 * ```
 * `data` may be omitted. Anything else is `UsageError::NotARequest`.
 */
impl TryFrom<Value> for Request {
    type Error = UsageError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let request: Request =
            serde_json::from_value(value).map_err(|e| UsageError::NotARequest(e.to_string()))?;

        if request.module.is_empty() {
            return Err(UsageError::NotARequest("module name is empty".into()));
        }

        Ok(request)
    }
}
