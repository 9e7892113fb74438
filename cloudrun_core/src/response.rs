/**
 * The result of one successful call.
 *
 * Built by the dispatcher only after the status was 2xx and the body
 * decoded without an error marker. Read-only: every accessor works on
 * the snapshot taken at construction, no further I/O happens.
 */
use serde_json::Value;

use crate::transport::RawResponse;

pub use crate::transport::Headers;

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    raw: RawResponse,
    body: Value,
    status_code: u16,
    headers: Headers,
}

impl Response {
    pub(crate) fn new(raw: RawResponse, body: Value) -> Self {
        Self {
            status_code: raw.status,
            headers: raw.headers.clone(),
            raw,
            body,
        }
    }

    /// The decoded JSON document.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Top-level field of the decoded document, if it is an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Looks a header up by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The transport result this response was built from.
    pub fn raw(&self) -> &RawResponse {
        &self.raw
    }

    pub fn into_body(self) -> Value {
        self.body
    }
}
