/**
 * Transport layer: how one envelope reaches the server.
 *
 * The dispatcher only knows the `Transport` trait: POST a JSON document
 * to a URL under the current `Config`, get back status, headers and body.
 * - `http`: the ureq-based blocking implementation used by default
 *
 * Anything that fails below the protocol layer (DNS, connect, TLS,
 * timeout) is reported as a `ConnectivityError` and passed through the
 * dispatcher unchanged.
 */
use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::Config;
use crate::error::ConnectivityError;

pub mod http;

pub use http::HttpTransport;

/// Response headers: lowercase name → value. Repeated headers are joined with `", "`.
pub type Headers = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// RawResponse
// ---------------------------------------------------------------------------

/**
 * What the transport got back, before any protocol interpretation.
 *
 * The body is kept as raw bytes: whether it is valid UTF-8 or JSON is
 * for the decoder to judge.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, headers: Headers, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/**
 * Performs one blocking POST of a JSON body.
 *
 * Implementations must read `config` on every call and must not retry.
 * Non-2xx statuses are returned as a normal `RawResponse`; the
 * dispatcher decides what they mean.
 */
pub trait Transport {
    fn post_json(
        &self,
        url: &str,
        body: &Value,
        config: &Config,
    ) -> Result<RawResponse, ConnectivityError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post_json(
        &self,
        url: &str,
        body: &Value,
        config: &Config,
    ) -> Result<RawResponse, ConnectivityError> {
        (**self).post_json(url, body, config)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn post_json(
        &self,
        url: &str,
        body: &Value,
        config: &Config,
    ) -> Result<RawResponse, ConnectivityError> {
        (**self).post_json(url, body, config)
    }
}
