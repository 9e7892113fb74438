/**
 * Failure taxonomy shared by every `send*` entry point.
 *
 * Four kinds, never collapsed into one:
 * - `Connectivity`: the server could not be reached, or answered with a
 *   non-2xx status. Worth retrying later.
 * - `MalformedResponse`: the exchange succeeded but the body is not a
 *   usable JSON document.
 * - `Protocol`: the server explicitly rejected the call. Fix the payload.
 * - `Usage`: the caller misused the API. Raised before any network I/O.
 */
use std::fmt;

use serde_json::Value;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Any failure produced by a dispatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),

    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl Error {
    /**
     * Returns `true` for failures that may succeed if the same call is
     * issued again later. Only connectivity failures qualify; the core
     * itself never retries.
     */
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Connectivity(_))
    }

    /// Returns the server-side error if this is a `Protocol` failure.
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            Error::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectivityError
// ---------------------------------------------------------------------------

/// The transport could not complete the exchange.
#[derive(Debug, thiserror::Error)]
pub enum ConnectivityError {
    #[error("Request timed out")]
    Timeout,

    #[error("Server responded with HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid proxy URL '{url}'")]
    InvalidProxy { url: String },

    #[error("Transport failure: {0}")]
    Transport(String),
}

// ---------------------------------------------------------------------------
// ProtocolError
// ---------------------------------------------------------------------------

/**
 * An application-level error reported by the server through the
 * `{"error": {"code": ..., "message": ...}}` document shape.
 *
 * Keeps `code` and `message` as structured fields; `Display` renders
 * them as `Error <code>: <message>`.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolError {
    code: Value,
    message: String,
}

impl ProtocolError {
    pub fn new(code: Value, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The server-provided code, verbatim (typically a number).
    pub fn code(&self) -> &Value {
        &self.code
    }

    /// The server-provided message, verbatim.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        /* String codes print bare, without JSON quotes. */
        match &self.code {
            Value::String(code) => write!(f, "Error {code}: {}", self.message),
            code => write!(f, "Error {code}: {}", self.message),
        }
    }
}

impl std::error::Error for ProtocolError {}

// ---------------------------------------------------------------------------
// UsageError
// ---------------------------------------------------------------------------

/// The caller passed something the API cannot accept.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("Module name must not be empty")]
    EmptyModule,

    #[error("Invalid handler '{0}': must be a single, non-empty path segment")]
    InvalidHandler(String),

    #[error("Request data must serialize to a JSON object")]
    DataNotObject,

    #[error("Failed to serialize request data: {0}")]
    Serialize(String),

    #[error("Value is not a prepared request: {0}")]
    NotARequest(String),

    #[error("No data field named '{0}'")]
    UnknownField(String),
}
