/**
 * Protocol-wide constants.
 */
use std::time::Duration;

/// Handler segment that serves standard module calls.
pub const REQUEST_HANDLER: &str = "request";

/// Per-call timeout used when the caller does not configure one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// `User-Agent` header sent with every call.
/// Derived at compile time from the `cloudrun_core` package version in `Cargo.toml`.
pub const USER_AGENT: &str = concat!("cloudrun-rust/", env!("CARGO_PKG_VERSION"));

/// Top-level key whose presence marks a server-side error document.
pub(crate) const ERROR_MARKER: &str = "error";
