/**
 * Per-connection configuration.
 *
 * Every field is read by the transport at call time, so changing a
 * `Connection`'s config between calls affects the next call. Nothing is
 * captured when the connection is created.
 *
 * Defaults:
 * - `verify_tls` = `true`
 * - `timeout` = 60 s
 * - `auth` = `None`
 * - `proxies` = `None`
 *
 * # Example
 * ```ignore
 * let config = cloudrun_core::Config::default()
 *     .with_timeout(Duration::from_secs(5))
 *     .with_proxy("https", "http://proxy.local:3128");
 * ```
 */
use std::collections::BTreeMap;
use std::time::Duration;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::protocol::constants::DEFAULT_TIMEOUT;

/// Proxy URLs keyed by the scheme of the target URL (`"http"`, `"https"`).
pub type Proxies = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/**
 * Transport-level HTTP authentication.
 *
 * Distinct from the application token carried inside the envelope.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Auth {
    Basic { username: String, password: String },
    Bearer(String),
}

impl Auth {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Auth::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value for the `Authorization` request header.
    pub fn header_value(&self) -> String {
        match self {
            Auth::Basic { username, password } => {
                let credentials = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                format!("Basic {credentials}")
            }
            Auth::Bearer(token) => format!("Bearer {token}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Verify the server's TLS certificate.
    pub verify_tls: bool,

    /// Upper bound for one whole call, connect through body read.
    pub timeout: Duration,

    /// HTTP authentication for the transport itself.
    pub auth: Option<Auth>,

    /// Proxy to use per target scheme.
    pub proxies: Option<Proxies>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verify_tls: true,
            timeout: DEFAULT_TIMEOUT,
            auth: None,
            proxies: None,
        }
    }
}

impl Config {
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Adds (or replaces) the proxy for one scheme.
    pub fn with_proxy(mut self, scheme: impl Into<String>, url: impl Into<String>) -> Self {
        self.proxies
            .get_or_insert_with(Proxies::new)
            .insert(scheme.into(), url.into());
        self
    }

    /**
     * Picks the proxy for `url` by its scheme, if any is configured.
     */
    pub fn proxy_for(&self, url: &str) -> Option<&str> {
        let scheme = url.split_once("://").map(|(scheme, _)| scheme)?;
        self.proxies
            .as_ref()?
            .get(&scheme.to_ascii_lowercase())
            .map(String::as_str)
    }
}
