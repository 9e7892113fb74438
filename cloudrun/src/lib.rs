/*!
 * CloudRun: client for remote module calls over HTTP(S).
 *
 * This is the crate users should depend on. It re-exports the core API
 * and adds a single `connect` entry point.
 *
 * # Quick start
 *
 * ```ignore
 * fn main() -> cloudrun::Result<()> {
 *     let conn = cloudrun::connect(("https://cloud.example.org", 8443, "MY_TOKEN"));
 *
 *     let response = conn.send_request("echo", &serde_json::json!({"text": "hi"}))?;
 *     println!("{}", response.body());
 *     Ok(())
 * }
 * ```
 *
 * # Prepared requests
 *
 * ```ignore
 * let mut request = cloudrun::Request::new("thumbnail");
 * request.set_data("width", 128);
 * request.set_data_from_path("image", "photo.jpg")?;
 *
 * let response = conn.send_prepared_request(&request)?;
 * ```
 */

// ---------------------------------------------------------------------------
// Re-exports from cloudrun_core: the public surface area
// ---------------------------------------------------------------------------

pub use cloudrun_core::{
    Auth, Config, ConnectivityError, Connection, Endpoint, Envelope, Error, Headers,
    HttpTransport, Proxies, ProtocolError, RawResponse, Request, Response, Result, Transport,
    UsageError, DEFAULT_TIMEOUT, REQUEST_HANDLER, USER_AGENT,
};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/**
 * Everything needed to open a `Connection`.
 *
 * Implements `From<(&str, u16)>` and `From<(&str, u16, &str)>` so that
 * `connect` accepts a bare address, optionally with a token:
 * - `token` = `""`
 * - `config` = `Config::default()`
 */
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Server URL WITH scheme (`http://` or `https://`).
    pub url: String,

    pub port: u16,

    /// Application token sent in every envelope.
    pub token: String,

    /// Transport settings; can still be changed on the connection later.
    pub config: Config,
}

impl From<(&str, u16)> for Options {
    fn from((url, port): (&str, u16)) -> Self {
        Self {
            url: url.to_string(),
            port,
            ..Default::default()
        }
    }
}

impl From<(&str, u16, &str)> for Options {
    fn from((url, port, token): (&str, u16, &str)) -> Self {
        Self {
            url: url.to_string(),
            port,
            token: token.to_string(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// connect
// ---------------------------------------------------------------------------

/**
 * Creates a `Connection` using the default HTTP transport.
 *
 * No network activity happens here; every `send*` call is its own
 * round trip.
 *
 * ```ignore
 * let conn = cloudrun::connect(("http://localhost", 8080));
 *
 * let conn = cloudrun::connect(cloudrun::Options {
 *     url: "https://cloud.example.org".into(),
 *     port: 443,
 *     token: "TOKEN".into(),
 *     config: cloudrun::Config::default().with_verify_tls(false),
 * });
 * ```
 */
pub fn connect(options: impl Into<Options>) -> Connection {
    let opts = options.into();

    let mut conn = Connection::new(opts.url, opts.port, opts.token);
    conn.config = opts.config;
    conn
}
