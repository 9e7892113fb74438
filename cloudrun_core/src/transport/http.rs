/*!
 * HTTP transport for CloudRun calls.
 *
 * Uses `ureq`: a pure-Rust blocking HTTP client with no async runtime.
 *
 * A fresh `ureq::Agent` is built for every call from the `Config` passed
 * in, so timeout, TLS verification, proxy and auth changes made between
 * calls are always honored. No connection is kept between calls.
 *
 * Single attempt only: no retries, no backoff.
 */

use serde_json::Value;
use ureq::Agent;

use super::{Headers, RawResponse, Transport};
use crate::config::Config;
use crate::error::ConnectivityError;
use crate::protocol::constants::USER_AGENT;

/// The default `Transport`, backed by `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl HttpTransport {
    pub fn new() -> Self {
        Self
    }

    /**
     * Builds an agent for one call to `url`.
     *
     * - `timeout` → global timeout for the whole call
     * - `verify_tls = false` → certificate verification disabled
     * - proxy picked by the scheme of `url`
     *
     * HTTP status errors are turned off: the status is reported back in
     * the `RawResponse` instead.
     */
    fn agent_for(&self, url: &str, config: &Config) -> Result<Agent, ConnectivityError> {
        let mut builder = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false);

        if !config.verify_tls {
            builder = builder.tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(true)
                    .build(),
            );
        }

        /* Only configured proxies apply; environment proxy variables are ignored. */
        let proxy = match config.proxy_for(url) {
            Some(proxy_url) => Some(ureq::Proxy::new(proxy_url).map_err(|_| {
                ConnectivityError::InvalidProxy {
                    url: proxy_url.to_string(),
                }
            })?),
            None => None,
        };
        builder = builder.proxy(proxy);

        Ok(builder.build().into())
    }
}

impl Transport for HttpTransport {
    fn post_json(
        &self,
        url: &str,
        body: &Value,
        config: &Config,
    ) -> Result<RawResponse, ConnectivityError> {
        let agent = self.agent_for(url, config)?;

        let mut request = agent.post(url).header("User-Agent", USER_AGENT);
        if let Some(auth) = &config.auth {
            request = request.header("Authorization", auth.header_value());
        }

        let mut response = request.send_json(body).map_err(map_error)?;

        let status = response.status().as_u16();

        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes());
            match headers.get_mut(name.as_str()) {
                Some(existing) => {
                    existing.push_str(", ");
                    existing.push_str(&value);
                }
                None => {
                    headers.insert(name.as_str().to_string(), value.into_owned());
                }
            }
        }

        /*
         * Raw bytes, with ureq's default 10 MiB cap lifted. UTF-8 and
         * JSON validity are the decoder's concern.
         */
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(map_error)?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_error(err: ureq::Error) -> ConnectivityError {
    match err {
        ureq::Error::Timeout(_) => ConnectivityError::Timeout,
        ureq::Error::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => {
            ConnectivityError::Timeout
        }
        ureq::Error::StatusCode(status) => ConnectivityError::HttpStatus {
            status,
            body: String::new(),
        },
        other => ConnectivityError::Transport(other.to_string()),
    }
}
