/**
 * Server address and handler path resolution.
 *
 * The server is addressed as `{base_url}:{port}` where `base_url`
 * includes the scheme (`http://` or `https://`). Each call targets one
 * handler segment: `{base_url}:{port}/{handler}/`.
 */
use crate::error::UsageError;

/// Where the CloudRun server lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: String,
    port: u16,
}

impl Endpoint {
    /**
     * Creates an endpoint from a base URL (WITH scheme) and a port.
     *
     * A trailing `/` on the base URL is dropped so that the port can be
     * appended directly.
     */
    pub fn new(base_url: impl Into<String>, port: u16) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, port }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /**
     * Resolves the full URL of a handler.
     *
     * Returns `UsageError::InvalidHandler` if `handler` is empty or
     * contains a `/`: it must be exactly one path segment.
     */
    pub fn url_for(&self, handler: &str) -> Result<String, UsageError> {
        validate_handler(handler)?;
        Ok(format!("{}:{}/{}/", self.base_url, self.port, handler))
    }
}

fn validate_handler(handler: &str) -> Result<(), UsageError> {
    if handler.is_empty() || handler.contains('/') {
        return Err(UsageError::InvalidHandler(handler.to_string()));
    }
    Ok(())
}
