/**
 * The call dispatcher.
 *
 * A `Connection` holds the server endpoint, the application token and
 * the transport configuration. Each `send*` call:
 * 1. Builds the envelope (`{token, module, data}` or `{token, data}`).
 * 2. POSTs it to `{url}:{port}/{handler}/` via the `Transport`, using
 *    the config as it is *now*.
 * 3. Fails fast on a non-2xx status.
 * 4. Decodes the body and checks it for the error marker.
 * 5. Returns a `Response` only if all of the above succeeded.
 *
 * Exactly one round trip per call. No retries, no caching, and no
 * mutation of the connection.
 *
 * `config` is a plain public field. It is not synchronized: change it
 * only while no call is in flight.
 */
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ConnectivityError, Error, Result, UsageError};
use crate::protocol::constants::REQUEST_HANDLER;
use crate::protocol::decode::decode_body;
use crate::protocol::endpoint::Endpoint;
use crate::protocol::envelope::{data_to_map, Envelope};
use crate::request::Request;
use crate::response::Response;
use crate::transport::{HttpTransport, Transport};

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Connection<T = HttpTransport> {
    endpoint: Endpoint,

    /// Opaque application token, included in every envelope.
    token: String,

    /// Transport settings, read on every call.
    pub config: Config,

    transport: T,
}

impl Connection<HttpTransport> {
    /**
     * Creates a connection using the default ureq transport.
     *
     * # Arguments
     * * `url`: Server URL WITH scheme, e.g. `https://cloud.example.org`.
     * * `port`: Server port.
     * * `token`: Application token; may be empty.
     */
    pub fn new(url: impl Into<String>, port: u16, token: impl Into<String>) -> Self {
        Self::with_transport(url, port, token, HttpTransport::new())
    }
}

impl<T: Transport> Connection<T> {
    /// Creates a connection that delivers calls through `transport`.
    pub fn with_transport(
        url: impl Into<String>,
        port: u16,
        token: impl Into<String>,
        transport: T,
    ) -> Self {
        Self {
            endpoint: Endpoint::new(url, port),
            token: token.into(),
            config: Config::default(),
            transport,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn url(&self) -> &str {
        self.endpoint.base_url()
    }

    pub fn port(&self) -> u16 {
        self.endpoint.port()
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /**
     * Calls `module` through the standard `request` handler.
     *
     * `data` may be anything that serializes to a JSON object (a map, a
     * struct, a `serde_json::Map`...).
     *
     * # Errors
     * * `Usage`: empty module name, or data that is not an object.
     *   Nothing is sent.
     * * `Connectivity`: the server could not be reached or answered non-2xx.
     * * `MalformedResponse`: the body is not valid JSON.
     * * `Protocol`: the server answered with an error marker.
     */
    pub fn send_request<D: Serialize + ?Sized>(&self, module: &str, data: &D) -> Result<Response> {
        let data = data_to_map(data)?;
        self.call_module(module, &data)
    }

    /// Sends a prepared `Request`. Same effect as `send_request(module, data)`.
    pub fn send_prepared_request(&self, request: &Request) -> Result<Response> {
        self.call_module(request.module(), request.data())
    }

    /**
     * Sends a request given as a JSON document `{"module": ..., "data": {...}}`.
     *
     * Anything not shaped like a request fails with
     * `UsageError::NotARequest` before the transport is touched.
     */
    pub fn send_prepared_value(&self, request: &Value) -> Result<Response> {
        let request = Request::try_from(request.clone())?;
        self.send_prepared_request(&request)
    }

    /**
     * Calls a custom `handler` with `{token, data}` (no `module` key).
     *
     * `handler` must be a single, non-empty path segment.
     */
    pub fn send_custom_request<D: Serialize + ?Sized>(
        &self,
        handler: &str,
        data: &D,
    ) -> Result<Response> {
        let data = data_to_map(data)?;
        self.dispatch(handler, &Envelope::custom_call(&self.token, &data))
    }

    /// Calls a custom `handler` with an empty `data` object.
    pub fn send_custom_request_empty(&self, handler: &str) -> Result<Response> {
        self.send_custom_request(handler, &Map::new())
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    fn call_module(&self, module: &str, data: &Map<String, Value>) -> Result<Response> {
        if module.is_empty() {
            return Err(UsageError::EmptyModule.into());
        }
        self.dispatch(REQUEST_HANDLER, &Envelope::module_call(&self.token, module, data))
    }

    fn dispatch(&self, handler: &str, envelope: &Envelope<'_>) -> Result<Response> {
        /*
         * Step 1: Resolve the handler URL. An invalid handler is a usage
         * error and must fail before any I/O.
         */
        let url = self.endpoint.url_for(handler)?;
        let body = serde_json::to_value(envelope)
            .map_err(|e| UsageError::Serialize(e.to_string()))?;

        debug!(
            handler,
            url = %url,
            module = envelope.module.unwrap_or("-"),
            "dispatching CloudRun call"
        );

        /*
         * Step 2: One POST with the current config. Transport failures
         * propagate unchanged.
         */
        let raw = self.transport.post_json(&url, &body, &self.config)?;

        /*
         * Step 3: Non-2xx is a connectivity failure, checked before the
         * body is looked at.
         */
        if !raw.is_success() {
            warn!(status = raw.status, url = %url, "CloudRun responded with an HTTP error");
            return Err(ConnectivityError::HttpStatus {
                status: raw.status,
                body: raw.body_text(),
            }
            .into());
        }

        /*
         * Step 4: Decode and look for the error marker.
         */
        let decoded = decode_body(&raw.body).inspect_err(|err| {
            if let Error::Protocol(protocol) = err {
                warn!(
                    code = %protocol.code(),
                    message = protocol.message(),
                    "CloudRun rejected the call"
                );
            }
        })?;

        debug!(status = raw.status, "CloudRun call succeeded");

        Ok(Response::new(raw, decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::transport::{Headers, RawResponse};
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Records every call and replays queued replies in order.
    #[derive(Default)]
    struct StubTransport {
        calls: RefCell<Vec<(String, Value, Config)>>,
        replies: RefCell<VecDeque<std::result::Result<RawResponse, ConnectivityError>>>,
    }

    impl StubTransport {
        fn replying(status: u16, body: impl AsRef<[u8]>) -> Self {
            let stub = Self::default();
            stub.push(status, body);
            stub
        }

        fn push(&self, status: u16, body: impl AsRef<[u8]>) {
            self.replies
                .borrow_mut()
                .push_back(Ok(RawResponse::new(status, Headers::new(), body.as_ref())));
        }

        fn failing(err: ConnectivityError) -> Self {
            let stub = Self::default();
            stub.replies.borrow_mut().push_back(Err(err));
            stub
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        fn last_call(&self) -> (String, Value, Config) {
            self.calls.borrow().last().cloned().expect("no call recorded")
        }
    }

    impl Transport for StubTransport {
        fn post_json(
            &self,
            url: &str,
            body: &Value,
            config: &Config,
        ) -> std::result::Result<RawResponse, ConnectivityError> {
            self.calls
                .borrow_mut()
                .push((url.to_string(), body.clone(), config.clone()));
            self.replies
                .borrow_mut()
                .pop_front()
                .expect("unexpected transport call")
        }
    }

    fn connection(stub: StubTransport) -> Connection<StubTransport> {
        Connection::with_transport("https://cloud.test", 8080, "secret", stub)
    }

    #[test]
    fn test_send_request_envelope() {
        let conn = connection(StubTransport::replying(200, r#"{"result": "ok"}"#));

        conn.send_request("echo", &json!({"a": 1, "b": "two"})).unwrap();

        let (url, body, _) = conn.transport().last_call();
        assert_eq!(url, "https://cloud.test:8080/request/");
        assert_eq!(
            body,
            json!({"token": "secret", "module": "echo", "data": {"a": 1, "b": "two"}})
        );
    }

    #[test]
    fn test_success_builds_response() {
        let conn = connection(StubTransport::replying(200, r#"{"result": "ok"}"#));

        let response = conn.send_request("echo", &Map::new()).unwrap();

        assert_eq!(response.body(), &json!({"result": "ok"}));
        assert_eq!(response.status_code(), 200);
    }

    #[test]
    fn test_protocol_error() {
        let conn = connection(StubTransport::replying(
            200,
            r#"{"error": {"code": 42, "message": "bad token"}}"#,
        ));

        let err = conn.send_request("echo", &Map::new()).unwrap_err();

        let protocol = err.as_protocol().cloned().expect("protocol error");
        assert_eq!(protocol, ProtocolError::new(json!(42), "bad token"));
        assert_eq!(protocol.to_string(), "Error 42: bad token");
    }

    #[test]
    fn test_timeout_is_connectivity_error() {
        let conn = connection(StubTransport::failing(ConnectivityError::Timeout));

        let err = conn.send_request("echo", &Map::new()).unwrap_err();

        assert!(matches!(err, Error::Connectivity(ConnectivityError::Timeout)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_non_2xx_fails_before_body_inspection() {
        let conn = connection(StubTransport::replying(
            500,
            r#"{"error": {"code": 1, "message": "ignored"}}"#,
        ));

        let err = conn.send_request("echo", &Map::new()).unwrap_err();

        assert!(matches!(
            err,
            Error::Connectivity(ConnectivityError::HttpStatus { status: 500, .. })
        ));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let conn = connection(StubTransport::replying(200, "not json"));
        let err = conn.send_request("echo", &Map::new()).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[test]
    fn test_non_utf8_success_body_is_malformed_not_connectivity() {
        let conn = connection(StubTransport::replying(200, [0xff, 0xfe, b'{']));

        let err = conn.send_request("echo", &Map::new()).unwrap_err();

        assert!(matches!(err, Error::MalformedResponse { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_http_error_keeps_lossy_body_text() {
        let conn = connection(StubTransport::replying(502, b"bad \xff gateway"));

        let err = conn.send_request("echo", &Map::new()).unwrap_err();

        let Error::Connectivity(ConnectivityError::HttpStatus { status, body }) = err else {
            panic!("expected an HTTP status error");
        };
        assert_eq!(status, 502);
        assert_eq!(body, "bad \u{fffd} gateway");
    }

    #[test]
    fn test_prepared_request_matches_send_request() {
        let stub = StubTransport::default();
        stub.push(200, "{}");
        stub.push(200, "{}");
        let conn = connection(stub);

        let mut request = Request::new("resize");
        request.set_data("width", 640);
        conn.send_prepared_request(&request).unwrap();
        let (_, prepared, _) = conn.transport().last_call();

        conn.send_request("resize", &json!({"width": 640})).unwrap();
        let (_, direct, _) = conn.transport().last_call();

        assert_eq!(prepared, direct);
    }

    #[test]
    fn test_prepared_request_is_reusable() {
        let stub = StubTransport::default();
        stub.push(200, "{}");
        stub.push(200, "{}");
        let conn = connection(stub);

        let request = Request::new("tick");
        conn.send_prepared_request(&request).unwrap();
        conn.send_prepared_request(&request).unwrap();

        assert_eq!(conn.transport().call_count(), 2);
    }

    #[test]
    fn test_prepared_value_plain_mapping_never_reaches_transport() {
        let conn = connection(StubTransport::default());

        let err = conn.send_prepared_value(&json!({"x": 1})).unwrap_err();

        assert!(matches!(err, Error::Usage(UsageError::NotARequest(_))));
        assert_eq!(conn.transport().call_count(), 0);
    }

    #[test]
    fn test_prepared_value_request_document() {
        let conn = connection(StubTransport::replying(200, "{}"));

        conn.send_prepared_value(&json!({"module": "echo", "data": {"k": true}}))
            .unwrap();

        let (_, body, _) = conn.transport().last_call();
        assert_eq!(body["module"], json!("echo"));
        assert_eq!(body["data"], json!({"k": true}));
    }

    #[test]
    fn test_usage_errors_never_reach_transport() {
        let conn = connection(StubTransport::default());

        assert!(matches!(
            conn.send_request("", &Map::new()),
            Err(Error::Usage(UsageError::EmptyModule))
        ));
        assert!(matches!(
            conn.send_request("echo", &7),
            Err(Error::Usage(UsageError::DataNotObject))
        ));
        assert!(matches!(
            conn.send_custom_request("a/b", &Map::new()),
            Err(Error::Usage(UsageError::InvalidHandler(_)))
        ));
        assert_eq!(conn.transport().call_count(), 0);
    }

    #[test]
    fn test_custom_request_envelope() {
        let conn = connection(StubTransport::replying(200, r#"{"pong": true}"#));

        let response = conn.send_custom_request("status", &json!({"verbose": 1})).unwrap();

        let (url, body, _) = conn.transport().last_call();
        assert_eq!(url, "https://cloud.test:8080/status/");
        assert_eq!(body, json!({"token": "secret", "data": {"verbose": 1}}));
        assert_eq!(response.get("pong"), Some(&json!(true)));
    }

    #[test]
    fn test_custom_request_defaults_to_empty_data() {
        let conn = connection(StubTransport::replying(200, "{}"));

        conn.send_custom_request_empty("ping").unwrap();

        let (_, body, _) = conn.transport().last_call();
        assert_eq!(body, json!({"token": "secret", "data": {}}));
    }

    #[test]
    fn test_config_is_read_at_call_time() {
        let stub = StubTransport::default();
        stub.push(200, "{}");
        stub.push(200, "{}");
        let mut conn = connection(stub);

        conn.send_request("echo", &Map::new()).unwrap();
        assert_eq!(conn.transport().last_call().2.timeout, Duration::from_secs(60));

        conn.config.timeout = Duration::from_secs(3);
        conn.config.verify_tls = false;
        conn.send_request("echo", &Map::new()).unwrap();

        let (_, _, config) = conn.transport().last_call();
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert!(!config.verify_tls);
    }

    #[test]
    fn test_token_change_applies_to_next_call() {
        let stub = StubTransport::default();
        stub.push(200, "{}");
        let mut conn = connection(stub);

        conn.set_token("rotated");
        conn.send_request("echo", &Map::new()).unwrap();

        assert_eq!(conn.transport().last_call().1["token"], json!("rotated"));
    }
}
