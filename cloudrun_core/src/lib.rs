/*!
 * CloudRun Core: the request/response protocol engine.
 *
 * This crate turns a module call into a JSON envelope, hands it to a
 * transport, and classifies the server's answer as a `Response` or a
 * typed `Error`. End users should depend on the `cloudrun` facade crate
 * instead, which re-exports everything.
 *
 * # Module structure
 *
 * - `protocol/`: what we send and receive: envelope, decoding, constants
 * - `transport/`: how we deliver: the `Transport` seam and the ureq client
 * - `config`: per-connection settings read at call time
 * - `connection`: the call dispatcher
 * - `request`: the prepared-request builder
 * - `response`: the immutable result of a successful call
 * - `error`: the failure taxonomy
 */

mod config;
mod connection;
mod error;
mod protocol;
mod request;
mod response;
mod transport;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use config::{Auth, Config, Proxies};
pub use connection::Connection;
pub use error::{ConnectivityError, Error, ProtocolError, Result, UsageError};
pub use protocol::constants::{DEFAULT_TIMEOUT, REQUEST_HANDLER, USER_AGENT};
pub use protocol::endpoint::Endpoint;
pub use protocol::envelope::Envelope;
pub use request::Request;
pub use response::{Headers, Response};
pub use transport::{HttpTransport, RawResponse, Transport};
