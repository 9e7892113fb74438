/*!
 * Protocol layer: wire shapes and their classification.
 *
 * Everything related to *what* travels between client and server:
 * - `constants`: handler name, default timeout, user agent
 * - `endpoint`: base URL + port, handler path resolution
 * - `envelope`: the outbound `{token, module?, data}` document
 * - `decode`: inbound body parsing and error-marker detection
 */

pub mod constants;
pub mod decode;
pub mod endpoint;
pub mod envelope;
