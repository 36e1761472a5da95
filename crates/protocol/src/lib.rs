//! Line-framed JSON protocol between a host supervisor and a function bridge.
//!
//! The supervisor writes one [`InvocationRequest`] per line to the bridge's
//! stdin. The bridge answers each request with exactly one result frame on
//! stdout, a JSON object whose only key is [`PAYLOAD_KEY`]. Anything else the
//! bridge process prints on stdout is diagnostic text and is passed through.
//!
//! ```text
//! stdin   {"event":{"a":1},"context":{}}
//! stdout  handler says hello              <- diagnostic
//! stdout  {"__offline_payload__":{"ok":true}}
//! ```
//!
//! Failures are not answered with a frame. The bridge writes a
//! [`FailureReport`] line to stderr and exits with a [`BridgeExit`] status.

mod error;
mod exit;
mod failure;
mod frame;
mod request;

pub use error::{Error, Result};
pub use exit::BridgeExit;
pub use failure::{ERROR_KEY, FailureReport};
pub use frame::{DIAGNOSTIC_PREFIX, OutputLine, PAYLOAD_KEY, classify_line, encode_response, guard_diagnostic, write_line};
pub use request::{InvocationRequest, RequestReader, decode_request, encode_request};
