use std::io;

use fnhost_handler::{HandlerError, ResolutionError};
use fnhost_protocol::{BridgeExit, FailureReport};

/// A convenient type alias for `Result` with `E` = [`BridgeError`].
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Conditions that end a bridge process.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
	#[error(transparent)]
	Resolution(#[from] ResolutionError),
	#[error("failed to open the request channel: {0}")]
	Input(#[source] io::Error),
	#[error(transparent)]
	Protocol(#[from] fnhost_protocol::Error),
	#[error("handler failed: {0}")]
	Handler(HandlerError),
	#[error("handler result is not serializable: {0}")]
	Unserializable(#[source] serde_json::Error),
}

impl BridgeError {
	pub fn exit(&self) -> BridgeExit {
		match self {
			Self::Resolution(_) => BridgeExit::Resolution,
			Self::Input(_) => BridgeExit::Channel,
			Self::Protocol(err) => err.exit(),
			Self::Handler(_) => BridgeExit::HandlerFailure,
			Self::Unserializable(_) => BridgeExit::Unserializable,
		}
	}

	/// The stderr report for failures caused by handler code.
	pub fn report(&self) -> Option<FailureReport> {
		match self {
			Self::Handler(err) => Some(FailureReport::new(err.error_type(), err.message())),
			Self::Unserializable(err) => Some(FailureReport::new("SerializationError", err.to_string())),
			_ => None,
		}
	}
}
