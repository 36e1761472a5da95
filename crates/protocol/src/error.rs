use crate::BridgeExit;

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Framing errors on either side of the channel.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// An input line is not a well-formed invocation request.
	#[error("malformed request: {0}")]
	MalformedRequest(String),
	/// A value could not be encoded as a JSON line.
	#[error("failed to encode frame: {0}")]
	Encode(#[from] serde_json::Error),
	/// Reading from or writing to the channel failed.
	#[error("channel I/O failed: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Exit status a bridge reports when this error ends its loop.
	pub fn exit(&self) -> BridgeExit {
		match self {
			Self::MalformedRequest(_) => BridgeExit::MalformedRequest,
			Self::Encode(_) => BridgeExit::Unserializable,
			Self::Io(_) => BridgeExit::Channel,
		}
	}
}
