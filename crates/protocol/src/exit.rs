use std::fmt;

/// Exit status contract of a bridge process.
///
/// Both sides of the channel agree on these codes: the bridge exits with
/// them, the supervisor classifies a dead child by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BridgeExit {
	/// Input channel reached end of stream.
	Clean = 0,
	/// Missing or malformed command line arguments.
	Usage = 2,
	/// The handler reference did not resolve.
	Resolution = 3,
	/// An input line was not a valid request.
	MalformedRequest = 4,
	/// The handler returned an error or panicked.
	HandlerFailure = 5,
	/// The handler's result could not be encoded as JSON.
	Unserializable = 6,
	/// Reading or writing the channel failed.
	Channel = 7,
}

impl BridgeExit {
	const ALL: [Self; 7] = [
		Self::Clean,
		Self::Usage,
		Self::Resolution,
		Self::MalformedRequest,
		Self::HandlerFailure,
		Self::Unserializable,
		Self::Channel,
	];

	pub const fn code(self) -> u8 {
		self as u8
	}

	/// Classifies a raw process exit code.
	pub fn from_code(code: i32) -> Option<Self> {
		Self::ALL.into_iter().find(|exit| i32::from(exit.code()) == code)
	}

	pub const fn is_success(self) -> bool {
		matches!(self, Self::Clean)
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Clean => "channel closed",
			Self::Usage => "usage error",
			Self::Resolution => "handler resolution failed",
			Self::MalformedRequest => "malformed request",
			Self::HandlerFailure => "handler failed",
			Self::Unserializable => "result not serializable",
			Self::Channel => "channel I/O failed",
		}
	}
}

impl fmt::Display for BridgeExit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} (exit {})", self.as_str(), self.code())
	}
}

impl From<BridgeExit> for std::process::ExitCode {
	fn from(exit: BridgeExit) -> Self {
		Self::from(exit.code())
	}
}
