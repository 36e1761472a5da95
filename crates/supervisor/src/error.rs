use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use fnhost_protocol::{BridgeExit, FailureReport};

/// A convenient type alias for `Result` with `E` = [`SupervisorError`].
pub type Result<T, E = SupervisorError> = std::result::Result<T, E>;

/// Errors from driving bridge processes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SupervisorError {
	#[error("failed to spawn bridge `{program}`: {source}")]
	Spawn {
		program: String,
		#[source]
		source: std::io::Error,
	},
	#[error("bridge channel failed: {0}")]
	Channel(#[from] std::io::Error),
	#[error(transparent)]
	Protocol(#[from] fnhost_protocol::Error),
	#[error("bridge exited without a result: {0}")]
	Exited(BridgeFailure),
	#[error("invocation timed out after {0:?}")]
	Timeout(Duration),
	#[error("bridge process is no longer running")]
	Dead,
	#[error("failed to read supervisor config {}: {source}", .path.display())]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse supervisor config: {0}")]
	ConfigParse(#[from] toml::de::Error),
}

impl SupervisorError {
	/// The bridge's exit classification, when the bridge exited.
	pub fn bridge_exit(&self) -> Option<BridgeExit> {
		match self {
			Self::Exited(failure) => failure.kind.bridge_exit(),
			_ => None,
		}
	}

	/// The failure report the bridge wrote before exiting, if any.
	pub fn report(&self) -> Option<&FailureReport> {
		match self {
			Self::Exited(failure) => failure.report.as_ref(),
			_ => None,
		}
	}
}

/// How a bridge process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
	/// Exit status from the bridge contract.
	Bridge(BridgeExit),
	/// Any other exit status.
	Code(i32),
	/// Terminated by a signal.
	Signal(i32),
	Unknown,
}

impl ExitKind {
	pub fn from_status(status: ExitStatus) -> Self {
		if let Some(code) = status.code() {
			return BridgeExit::from_code(code).map_or(Self::Code(code), Self::Bridge);
		}
		#[cfg(unix)]
		{
			use std::os::unix::process::ExitStatusExt;
			if let Some(signal) = status.signal() {
				return Self::Signal(signal);
			}
		}
		Self::Unknown
	}

	pub fn bridge_exit(self) -> Option<BridgeExit> {
		match self {
			Self::Bridge(exit) => Some(exit),
			_ => None,
		}
	}
}

impl fmt::Display for ExitKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bridge(exit) => exit.fmt(f),
			Self::Code(code) => write!(f, "exit {code}"),
			Self::Signal(signal) => write!(f, "killed by signal {signal}"),
			Self::Unknown => f.write_str("unknown exit status"),
		}
	}
}

/// A bridge that exited instead of answering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeFailure {
	pub kind: ExitKind,
	/// Report written by the bridge on handler failure.
	pub report: Option<FailureReport>,
	/// Last lines of the bridge's stderr.
	pub stderr: Vec<String>,
}

impl fmt::Display for BridgeFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.kind.fmt(f)?;
		if let Some(report) = &self.report {
			write!(f, ": {}: {}", report.error_type, report.error_message)?;
		} else if let Some(last) = self.stderr.last() {
			write!(f, ": {last}")?;
		}
		Ok(())
	}
}
