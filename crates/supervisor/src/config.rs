use std::path::Path;
use std::time::Duration;

use fnhost_protocol::InvocationRequest;
use serde::{Deserialize, Serialize};

use crate::{Result, SupervisorError};

/// Supervisor settings, loadable from TOML:
///
/// ```toml
/// default-timeout-secs = 6
/// idle-time-secs = 60
/// no-timeout = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct SupervisorConfig {
	/// Invocation timeout used when the request's context carries none.
	pub default_timeout_secs: f64,
	/// Never time out invocations.
	pub no_timeout: bool,
	/// Idle processes older than this are reaped.
	pub idle_time_secs: f64,
	/// How long a bridge gets to exit after its stdin is closed or it is killed.
	pub shutdown_grace_ms: u64,
	/// Number of bridge stderr lines kept for failure messages.
	pub stderr_tail_lines: usize,
	/// Start a fresh bridge for every invocation instead of reusing idle ones.
	pub reload_handler: bool,
}

impl Default for SupervisorConfig {
	fn default() -> Self {
		Self {
			default_timeout_secs: 6.0,
			no_timeout: false,
			idle_time_secs: 60.0,
			shutdown_grace_ms: 2000,
			stderr_tail_lines: 64,
			reload_handler: false,
		}
	}
}

impl SupervisorConfig {
	pub fn from_toml(text: &str) -> Result<Self> {
		Ok(toml::from_str(text)?)
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|source| SupervisorError::ConfigRead {
			path: path.to_owned(),
			source,
		})?;
		Self::from_toml(&text)
	}

	/// Timeout for one invocation.
	///
	/// The request's `timeoutSeconds` (or `timeout`) override wins over
	/// [`default_timeout_secs`](Self::default_timeout_secs). `None` when
	/// timeouts are disabled.
	pub fn timeout_for(&self, request: &InvocationRequest) -> Option<Duration> {
		if self.no_timeout {
			return None;
		}
		let requested = ["timeoutSeconds", "timeout"]
			.iter()
			.find_map(|key| request.context.get(*key).and_then(|v| v.as_f64()))
			.and_then(seconds);
		requested.or_else(|| seconds(self.default_timeout_secs))
	}

	pub fn idle_time(&self) -> Duration {
		seconds(self.idle_time_secs).unwrap_or(Duration::ZERO)
	}

	pub fn shutdown_grace(&self) -> Duration {
		Duration::from_millis(self.shutdown_grace_ms)
	}
}

fn seconds(value: f64) -> Option<Duration> {
	if value > 0.0 { Duration::try_from_secs_f64(value).ok() } else { None }
}
