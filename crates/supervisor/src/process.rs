use std::time::{Duration, Instant};

use fnhost_protocol::{InvocationRequest, OutputLine, classify_line, encode_request};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout};

use crate::stderr::StderrTail;
use crate::{BridgeCommand, BridgeFailure, ExitKind, Result, SupervisorConfig, SupervisorError};

/// Outcome of one successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
	/// The handler's return value.
	pub payload: Value,
	/// Lines the handler printed on stdout before returning, in order.
	pub diagnostics: Vec<String>,
}

/// A running bridge process.
///
/// Handles one invocation at a time; the borrow on `&mut self` keeps
/// requests strictly sequential.
pub struct BridgeProcess {
	label: String,
	child: Child,
	stdin: Option<ChildStdin>,
	stdout: Lines<BufReader<ChildStdout>>,
	stderr: StderrTail,
	exited: bool,
	invocations: u64,
	idle_since: Instant,
	shutdown_grace: Duration,
}

impl BridgeProcess {
	/// Spawns a bridge. The handler is resolved by the child on startup; a
	/// bad reference shows up as an exit on the first invocation.
	pub async fn spawn(command: &BridgeCommand, config: &SupervisorConfig) -> Result<Self> {
		let label = command.label();
		let program = command.program().display().to_string();
		let spawn_error = |source: std::io::Error| SupervisorError::Spawn {
			program: program.clone(),
			source,
		};

		let mut child = command.to_command().spawn().map_err(&spawn_error)?;
		let missing = |stream: &str| spawn_error(std::io::Error::other(format!("failed to capture {stream}")));
		let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
		let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
		let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

		tracing::info!(bridge = %label, pid = ?child.id(), %program, "bridge started");

		Ok(Self {
			stderr: StderrTail::spawn(stderr, label.clone(), config.stderr_tail_lines),
			label,
			child,
			stdin: Some(stdin),
			stdout: BufReader::new(stdout).lines(),
			exited: false,
			invocations: 0,
			idle_since: Instant::now(),
			shutdown_grace: config.shutdown_grace(),
		})
	}

	/// Sends one request and waits for its result frame.
	///
	/// Diagnostic lines read on the way are logged and returned with the
	/// payload. If the bridge exits first, the error carries its exit
	/// classification and failure report.
	pub async fn invoke(&mut self, request: &InvocationRequest) -> Result<Invocation> {
		if self.exited {
			return Err(SupervisorError::Dead);
		}
		let line = encode_request(request)?;
		if let Err(err) = self.send(&line).await {
			tracing::debug!(bridge = %self.label, error = %err, "request write failed");
			return Err(self.exit_error().await);
		}

		let mut diagnostics = Vec::new();
		loop {
			match self.stdout.next_line().await {
				Ok(Some(line)) => match classify_line(&line) {
					OutputLine::Payload(payload) => {
						self.invocations += 1;
						self.idle_since = Instant::now();
						return Ok(Invocation { payload, diagnostics });
					}
					OutputLine::Diagnostic(text) => {
						tracing::info!(target: "fnhost::handler", bridge = %self.label, "{text}");
						diagnostics.push(text);
					}
				},
				Ok(None) => return Err(self.exit_error().await),
				Err(err) => {
					self.kill().await;
					return Err(SupervisorError::Channel(err));
				}
			}
		}
	}

	/// [`invoke`](Self::invoke) with an optional time limit. A bridge that
	/// exceeds it is killed.
	pub async fn invoke_with_timeout(&mut self, request: &InvocationRequest, limit: Option<Duration>) -> Result<Invocation> {
		let Some(limit) = limit else {
			return self.invoke(request).await;
		};
		match tokio::time::timeout(limit, self.invoke(request)).await {
			Ok(result) => result,
			Err(_) => {
				tracing::warn!(bridge = %self.label, ?limit, "invocation timed out, killing bridge");
				self.kill().await;
				Err(SupervisorError::Timeout(limit))
			}
		}
	}

	async fn send(&mut self, line: &str) -> std::io::Result<()> {
		let stdin = self.stdin.as_mut().ok_or(std::io::ErrorKind::BrokenPipe)?;
		stdin.write_all(line.as_bytes()).await?;
		stdin.write_all(b"\n").await?;
		stdin.flush().await
	}

	async fn exit_error(&mut self) -> SupervisorError {
		self.stdin = None;
		let kind = match tokio::time::timeout(self.shutdown_grace, self.child.wait()).await {
			Ok(Ok(status)) => ExitKind::from_status(status),
			_ => {
				self.kill().await;
				ExitKind::Unknown
			}
		};
		self.exited = true;

		let (report, stderr) = self.stderr.finish(self.shutdown_grace).await;
		let failure = BridgeFailure { kind, report, stderr };
		tracing::warn!(bridge = %self.label, %failure, "bridge exited");
		SupervisorError::Exited(failure)
	}

	/// Kills the child and waits briefly for it to go away.
	pub async fn kill(&mut self) {
		self.stdin = None;
		let _ = self.child.start_kill();
		let _ = tokio::time::timeout(self.shutdown_grace, self.child.wait()).await;
		self.exited = true;
	}

	/// Closes the request channel and waits for the bridge to exit,
	/// killing it after the grace period.
	pub async fn shutdown(mut self) -> ExitKind {
		if self.exited {
			return ExitKind::Unknown;
		}
		self.stdin = None;
		let kind = match tokio::time::timeout(self.shutdown_grace, self.child.wait()).await {
			Ok(Ok(status)) => ExitKind::from_status(status),
			_ => {
				self.kill().await;
				ExitKind::Unknown
			}
		};
		self.exited = true;
		tracing::debug!(bridge = %self.label, invocations = self.invocations, exit = %kind, "bridge shut down");
		kind
	}

	/// Whether the child is still running. Reaps it if it has exited.
	pub fn is_alive(&mut self) -> bool {
		if self.exited {
			return false;
		}
		match self.child.try_wait() {
			Ok(None) => true,
			_ => {
				self.exited = true;
				false
			}
		}
	}

	pub fn pid(&self) -> Option<u32> {
		self.child.id()
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	/// Number of invocations answered so far.
	pub fn invocations(&self) -> u64 {
		self.invocations
	}

	/// Time since the last answered invocation, or since spawn.
	pub fn idle_time(&self) -> Duration {
		self.idle_since.elapsed()
	}

	/// Most recent stderr lines.
	pub fn stderr_tail(&self) -> Vec<String> {
		self.stderr.lines()
	}
}

impl std::fmt::Debug for BridgeProcess {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BridgeProcess")
			.field("label", &self.label)
			.field("pid", &self.child.id())
			.field("exited", &self.exited)
			.field("invocations", &self.invocations)
			.finish_non_exhaustive()
	}
}
