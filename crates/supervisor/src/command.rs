use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

/// How to start a bridge for one handler.
///
/// The bridge is run as `<program> [args...] <handler_path> <handler_name>`
/// with all three standard streams piped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeCommand {
	program: PathBuf,
	args: Vec<OsString>,
	handler_path: String,
	handler_name: String,
	env: Vec<(OsString, OsString)>,
	current_dir: Option<PathBuf>,
}

impl BridgeCommand {
	pub fn new(program: impl Into<PathBuf>, handler_path: impl Into<String>, handler_name: impl Into<String>) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
			handler_path: handler_path.into(),
			handler_name: handler_name.into(),
			env: Vec::new(),
			current_dir: None,
		}
	}

	/// Adds an argument placed before the handler reference.
	#[must_use]
	pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
		self.args.push(arg.as_ref().to_owned());
		self
	}

	#[must_use]
	pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
		self.env.push((key.as_ref().to_owned(), value.as_ref().to_owned()));
		self
	}

	#[must_use]
	pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.current_dir = Some(dir.into());
		self
	}

	pub fn program(&self) -> &Path {
		&self.program
	}

	/// `<handler_path>:<handler_name>`, used to label logs.
	pub fn label(&self) -> String {
		format!("{}:{}", self.handler_path, self.handler_name)
	}

	pub(crate) fn to_command(&self) -> Command {
		let mut cmd = Command::new(&self.program);
		cmd.args(&self.args)
			.arg(&self.handler_path)
			.arg(&self.handler_name)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);

		for (key, value) in &self.env {
			cmd.env(key, value);
		}
		if let Some(dir) = &self.current_dir {
			cmd.current_dir(dir);
		}
		cmd
	}
}
