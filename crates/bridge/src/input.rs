//! Where the request channel is read from.
//!
//! Normally requests arrive on stdin. A handler that wants to prompt on the
//! terminal (a debugger, an interactive confirmation) needs stdin for itself,
//! so [`TerminalInput`] moves the request channel to a duplicate descriptor
//! and points stdin at the controlling terminal before the loop starts.

use std::io::{self, BufRead, IsTerminal};

/// Opens the request channel for the loop.
pub trait InputBinding {
	fn open(&self) -> io::Result<Box<dyn BufRead>>;
}

/// Reads requests from stdin as is.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinInput;

impl InputBinding for StdinInput {
	fn open(&self) -> io::Result<Box<dyn BufRead>> {
		Ok(Box::new(io::stdin().lock()))
	}
}

/// Reads requests from a duplicate of stdin and rebinds stdin to
/// `/dev/tty`.
///
/// Falls back to [`StdinInput`] when stdin already is a terminal, when no
/// terminal can be opened, or on platforms without descriptor duplication.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalInput;

impl InputBinding for TerminalInput {
	fn open(&self) -> io::Result<Box<dyn BufRead>> {
		if io::stdin().is_terminal() {
			tracing::debug!("stdin is already a terminal, not rebinding");
			return StdinInput.open();
		}
		match rebind() {
			Ok(input) => {
				tracing::debug!("stdin rebound to the controlling terminal");
				Ok(input)
			}
			Err(err) => {
				tracing::warn!(error = %err, "cannot attach terminal, reading requests from stdin");
				StdinInput.open()
			}
		}
	}
}

#[cfg(unix)]
fn rebind() -> io::Result<Box<dyn BufRead>> {
	use std::fs::File;
	use std::io::BufReader;

	let tty = File::options().read(true).write(true).open("/dev/tty")?;
	let channel = rustix::io::dup(io::stdin())?;
	rustix::stdio::dup2_stdin(&tty)?;
	Ok(Box::new(BufReader::new(File::from(channel))))
}

#[cfg(not(unix))]
fn rebind() -> io::Result<Box<dyn BufRead>> {
	Err(io::Error::new(io::ErrorKind::Unsupported, "terminal rebinding needs a unix platform"))
}

/// Picks the binding for a configuration.
pub fn input_binding(attach_tty: bool) -> Box<dyn InputBinding> {
	if attach_tty { Box::new(TerminalInput) } else { Box::new(StdinInput) }
}
