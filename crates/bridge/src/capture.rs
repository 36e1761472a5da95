//! Keeps the handler's own stdout off the result channel.
//!
//! Handlers print freely, but anything that reaches the channel unguarded
//! could parse as a result frame or glue itself to the front of one. On unix
//! [`redirect_stdout`] moves the channel to a private duplicate of fd 1 and
//! points fd 1 at a pipe. [`StdoutCapture`] pumps that pipe line by line
//! through [`guard_diagnostic`] into the channel, and [`StdoutCapture::drain`]
//! waits until everything printed so far has been forwarded, so a frame
//! always starts on a fresh line after the handler's output.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use fnhost_protocol::{guard_diagnostic, write_line};

use crate::sink::SharedOutput;

/// Read side of the pipe now standing in for the process's stdout.
#[derive(Debug)]
pub struct StdoutPipe {
	reader: File,
}

impl StdoutPipe {
	/// Wraps the read side of a pipe whose write side the handler writes to.
	pub fn new(reader: File) -> Self {
		Self { reader }
	}
}

/// Duplicates fd 1 as the result channel and rebinds fd 1 to a pipe.
///
/// Returns the channel and the pipe to hand to [`StdoutCapture::start`].
#[cfg(unix)]
pub fn redirect_stdout() -> io::Result<(File, StdoutPipe)> {
	let mut stdout = io::stdout().lock();
	stdout.flush()?;
	let channel = rustix::io::dup(&stdout)?;
	let (reader, writer) = rustix::pipe::pipe()?;
	rustix::stdio::dup2_stdout(&writer)?;
	Ok((File::from(channel), StdoutPipe::new(File::from(reader))))
}

#[cfg(not(unix))]
pub fn redirect_stdout() -> io::Result<(File, StdoutPipe)> {
	Err(io::Error::new(io::ErrorKind::Unsupported, "stdout redirection needs a unix platform"))
}

/// Background pump from the handler's stdout pipe into the result channel.
pub struct StdoutCapture {
	marker: String,
	drained: Receiver<()>,
	writer: SharedOutput,
}

impl StdoutCapture {
	/// Starts pumping `pipe` into `output`.
	///
	/// `writer` is the write side of the pipe as the handler sees it, used to
	/// flush and to mark how far a drain has to go.
	pub(crate) fn start(pipe: StdoutPipe, output: SharedOutput, writer: SharedOutput) -> io::Result<Self> {
		let marker = format!("\0fnhost-drain-{}", uuid::Uuid::new_v4().simple());
		let (tx, rx) = mpsc::channel();
		let pump = Pump {
			marker: marker.clone(),
			output,
			drained: tx,
		};
		thread::Builder::new().name("fnhost-stdout".into()).spawn(move || pump.run(pipe.reader))?;
		Ok(Self {
			marker,
			drained: rx,
			writer,
		})
	}

	/// Blocks until everything written to the pipe so far has reached the
	/// channel. An unterminated last line is ended first.
	pub fn drain(&mut self) -> io::Result<()> {
		{
			let mut writer = self.writer.lock();
			writer.flush()?;
			writer.write_all(format!("{}\n", self.marker).as_bytes())?;
			writer.flush()?;
		}
		self.drained
			.recv()
			.map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "stdout pump stopped"))
	}
}

impl std::fmt::Debug for StdoutCapture {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StdoutCapture").finish_non_exhaustive()
	}
}

struct Pump {
	marker: String,
	output: SharedOutput,
	drained: Sender<()>,
}

impl Pump {
	fn run(self, reader: impl io::Read) {
		let mut reader = BufReader::new(reader);
		let mut buf = Vec::new();
		loop {
			buf.clear();
			match reader.read_until(b'\n', &mut buf) {
				Ok(0) => return,
				Ok(_) => {}
				Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
				Err(err) => {
					tracing::warn!(error = %err, "handler stdout pipe failed");
					return;
				}
			}

			let text = String::from_utf8_lossy(&buf);
			let line = text.strip_suffix('\n').unwrap_or(&text);
			match line.strip_suffix(self.marker.as_str()) {
				Some(pending) => {
					if !pending.is_empty() {
						self.forward(pending);
					}
					if self.drained.send(()).is_err() {
						return;
					}
				}
				None => self.forward(line),
			}
		}
	}

	fn forward(&self, line: &str) {
		if let Err(err) = write_line(&mut *self.output.lock(), &guard_diagnostic(line)) {
			tracing::warn!(error = %err, "failed to forward handler output");
		}
	}
}
