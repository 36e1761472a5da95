use std::io::Write;
use std::sync::Arc;

use fnhost_context::LogSink;
use fnhost_protocol::{guard_diagnostic, write_line};
use parking_lot::Mutex;

/// Shared handle on the protocol's output stream.
pub(crate) type SharedOutput = Arc<Mutex<Box<dyn Write + Send>>>;

/// [`LogSink`] writing context log lines to the protocol's output stream.
///
/// Lines that would read as a result frame are guarded first, so nothing a
/// handler logs can be taken for its result.
#[derive(Clone)]
pub struct ChannelSink {
	output: SharedOutput,
}

impl ChannelSink {
	pub(crate) fn new(output: SharedOutput) -> Self {
		Self { output }
	}
}

impl LogSink for ChannelSink {
	fn write_line(&self, line: &str) {
		let guarded = guard_diagnostic(line);
		if let Err(err) = write_line(&mut *self.output.lock(), &guarded) {
			tracing::warn!(error = %err, "failed to write handler log line");
		}
	}
}

impl std::fmt::Debug for ChannelSink {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChannelSink").finish_non_exhaustive()
	}
}
