/// Destination for lines a handler writes through [`InvocationContext::log`].
///
/// The bridge installs a sink that shares the protocol's output stream and
/// guards each line against being mistaken for a result frame.
///
/// [`InvocationContext::log`]: crate::InvocationContext::log
pub trait LogSink: Send + Sync {
	/// Writes one line. `line` never contains a newline.
	fn write_line(&self, line: &str);
}
