/// Everything a bridge process needs to know before entering its loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
	/// Module reference, resolved through [`fnhost_handler::ModulePath`].
	pub handler_path: String,
	pub handler_name: String,
	/// Rebind stdin to the controlling terminal, see [`crate::TerminalInput`].
	pub attach_tty: bool,
}

impl BridgeConfig {
	pub fn new(handler_path: impl Into<String>, handler_name: impl Into<String>) -> Self {
		Self {
			handler_path: handler_path.into(),
			handler_name: handler_name.into(),
			attach_tty: false,
		}
	}

	#[must_use]
	pub fn attach_tty(mut self, attach: bool) -> Self {
		self.attach_tty = attach;
		self
	}
}
