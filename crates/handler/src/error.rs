/// A handler reference that cannot be resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
	#[error("no handler module matches `{module}` (known modules: {})", .known.join(", "))]
	ModuleNotFound { module: String, known: Vec<String> },
	#[error("module `{module}` has no handler `{function}` (available: {})", .available.join(", "))]
	FunctionNotFound {
		module: String,
		function: String,
		available: Vec<String>,
	},
	#[error("handler `{module}::{function}` is ambiguous: {}", .candidates.join(", "))]
	Ambiguous {
		module: String,
		function: String,
		candidates: Vec<String>,
	},
}
