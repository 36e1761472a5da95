use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "FNHOST_LOG";

/// Installs a stderr subscriber. Stdout is the protocol channel and never
/// receives log output.
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing(verbose: bool) {
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("debug")
		} else {
			EnvFilter::new("info")
		}
	});

	let layer = tracing_subscriber::fmt::layer()
		.with_writer(std::io::stderr)
		.with_ansi(false)
		.with_target(verbose);

	let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}
