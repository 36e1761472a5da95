//! Invocation loop for a function bridge process.
//!
//! A bridge is started by the supervisor with a handler reference, resolves
//! it once against the handlers linked into the binary, then serves one
//! request line at a time until its stdin closes:
//!
//! ```text
//! Idle ──request line──▶ Executing ──result frame──▶ Idle
//!   └──end of input──▶ exit 0
//! ```
//!
//! Handler failures end the process with a [`FailureReport`] on stderr and a
//! [`BridgeExit`] status. Logging goes to stderr; stdout carries result
//! frames and the handler's own output, forwarded line by line with anything
//! that could pass for a frame defused.
//!
//! A bridge binary is a crate that registers handlers and calls
//! [`bridge_main`]:
//!
//! ```ignore
//! fn main() -> std::process::ExitCode {
//!     fnhost_bridge::bridge_main()
//! }
//! ```
//!
//! [`FailureReport`]: fnhost_protocol::FailureReport
//! [`BridgeExit`]: fnhost_protocol::BridgeExit

mod capture;
mod cli;
mod config;
mod error;
mod input;
mod invocation;
mod logging;
mod sink;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use fnhost_handler::HandlerRegistry;
use fnhost_protocol::BridgeExit;

pub use capture::{StdoutPipe, redirect_stdout};
pub use cli::BridgeCli;
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use input::{InputBinding, StdinInput, TerminalInput, input_binding};
pub use invocation::InvocationLoop;
pub use logging::{LOG_ENV, init_tracing};
pub use sink::ChannelSink;

/// Process entry point: parses the command line, sets up logging and runs
/// the loop against every handler linked into the binary.
pub fn bridge_main() -> ExitCode {
	let cli = match BridgeCli::try_parse() {
		Ok(cli) => cli,
		Err(err) => {
			let _ = err.print();
			return if err.use_stderr() { BridgeExit::Usage.into() } else { ExitCode::SUCCESS };
		}
	};

	init_tracing(cli.verbose);
	let config = cli.into_config();

	match run(&config, &HandlerRegistry::linked()) {
		Ok(served) => {
			tracing::info!(served, "request channel closed");
			BridgeExit::Clean.into()
		}
		Err(err) => {
			let exit = err.exit();
			tracing::error!(error = %err, code = exit.code(), "bridge exiting");
			exit.into()
		}
	}
}

/// Resolves the configured handler and serves requests until end of input.
///
/// Returns the number of invocations served.
pub fn run(config: &BridgeConfig, registry: &HandlerRegistry) -> Result<u64> {
	let handler = registry.resolve(&config.handler_path, &config.handler_name)?;
	tracing::debug!(path = %config.handler_path, name = %config.handler_name, "handler resolved");

	let input = input_binding(config.attach_tty).open().map_err(BridgeError::Input)?;
	match redirect_stdout() {
		Ok((channel, pipe)) => InvocationLoop::new(input, channel, io::stderr(), handler).capture_stdout(pipe, io::stdout())?.run(),
		Err(err) => {
			tracing::warn!(error = %err, "cannot redirect handler stdout, sharing it with results");
			InvocationLoop::new(input, io::stdout(), io::stderr(), handler).run()
		}
	}
}
