use clap::Parser;
use clap::builder::FalseyValueParser;

use crate::BridgeConfig;

/// Bridge command line arguments.
#[derive(Parser, Debug)]
#[command(name = "fnhost-bridge")]
#[command(about = "Serves invocation requests for one function handler over stdin/stdout")]
pub struct BridgeCli {
	/// Module holding the handler (file path or Rust module path)
	#[arg(value_name = "HANDLER_PATH", value_parser = non_blank)]
	pub handler_path: String,

	/// Name the handler was registered under
	#[arg(value_name = "HANDLER_NAME", value_parser = non_blank)]
	pub handler_name: String,

	/// Read requests from a duplicate of stdin and rebind stdin to the controlling terminal
	#[arg(long, env = "FNHOST_ATTACH_TTY", value_parser = FalseyValueParser::new())]
	pub attach_tty: bool,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,
}

impl BridgeCli {
	pub fn into_config(self) -> BridgeConfig {
		BridgeConfig::new(self.handler_path, self.handler_name).attach_tty(self.attach_tty)
	}
}

fn non_blank(value: &str) -> Result<String, String> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		return Err("must not be blank".into());
	}
	Ok(trimmed.to_owned())
}
