//! Bridge binary linking the fixture handlers in [`fixtures`].
//!
//! ```text
//! fnhost-conformance src/fixtures.rs counter
//! ```

use std::process::ExitCode;

mod fixtures;

fn main() -> ExitCode {
	fnhost_bridge::bridge_main()
}
