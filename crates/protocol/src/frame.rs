use std::borrow::Cow;
use std::io::{self, Write};

use serde_json::{Map, Value};

/// Reserved key marking a stdout line as an invocation result.
pub const PAYLOAD_KEY: &str = "__offline_payload__";

/// Prefix added to diagnostic lines that would otherwise read as a result frame.
pub const DIAGNOSTIC_PREFIX: &str = "[diagnostic] ";

/// One line read from a bridge's stdout.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputLine {
	/// A result frame; carries the handler's return value.
	Payload(Value),
	/// Anything else, passed through verbatim.
	Diagnostic(String),
}

/// Encodes `payload` as a result frame, without the trailing newline.
pub fn encode_response(payload: Value) -> String {
	let mut frame = Map::new();
	frame.insert(PAYLOAD_KEY.to_owned(), payload);
	Value::Object(frame).to_string()
}

/// Classifies one stdout line.
///
/// Only a JSON object whose sole key is [`PAYLOAD_KEY`] is a result frame.
/// Objects carrying extra keys, other JSON and plain text are diagnostics.
pub fn classify_line(line: &str) -> OutputLine {
	match parse_payload(line) {
		Some(payload) => OutputLine::Payload(payload),
		None => OutputLine::Diagnostic(line.trim_end_matches(['\r', '\n']).to_owned()),
	}
}

/// Makes a diagnostic line safe to share the stdout channel with result frames.
///
/// Lines that would classify as a result frame get [`DIAGNOSTIC_PREFIX`],
/// which stops them from parsing as JSON. All other lines pass unchanged.
pub fn guard_diagnostic(line: &str) -> Cow<'_, str> {
	if parse_payload(line).is_some() {
		Cow::Owned(format!("{DIAGNOSTIC_PREFIX}{line}"))
	} else {
		Cow::Borrowed(line)
	}
}

/// Writes `line` and a newline, then flushes.
pub fn write_line<W: Write + ?Sized>(out: &mut W, line: &str) -> io::Result<()> {
	out.write_all(line.as_bytes())?;
	out.write_all(b"\n")?;
	out.flush()
}

fn parse_payload(line: &str) -> Option<Value> {
	let trimmed = line.trim();
	if !trimmed.starts_with('{') {
		return None;
	}
	let Value::Object(mut map) = serde_json::from_str::<Value>(trimmed).ok()? else {
		return None;
	};
	if map.len() != 1 {
		return None;
	}
	map.remove(PAYLOAD_KEY)
}
