use std::io::{self, BufRead};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// One invocation, as written by the supervisor on a single line.
///
/// `event` is required but may be `null`. A missing or `null` `context`
/// decodes as an empty override mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
	pub event: Value,
	#[serde(default, deserialize_with = "null_as_empty")]
	pub context: Map<String, Value>,
}

impl InvocationRequest {
	pub fn new(event: Value) -> Self {
		Self {
			event,
			context: Map::new(),
		}
	}

	#[must_use]
	pub fn with_context(mut self, context: impl Into<Map<String, Value>>) -> Self {
		self.context = context.into();
		self
	}
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error> {
	Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decodes one request line. Only a JSON object is a request.
pub fn decode_request(line: &str) -> Result<InvocationRequest> {
	let value: Value = serde_json::from_str(line).map_err(|e| Error::MalformedRequest(e.to_string()))?;
	if !value.is_object() {
		return Err(Error::MalformedRequest("request line is not a JSON object".into()));
	}
	serde_json::from_value(value).map_err(|e| Error::MalformedRequest(e.to_string()))
}

/// Encodes a request as a single line, without the trailing newline.
pub fn encode_request(request: &InvocationRequest) -> Result<String> {
	Ok(serde_json::to_string(request)?)
}

/// Reads requests from the bridge's input side, one line at a time.
///
/// Whitespace-only lines are skipped. Bytes that are not UTF-8 count as a
/// malformed request.
#[derive(Debug)]
pub struct RequestReader<R> {
	input: R,
	line: String,
}

impl<R: BufRead> RequestReader<R> {
	pub fn new(input: R) -> Self {
		Self {
			input,
			line: String::new(),
		}
	}

	/// Blocks for the next request. `Ok(None)` means end of stream.
	pub fn next_request(&mut self) -> Result<Option<InvocationRequest>> {
		loop {
			self.line.clear();
			let read = self.input.read_line(&mut self.line).map_err(|e| match e.kind() {
				io::ErrorKind::InvalidData => Error::MalformedRequest("request line is not valid UTF-8".into()),
				_ => Error::Io(e),
			})?;
			if read == 0 {
				return Ok(None);
			}
			if self.line.trim().is_empty() {
				continue;
			}
			return decode_request(&self.line).map(Some);
		}
	}

	pub fn into_inner(self) -> R {
		self.input
	}
}
