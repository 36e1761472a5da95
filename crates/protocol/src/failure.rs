use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key wrapping a [`FailureReport`] on the bridge's stderr.
pub const ERROR_KEY: &str = "__offline_error__";

/// Description of a handler failure, written to stderr just before the bridge
/// exits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
	pub error_type: String,
	pub error_message: String,
}

impl FailureReport {
	pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
		Self {
			error_type: error_type.into(),
			error_message: error_message.into(),
		}
	}

	/// Single-line `{"__offline_error__": {...}}` encoding.
	pub fn encode(&self) -> String {
		let mut map = Map::new();
		map.insert(
			ERROR_KEY.to_owned(),
			serde_json::json!({
				"errorType": self.error_type,
				"errorMessage": self.error_message,
			}),
		);
		Value::Object(map).to_string()
	}

	/// Parses a stderr line written by [`encode`](Self::encode).
	pub fn parse(line: &str) -> Option<Self> {
		let trimmed = line.trim();
		if !trimmed.starts_with('{') {
			return None;
		}
		let Value::Object(mut map) = serde_json::from_str::<Value>(trimmed).ok()? else {
			return None;
		};
		serde_json::from_value(map.remove(ERROR_KEY)?).ok()
	}
}
