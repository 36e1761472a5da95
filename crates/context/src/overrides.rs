use serde_json::{Map, Number, Value};

/// Property names shared by the override mapping and [`InvocationContext::get`].
///
/// [`InvocationContext::get`]: crate::InvocationContext::get
pub mod keys {
	pub const NAME: &str = "name";
	pub const VERSION: &str = "version";
	pub const TIMEOUT_SECONDS: &str = "timeoutSeconds";
	/// Older spelling of [`TIMEOUT_SECONDS`], still accepted on input.
	pub const TIMEOUT: &str = "timeout";
	pub const CREATED_AT: &str = "createdAt";
	pub const REQUEST_ID: &str = "awsRequestId";
	pub const FUNCTION_NAME: &str = "functionName";
	pub const FUNCTION_VERSION: &str = "functionVersion";
	pub const INVOKED_FUNCTION_ARN: &str = "invokedFunctionArn";
	pub const MEMORY_LIMIT_IN_MB: &str = "memoryLimitInMB";
	pub const LOG_GROUP_NAME: &str = "logGroupName";
	pub const LOG_STREAM_NAME: &str = "logStreamName";
	pub const REMAINING_TIME_IN_MILLIS: &str = "remainingTimeInMillis";
	pub const DEADLINE_MS: &str = "deadlineMs";

	/// Every fixed or derived property, in snapshot order.
	pub const DERIVED: &[&str] = &[
		NAME,
		VERSION,
		TIMEOUT_SECONDS,
		CREATED_AT,
		REQUEST_ID,
		FUNCTION_NAME,
		FUNCTION_VERSION,
		INVOKED_FUNCTION_ARN,
		MEMORY_LIMIT_IN_MB,
		LOG_GROUP_NAME,
		LOG_STREAM_NAME,
		REMAINING_TIME_IN_MILLIS,
		DEADLINE_MS,
	];
}

/// Host-side builder for the `context` mapping of an invocation request.
///
/// The bridge accepts any mapping; this builder only produces the keys a host
/// emulator conventionally sends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextOverrides {
	map: Map<String, Value>,
}

impl ContextOverrides {
	pub fn new() -> Self {
		Self::default()
	}

	/// Overrides for a named function with its configured memory size.
	///
	/// The bridge always reports its fixed memory limit through
	/// [`InvocationContext::get`] and [`InvocationContext::snapshot`]; the size
	/// sent here is only visible through [`InvocationContext::extra`].
	///
	/// [`InvocationContext::get`]: crate::InvocationContext::get
	/// [`InvocationContext::snapshot`]: crate::InvocationContext::snapshot
	/// [`InvocationContext::extra`]: crate::InvocationContext::extra
	pub fn for_function(function_name: impl Into<String>, memory_size_mb: u32) -> Self {
		let function_name = function_name.into();
		Self::new()
			.name(function_name.clone())
			.insert(keys::FUNCTION_NAME, function_name)
			.insert(keys::MEMORY_LIMIT_IN_MB, memory_size_mb.to_string())
	}

	#[must_use]
	pub fn name(self, name: impl Into<String>) -> Self {
		self.insert(keys::NAME, name.into())
	}

	#[must_use]
	pub fn version(self, version: impl Into<String>) -> Self {
		let version = version.into();
		self.insert(keys::VERSION, version.clone()).insert(keys::FUNCTION_VERSION, version)
	}

	/// Sets the soft time budget. Non-finite values are ignored.
	#[must_use]
	pub fn timeout_seconds(self, seconds: f64) -> Self {
		match Number::from_f64(seconds) {
			Some(n) => self.insert(keys::TIMEOUT_SECONDS, Value::Number(n)),
			None => self,
		}
	}

	#[must_use]
	pub fn request_id(self, id: impl Into<String>) -> Self {
		self.insert(keys::REQUEST_ID, id.into())
	}

	/// Assigns a freshly generated request id.
	#[must_use]
	pub fn fresh_request_id(self) -> Self {
		self.request_id(uuid::Uuid::new_v4().to_string())
	}

	/// Sets an arbitrary property.
	#[must_use]
	pub fn insert(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.map.insert(key.into(), value.into());
		self
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.map.get(key)
	}

	pub fn as_map(&self) -> &Map<String, Value> {
		&self.map
	}

	pub fn into_map(self) -> Map<String, Value> {
		self.map
	}
}

impl From<ContextOverrides> for Map<String, Value> {
	fn from(overrides: ContextOverrides) -> Self {
		overrides.map
	}
}

impl From<Map<String, Value>> for ContextOverrides {
	fn from(map: Map<String, Value>) -> Self {
		Self { map }
	}
}
