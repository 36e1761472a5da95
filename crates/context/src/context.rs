use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, TimeDelta};
use serde_json::{Map, Number, Value};

use crate::overrides::keys;
use crate::sink::LogSink;

/// Function name used when the host supplies none.
pub const DEFAULT_NAME: &str = "Fake";
/// Function version used when the host supplies none.
pub const DEFAULT_VERSION: &str = "LATEST";
/// Soft time budget in seconds used when the host supplies none.
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 6.0;
/// Memory limit reported to handlers. A string, as on the hosted platform.
pub const MEMORY_LIMIT_IN_MB: &str = "1024";
/// Prefix of the synthesized function ARN.
pub const ARN_PREFIX: &str = "arn:aws:lambda:serverless:";
/// Prefix of the synthesized log group path.
pub const LOG_GROUP_PREFIX: &str = "/aws/lambda/";

const LOG_STREAM_SUFFIX: &str = "58419525dade4d17a495dceeeed44708";

/// Per-invocation context handed to a handler alongside its event.
///
/// Built fresh for every invocation from the request's `context` mapping and
/// dropped once the handler returns. Apart from the remaining-time countdown,
/// nothing changes after construction.
///
/// Known override keys (`name`, `version`, `timeoutSeconds` and its alias
/// `timeout`) populate typed fields. Every other key is kept in an extras
/// table readable through [`get`](Self::get) and [`extra`](Self::extra).
pub struct InvocationContext {
	name: String,
	version: String,
	timeout_seconds: f64,
	created_at: DateTime<Local>,
	started: Instant,
	request_id: String,
	extras: Map<String, Value>,
	log_sink: Option<Arc<dyn LogSink>>,
}

impl InvocationContext {
	/// Creates a context with every default and no extras.
	pub fn new() -> Self {
		Self::from_overrides(Map::new())
	}

	/// Creates a context from a host-supplied override mapping.
	///
	/// Never fails. A known key carrying a value of an unusable type falls
	/// back to its default and the raw value is kept as an extra under the
	/// same key.
	pub fn from_overrides(overrides: Map<String, Value>) -> Self {
		let mut name = None;
		let mut version = None;
		let mut timeout_seconds = None;
		let mut timeout_alias = None;
		let mut extras = Map::new();

		for (key, value) in overrides {
			let accepted = match key.as_str() {
				keys::NAME => assign(&mut name, label(&value)),
				keys::VERSION => assign(&mut version, label(&value)),
				keys::TIMEOUT_SECONDS => assign(&mut timeout_seconds, value.as_f64()),
				keys::TIMEOUT => assign(&mut timeout_alias, value.as_f64()),
				_ => {
					extras.insert(key, value);
					continue;
				}
			};
			if !accepted && !value.is_null() {
				extras.insert(key, value);
			}
		}

		let request_id = extras
			.get(keys::REQUEST_ID)
			.and_then(Value::as_str)
			.filter(|id| !id.is_empty())
			.map(str::to_owned)
			.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

		Self {
			name: name.unwrap_or_else(|| DEFAULT_NAME.to_owned()),
			version: version.unwrap_or_else(|| DEFAULT_VERSION.to_owned()),
			timeout_seconds: timeout_seconds.or(timeout_alias).unwrap_or(DEFAULT_TIMEOUT_SECONDS),
			created_at: Local::now(),
			started: Instant::now(),
			request_id,
			extras,
			log_sink: None,
		}
	}

	/// Routes [`log`](Self::log) output to `sink`.
	#[must_use]
	pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
		self.log_sink = Some(sink);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn version(&self) -> &str {
		&self.version
	}

	pub fn timeout_seconds(&self) -> f64 {
		self.timeout_seconds
	}

	/// Wall-clock construction time.
	pub fn created_at(&self) -> DateTime<Local> {
		self.created_at
	}

	/// The full time budget.
	///
	/// Negative and NaN timeouts give a zero budget; budgets too large for a
	/// [`Duration`] saturate.
	pub fn budget(&self) -> Duration {
		let secs = self.timeout_seconds;
		if secs.is_nan() || secs <= 0.0 {
			return Duration::ZERO;
		}
		Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
	}

	/// Time left before the soft deadline, measured on the monotonic clock.
	pub fn remaining_time(&self) -> Duration {
		self.budget().saturating_sub(self.started.elapsed())
	}

	/// Milliseconds left before the soft deadline, floored at zero.
	pub fn remaining_time_in_millis(&self) -> u64 {
		u64::try_from(self.remaining_time().as_millis()).unwrap_or(u64::MAX)
	}

	/// Wall-clock deadline, or `None` when it cannot be represented.
	pub fn deadline(&self) -> Option<DateTime<Local>> {
		let budget = TimeDelta::from_std(self.budget()).ok()?;
		self.created_at.checked_add_signed(budget)
	}

	/// Wall-clock deadline as milliseconds since the Unix epoch.
	pub fn deadline_ms(&self) -> Option<i64> {
		self.deadline().map(|deadline| deadline.timestamp_millis())
	}

	pub fn function_name(&self) -> &str {
		&self.name
	}

	pub fn function_version(&self) -> &str {
		&self.version
	}

	/// Invocation identifier: the host's `awsRequestId` when it sent one,
	/// otherwise a UUID generated for this context.
	pub fn aws_request_id(&self) -> &str {
		&self.request_id
	}

	pub fn invoked_function_arn(&self) -> String {
		format!("{ARN_PREFIX}{}", self.name)
	}

	pub fn memory_limit_in_mb(&self) -> &'static str {
		MEMORY_LIMIT_IN_MB
	}

	pub fn log_group_name(&self) -> String {
		format!("{LOG_GROUP_PREFIX}{}", self.name)
	}

	/// `YYYY/MM/DD/[$<version>]<stream id>`, dated by the construction time.
	pub fn log_stream_name(&self) -> String {
		format!("{}/[${}]{LOG_STREAM_SUFFIX}", self.created_at.format("%Y/%m/%d"), self.version)
	}

	/// Raw extra property supplied by the host.
	pub fn extra(&self, key: &str) -> Option<&Value> {
		self.extras.get(key)
	}

	pub fn extras(&self) -> &Map<String, Value> {
		&self.extras
	}

	/// Looks up a property by its platform name.
	///
	/// Fixed and derived properties take precedence over extras with the same
	/// key; use [`extra`](Self::extra) to read the host's raw value.
	pub fn get(&self, key: &str) -> Option<Value> {
		let value = match key {
			keys::NAME | keys::FUNCTION_NAME => Value::from(self.name.as_str()),
			keys::VERSION | keys::FUNCTION_VERSION => Value::from(self.version.as_str()),
			keys::TIMEOUT_SECONDS | keys::TIMEOUT => Number::from_f64(self.timeout_seconds).map_or(Value::Null, Value::Number),
			keys::CREATED_AT => Value::from(self.created_at.timestamp_millis()),
			keys::REQUEST_ID => Value::from(self.request_id.as_str()),
			keys::INVOKED_FUNCTION_ARN => Value::from(self.invoked_function_arn()),
			keys::MEMORY_LIMIT_IN_MB => Value::from(MEMORY_LIMIT_IN_MB),
			keys::LOG_GROUP_NAME => Value::from(self.log_group_name()),
			keys::LOG_STREAM_NAME => Value::from(self.log_stream_name()),
			keys::REMAINING_TIME_IN_MILLIS => Value::from(self.remaining_time_in_millis()),
			keys::DEADLINE_MS => self.deadline_ms().map_or(Value::Null, Value::from),
			_ => return self.extras.get(key).cloned(),
		};
		Some(value)
	}

	/// Every property as one JSON object, extras first so that fixed and
	/// derived properties win on collisions.
	pub fn snapshot(&self) -> Map<String, Value> {
		let mut out = self.extras.clone();
		for key in keys::DERIVED {
			if let Some(value) = self.get(key) {
				out.insert((*key).to_owned(), value);
			}
		}
		out
	}

	/// Writes `message` line by line to the installed [`LogSink`], or to
	/// `tracing` when none is installed.
	pub fn log(&self, message: &str) {
		for line in message.lines() {
			match &self.log_sink {
				Some(sink) => sink.write_line(line),
				None => tracing::info!(target: "fnhost::handler", request_id = %self.request_id, "{line}"),
			}
		}
	}
}

impl Default for InvocationContext {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for InvocationContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InvocationContext")
			.field("name", &self.name)
			.field("version", &self.version)
			.field("timeout_seconds", &self.timeout_seconds)
			.field("created_at", &self.created_at)
			.field("request_id", &self.request_id)
			.field("extras", &self.extras)
			.finish_non_exhaustive()
	}
}

fn assign<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
	let accepted = value.is_some();
	if accepted {
		*slot = value;
	}
	accepted
}

/// Coerces a scalar override into a name/version label.
fn label(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}
