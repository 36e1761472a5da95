use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};

use super::*;

fn overrides(value: Value) -> Map<String, Value> {
	match value {
		Value::Object(map) => map,
		other => panic!("expected object, got {other}"),
	}
}

#[test]
fn defaults_without_overrides() {
	let ctx = InvocationContext::new();

	assert_eq!(ctx.name(), "Fake");
	assert_eq!(ctx.version(), "LATEST");
	assert_eq!(ctx.timeout_seconds(), 6.0);
	assert_eq!(ctx.function_name(), "Fake");
	assert_eq!(ctx.function_version(), "LATEST");
	assert_eq!(ctx.invoked_function_arn(), "arn:aws:lambda:serverless:Fake");
	assert_eq!(ctx.memory_limit_in_mb(), "1024");
	assert_eq!(ctx.log_group_name(), "/aws/lambda/Fake");
	assert!(ctx.extras().is_empty());
}

#[test]
fn derived_identifiers_are_non_empty() {
	let ctx = InvocationContext::new();

	for value in [
		ctx.aws_request_id().to_owned(),
		ctx.invoked_function_arn(),
		ctx.log_group_name(),
		ctx.log_stream_name(),
		ctx.memory_limit_in_mb().to_owned(),
	] {
		assert!(!value.is_empty());
	}
}

#[test]
fn log_stream_is_dated_and_versioned() {
	let ctx = InvocationContext::from_overrides(overrides(json!({ "version": "7" })));
	let stream = ctx.log_stream_name();
	let date = ctx.created_at().format("%Y/%m/%d").to_string();

	assert!(stream.starts_with(&format!("{date}/[$7]")), "unexpected stream name: {stream}");
}

#[test]
fn known_overrides_replace_defaults() {
	let ctx = InvocationContext::from_overrides(overrides(json!({
		"name": "orders-create",
		"version": "12",
		"timeoutSeconds": 30,
	})));

	assert_eq!(ctx.name(), "orders-create");
	assert_eq!(ctx.version(), "12");
	assert_eq!(ctx.timeout_seconds(), 30.0);
	assert_eq!(ctx.invoked_function_arn(), "arn:aws:lambda:serverless:orders-create");
	assert_eq!(ctx.log_group_name(), "/aws/lambda/orders-create");
}

#[test]
fn timeout_alias_is_accepted_but_loses_to_canonical_key() {
	let alias_only = InvocationContext::from_overrides(overrides(json!({ "timeout": 3 })));
	assert_eq!(alias_only.timeout_seconds(), 3.0);

	let both = InvocationContext::from_overrides(overrides(json!({ "timeout": 3, "timeoutSeconds": 9 })));
	assert_eq!(both.timeout_seconds(), 9.0);
}

#[test]
fn scalar_labels_are_stringified() {
	let ctx = InvocationContext::from_overrides(overrides(json!({ "name": 42, "version": true })));

	assert_eq!(ctx.name(), "42");
	assert_eq!(ctx.version(), "true");
}

#[test]
fn unusable_known_values_fall_back_and_are_kept_as_extras() {
	let ctx = InvocationContext::from_overrides(overrides(json!({
		"name": ["not", "a", "label"],
		"timeoutSeconds": "soon",
		"version": null,
	})));

	assert_eq!(ctx.name(), DEFAULT_NAME);
	assert_eq!(ctx.version(), DEFAULT_VERSION);
	assert_eq!(ctx.timeout_seconds(), DEFAULT_TIMEOUT_SECONDS);
	assert_eq!(ctx.extra("name"), Some(&json!(["not", "a", "label"])));
	assert_eq!(ctx.extra("timeoutSeconds"), Some(&json!("soon")));
	assert_eq!(ctx.extra("version"), None);
}

#[test]
fn unknown_keys_become_extras() {
	let ctx = InvocationContext::from_overrides(overrides(json!({
		"clientContext": { "app": "mobile" },
		"identity": null,
		"tenant": "acme",
	})));

	assert_eq!(ctx.get("tenant"), Some(json!("acme")));
	assert_eq!(ctx.get("clientContext"), Some(json!({ "app": "mobile" })));
	assert_eq!(ctx.get("identity"), Some(Value::Null));
	assert_eq!(ctx.get("missing"), None);
}

#[test]
fn host_request_id_is_used_verbatim() {
	let ctx = InvocationContext::from_overrides(overrides(json!({ "awsRequestId": "req-1" })));
	assert_eq!(ctx.aws_request_id(), "req-1");

	let generated = InvocationContext::from_overrides(overrides(json!({ "awsRequestId": "" })));
	assert!(!generated.aws_request_id().is_empty());
}

#[test]
fn generated_request_ids_differ_per_context() {
	let a = InvocationContext::new();
	let b = InvocationContext::new();
	assert_ne!(a.aws_request_id(), b.aws_request_id());
}

#[test]
fn fixed_properties_win_over_extras_in_lookup() {
	let ctx = InvocationContext::from_overrides(overrides(json!({
		"name": "billing",
		"functionName": "something-else",
	})));

	assert_eq!(ctx.get("functionName"), Some(json!("billing")));
	assert_eq!(ctx.extra("functionName"), Some(&json!("something-else")));
}

#[test]
fn lookup_covers_derived_properties() {
	let ctx = InvocationContext::from_overrides(overrides(json!({ "name": "svc", "timeoutSeconds": 2 })));

	assert_eq!(ctx.get("invokedFunctionArn"), Some(json!("arn:aws:lambda:serverless:svc")));
	assert_eq!(ctx.get("memoryLimitInMB"), Some(json!("1024")));
	assert_eq!(ctx.get("logGroupName"), Some(json!("/aws/lambda/svc")));
	assert_eq!(ctx.get("timeoutSeconds"), Some(json!(2.0)));

	let remaining = ctx.get("remainingTimeInMillis").and_then(|v| v.as_u64()).expect("numeric remaining time");
	assert!(remaining <= 2000);
}

#[test]
fn snapshot_contains_extras_and_derived_properties() {
	let ctx = InvocationContext::from_overrides(overrides(json!({ "tenant": "acme" })));
	let snapshot = ctx.snapshot();

	assert_eq!(snapshot.get("tenant"), Some(&json!("acme")));
	for key in keys::DERIVED {
		assert!(snapshot.contains_key(*key), "snapshot missing {key}");
	}
}

#[test]
fn remaining_time_counts_down_and_never_goes_negative() {
	let ctx = InvocationContext::from_overrides(overrides(json!({ "timeoutSeconds": 1 })));

	let first = ctx.remaining_time_in_millis();
	std::thread::sleep(Duration::from_millis(50));
	let second = ctx.remaining_time_in_millis();

	assert!(first <= 1000);
	assert!(second < first, "expected countdown: {first} then {second}");
}

#[test]
fn remaining_time_is_floored_at_zero() {
	let expired = InvocationContext::from_overrides(overrides(json!({ "timeoutSeconds": 0.01 })));
	std::thread::sleep(Duration::from_millis(30));
	assert_eq!(expired.remaining_time_in_millis(), 0);

	let negative = InvocationContext::from_overrides(overrides(json!({ "timeoutSeconds": -5 })));
	assert_eq!(negative.remaining_time_in_millis(), 0);
	assert_eq!(negative.budget(), Duration::ZERO);
}

#[test]
fn deadline_follows_budget() {
	let ctx = InvocationContext::from_overrides(overrides(json!({ "timeoutSeconds": 3 })));
	let deadline = ctx.deadline().expect("representable deadline");

	assert_eq!((deadline - ctx.created_at()).num_milliseconds(), 3000);
	assert_eq!(ctx.deadline_ms(), Some(deadline.timestamp_millis()));
}

#[derive(Default)]
struct Capture(Mutex<Vec<String>>);

impl LogSink for Capture {
	fn write_line(&self, line: &str) {
		self.0.lock().push(line.to_owned());
	}
}

#[test]
fn log_writes_each_line_to_sink() {
	let sink = Arc::new(Capture::default());
	let ctx = InvocationContext::new().with_log_sink(sink.clone());

	ctx.log("first\nsecond");
	ctx.log("third");

	assert_eq!(*sink.0.lock(), vec!["first", "second", "third"]);
}

#[test]
fn overrides_builder_produces_host_keys() {
	let map = ContextOverrides::for_function("orders", 512)
		.version("3")
		.timeout_seconds(10.0)
		.request_id("req-9")
		.insert("tenant", "acme")
		.into_map();

	let ctx = InvocationContext::from_overrides(map);

	assert_eq!(ctx.name(), "orders");
	assert_eq!(ctx.version(), "3");
	assert_eq!(ctx.timeout_seconds(), 10.0);
	assert_eq!(ctx.aws_request_id(), "req-9");
	assert_eq!(ctx.extra("memoryLimitInMB"), Some(&json!("512")));
	assert_eq!(ctx.get("memoryLimitInMB"), Some(json!("1024")));
	assert_eq!(ctx.snapshot()["memoryLimitInMB"], json!("1024"));
	assert_eq!(ctx.extra("tenant"), Some(&json!("acme")));
}

#[test]
fn overrides_builder_ignores_non_finite_timeouts() {
	let overrides = ContextOverrides::new().timeout_seconds(f64::NAN);
	assert_eq!(overrides.get(keys::TIMEOUT_SECONDS), None);
}
