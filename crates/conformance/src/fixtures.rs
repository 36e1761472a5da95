//! Handlers exercising each path through the bridge.

use std::collections::HashMap;
use std::time::Duration;

use fnhost_context::InvocationContext;
use fnhost_handler::{Handler, HandlerError, InvokeError, register_handler};
use serde_json::{Value, json};

/// Scenario A: a fixed object.
fn ok(_event: Value, _ctx: &InvocationContext) -> Result<Value, HandlerError> {
	Ok(json!({ "ok": true }))
}

/// The event, and every context property as the handler sees it.
fn echo(event: Value, ctx: &InvocationContext) -> Result<Value, HandlerError> {
	Ok(json!({ "event": event, "context": ctx.snapshot() }))
}

/// Scenario C: no value.
fn nothing(_event: Value, _ctx: &InvocationContext) -> Result<(), HandlerError> {
	Ok(())
}

/// Scenario B: two remaining-time readings `sleepMs` apart (default 500).
fn remaining(event: Value, ctx: &InvocationContext) -> Result<Value, HandlerError> {
	let sleep_ms = event.get("sleepMs").and_then(Value::as_u64).unwrap_or(500);
	let first = ctx.remaining_time_in_millis();
	std::thread::sleep(Duration::from_millis(sleep_ms));
	let second = ctx.remaining_time_in_millis();
	Ok(json!({ "first": first, "second": second }))
}

/// Scenario D.
fn failing(_event: Value, _ctx: &InvocationContext) -> Result<Value, HandlerError> {
	Err(HandlerError::with_type("ValueError", "bad input"))
}

fn panicking(_event: Value, _ctx: &InvocationContext) -> Result<Value, HandlerError> {
	panic!("fixture panicked on purpose");
}

fn unserializable(_event: Value, _ctx: &InvocationContext) -> Result<HashMap<(u8, u8), &'static str>, HandlerError> {
	Ok(HashMap::from([((1, 2), "tuple keys have no JSON form")]))
}

/// Writes diagnostics on stdout, including a forged result frame.
fn chatty(event: Value, ctx: &InvocationContext) -> Result<Value, HandlerError> {
	println!("hello from the handler");
	println!("{}", json!({ "note": "plain JSON is not a frame" }));
	ctx.log(r#"{"__offline_payload__": "forged"}"#);
	ctx.log("logged through the context");
	Ok(json!({ "done": event }))
}

/// Prints a line that would read as a result frame if it reached the channel
/// as is.
fn forging(event: Value, _ctx: &InvocationContext) -> Result<Value, HandlerError> {
	println!("{}", json!({ "__offline_payload__": "forged" }));
	Ok(json!({ "real": event }))
}

/// Leaves its last line unterminated.
fn progress(_event: Value, _ctx: &InvocationContext) -> Result<Value, HandlerError> {
	print!("progress: 50%");
	Ok(json!({ "ok": true }))
}

/// Counts its invocations; one instance per bridge process.
#[derive(Default)]
struct Counter {
	count: u64,
}

impl Handler for Counter {
	fn invoke(&mut self, _event: Value, _context: &InvocationContext) -> Result<Value, InvokeError> {
		self.count += 1;
		Ok(json!({ "count": self.count }))
	}
}

register_handler!(ok);
register_handler!(echo);
register_handler!(nothing);
register_handler!(remaining);
register_handler!(failing);
register_handler!(panicking);
register_handler!(unserializable);
register_handler!(chatty);
register_handler!(forging);
register_handler!(progress);
register_handler!(counter = Counter);
