use fnhost_context::InvocationContext;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use super::*;

fn echo(event: Value, _ctx: &InvocationContext) -> Result<Value, HandlerError> {
	Ok(json!({ "echo": event }))
}

fn nothing(_event: Value, _ctx: &InvocationContext) -> Result<(), HandlerError> {
	Ok(())
}

fn fails(_event: Value, _ctx: &InvocationContext) -> Result<Value, std::io::Error> {
	Err(std::io::Error::other("disk on fire"))
}

#[derive(Default)]
struct Counter {
	count: u64,
}

impl Handler for Counter {
	fn invoke(&mut self, _event: Value, _context: &InvocationContext) -> Result<Value, InvokeError> {
		self.count += 1;
		Ok(json!(self.count))
	}
}

crate::register_handler!(echo);
crate::register_handler!(counter = Counter);

fn registry() -> HandlerRegistry {
	let mut registry = HandlerRegistry::new();
	registry
		.register("svc::handlers::users", "echo", || FnHandler::boxed(echo))
		.register("svc::handlers::users", "nothing", || FnHandler::boxed(nothing))
		.register("svc::handlers::users", "fails", || FnHandler::boxed(fails))
		.register("svc", "root", || FnHandler::boxed(echo))
		.register("svc::counter", "counter", || Box::new(Counter::default()) as Box<dyn Handler>);
	registry
}

#[test]
fn module_paths_normalise_file_references() {
	let expected = ["handlers", "users"];
	for raw in [
		"handlers/users",
		"./handlers/users.rs",
		"./src/handlers/users.rs",
		"src\\handlers\\users.rs",
		"handlers.users",
		"handlers::users",
		"crate::handlers::users",
		"handlers/users/mod.rs",
		"crates/svc/src/handlers/users.rs",
	] {
		let path = ModulePath::parse(raw).unwrap();
		assert_eq!(path.segments(), expected, "{raw:?}");
	}
}

#[test]
fn module_paths_map_dashes_and_crate_roots() {
	assert_eq!(ModulePath::parse("my-service/handlers").unwrap().to_string(), "my_service::handlers");
	assert!(ModulePath::parse("src/main.rs").unwrap().is_crate_root());
	assert!(ModulePath::parse("./src/lib.rs").unwrap().is_crate_root());
	assert!(ModulePath::parse("   ").is_none());
}

#[test]
fn crate_segment_is_optional_when_matching() {
	let registered = ModulePath::from_module_path("svc::handlers::users");

	assert!(ModulePath::parse("svc::handlers::users").unwrap().matches(&registered));
	assert!(ModulePath::parse("handlers/users.rs").unwrap().matches(&registered));
	assert!(!ModulePath::parse("users").unwrap().matches(&registered));
	assert!(!ModulePath::parse("handlers").unwrap().matches(&registered));
}

#[test]
fn resolves_and_invokes_function_handlers() {
	let registry = registry();
	let ctx = InvocationContext::new();

	let mut handler = registry.resolve("./src/handlers/users.rs", "echo").unwrap();
	assert_eq!(handler.invoke(json!({ "a": 1 }), &ctx).unwrap(), json!({ "echo": { "a": 1 } }));

	let mut root = registry.resolve("src/main.rs", "root").unwrap();
	assert_eq!(root.invoke(json!(2), &ctx).unwrap(), json!({ "echo": 2 }));
}

#[test]
fn unit_results_become_null() {
	let mut handler = registry().resolve("handlers/users", "nothing").unwrap();
	assert_eq!(handler.invoke(json!("x"), &InvocationContext::new()).unwrap(), Value::Null);
}

#[test]
fn handler_errors_keep_their_type_name() {
	let mut handler = registry().resolve("handlers/users", "fails").unwrap();
	let err = handler.invoke(Value::Null, &InvocationContext::new()).unwrap_err();

	let InvokeError::Failed(err) = err else {
		panic!("expected a handler failure, got {err:?}");
	};
	assert_eq!(err.error_type(), "Error");
	assert_eq!(err.message(), "disk on fire");
	assert_eq!(err.to_string(), "Error: disk on fire");
}

#[test]
fn unserializable_results_are_reported() {
	let mut handler = FnHandler::boxed(|_event: Value, _ctx: &InvocationContext| -> Result<_, HandlerError> {
		Ok(std::collections::HashMap::from([((1, 2), "tuple key")]))
	});
	let outcome = handler.invoke(Value::Null, &InvocationContext::new());
	assert!(matches!(outcome, Err(InvokeError::Unserializable(_))));
}

#[test]
fn stateful_handler_instance_is_reused() {
	let mut handler = registry().resolve("counter", "counter").unwrap();
	let ctx = InvocationContext::new();

	let counts: Vec<Value> = (0..3).map(|_| handler.invoke(Value::Null, &ctx).unwrap()).collect();
	assert_eq!(counts, [json!(1), json!(2), json!(3)]);
}

#[test]
fn missing_module_lists_known_modules() {
	let err = registry().resolve("handlers/orders", "echo").err().unwrap();
	assert_eq!(
		err,
		ResolutionError::ModuleNotFound {
			module: "handlers/orders".into(),
			known: vec!["svc".into(), "svc::counter".into(), "svc::handlers::users".into()],
		}
	);
}

#[test]
fn missing_function_lists_available_functions() {
	let err = registry().resolve("handlers/users", "delete").err().unwrap();
	assert_eq!(
		err,
		ResolutionError::FunctionNotFound {
			module: "handlers/users".into(),
			function: "delete".into(),
			available: vec!["echo".into(), "fails".into(), "nothing".into()],
		}
	);
	assert!(err.to_string().contains("available: echo, fails, nothing"));
}

#[test]
fn same_reference_in_two_crates_is_ambiguous() {
	let mut registry = registry();
	registry.register("other::handlers::users", "echo", || FnHandler::boxed(echo));

	let err = registry.resolve("handlers/users", "echo").err().unwrap();
	assert!(matches!(err, ResolutionError::Ambiguous { ref candidates, .. } if candidates.len() == 2));

	assert!(registry.resolve("other::handlers::users", "echo").is_ok());
}

#[test]
fn reregistering_replaces_the_entry() {
	let mut registry = registry();
	let before = registry.len();
	registry.register("svc::handlers::users", "echo", || FnHandler::boxed(nothing));

	assert_eq!(registry.len(), before);
	let mut handler = registry.resolve("handlers/users", "echo").unwrap();
	assert_eq!(handler.invoke(json!(1), &InvocationContext::new()).unwrap(), Value::Null);
}

#[test]
fn macro_registrations_are_linked() {
	let registry = HandlerRegistry::linked();
	let ctx = InvocationContext::new();

	let mut echo = registry.resolve("tests", "echo").unwrap();
	assert_eq!(echo.invoke(json!("hi"), &ctx).unwrap(), json!({ "echo": "hi" }));

	let mut counter = registry.resolve("fnhost_handler::tests", "counter").unwrap();
	assert_eq!(counter.invoke(Value::Null, &ctx).unwrap(), json!(1));
	assert_eq!(counter.invoke(Value::Null, &ctx).unwrap(), json!(2));
}

fn explode(n: u8) {
	panic!("boom {n}");
}

fn explode_with_code() {
	std::panic::panic_any(42_u8);
}

#[test]
fn panic_payloads_become_messages() {
	let payload = std::panic::catch_unwind(|| explode(7)).unwrap_err();
	let err = HandlerError::panicked(payload.as_ref());
	assert_eq!(err.error_type(), "Panic");
	assert_eq!(err.message(), "boom 7");

	let payload = std::panic::catch_unwind(explode_with_code).unwrap_err();
	assert_eq!(HandlerError::panicked(payload.as_ref()).message(), "handler panicked");
}

#[test]
fn error_conversions() {
	assert_eq!(HandlerError::from("bad").to_string(), "Error: bad");
	assert_eq!(HandlerError::from(anyhow::anyhow!("inner").context("outer")).message(), "outer: inner");
	assert_eq!(HandlerError::from_display(&std::fmt::Error).error_type(), "Error");
	assert_eq!(HandlerError::with_type("ValueError", "nope").error_type(), "ValueError");
}
