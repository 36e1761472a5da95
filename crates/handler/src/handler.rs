use std::fmt;

use fnhost_context::InvocationContext;
use serde::Serialize;
use serde_json::Value;

/// A resolved handler.
///
/// One instance lives for the whole bridge process and sees every invocation
/// in order, so it may keep state between calls.
pub trait Handler: Send {
	fn invoke(&mut self, event: Value, context: &InvocationContext) -> Result<Value, InvokeError>;
}

/// Error raised by handler code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error_type}: {message}")]
pub struct HandlerError {
	error_type: String,
	message: String,
}

impl HandlerError {
	pub fn new(message: impl Into<String>) -> Self {
		Self::with_type("Error", message)
	}

	pub fn with_type(error_type: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			error_type: error_type.into(),
			message: message.into(),
		}
	}

	/// Wraps any displayable error, naming it after its type.
	pub fn from_display<E: fmt::Display + ?Sized>(error: &E) -> Self {
		Self::with_type(short_type_name::<E>(), error.to_string())
	}

	/// Describes a caught panic from its payload.
	pub fn panicked(payload: &(dyn std::any::Any + Send)) -> Self {
		let message = payload
			.downcast_ref::<&str>()
			.map(|s| (*s).to_owned())
			.or_else(|| payload.downcast_ref::<String>().cloned())
			.unwrap_or_else(|| "handler panicked".to_owned());
		Self::with_type("Panic", message)
	}

	pub fn error_type(&self) -> &str {
		&self.error_type
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

fn short_type_name<T: ?Sized>() -> String {
	let full = std::any::type_name::<T>();
	let base = full.split('<').next().unwrap_or(full);
	base.rsplit("::").next().unwrap_or(base).to_owned()
}

impl From<String> for HandlerError {
	fn from(message: String) -> Self {
		Self::new(message)
	}
}

impl From<&str> for HandlerError {
	fn from(message: &str) -> Self {
		Self::new(message)
	}
}

impl From<anyhow::Error> for HandlerError {
	fn from(error: anyhow::Error) -> Self {
		Self::new(format!("{error:#}"))
	}
}

impl From<Box<dyn std::error::Error + Send + Sync>> for HandlerError {
	fn from(error: Box<dyn std::error::Error + Send + Sync>) -> Self {
		Self::new(error.to_string())
	}
}

impl From<std::io::Error> for HandlerError {
	fn from(error: std::io::Error) -> Self {
		Self::from_display(&error)
	}
}

impl From<serde_json::Error> for HandlerError {
	fn from(error: serde_json::Error) -> Self {
		Self::from_display(&error)
	}
}

/// Why a single invocation produced no result.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
	#[error("handler failed: {0}")]
	Failed(#[from] HandlerError),
	#[error("handler result is not serializable: {0}")]
	Unserializable(#[source] serde_json::Error),
}

/// Adapts a plain function or closure into a [`Handler`].
///
/// The return value is converted with [`serde_json::to_value`]; `()` and
/// `None` become `null`.
pub struct FnHandler<F> {
	function: F,
}

impl<F> FnHandler<F> {
	pub fn new(function: F) -> Self {
		Self { function }
	}
}

impl<F: Send + 'static> FnHandler<F> {
	pub fn boxed<R, E>(function: F) -> Box<dyn Handler>
	where
		F: FnMut(Value, &InvocationContext) -> Result<R, E>,
		R: Serialize,
		E: Into<HandlerError>,
	{
		Box::new(Self::new(function))
	}
}

impl<F, R, E> Handler for FnHandler<F>
where
	F: FnMut(Value, &InvocationContext) -> Result<R, E> + Send,
	R: Serialize,
	E: Into<HandlerError>,
{
	fn invoke(&mut self, event: Value, context: &InvocationContext) -> Result<Value, InvokeError> {
		let result = (self.function)(event, context).map_err(|e| InvokeError::Failed(e.into()))?;
		serde_json::to_value(result).map_err(InvokeError::Unserializable)
	}
}

impl<F> fmt::Debug for FnHandler<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FnHandler").field("function", &std::any::type_name::<F>()).finish()
	}
}
