//! Emulated invocation context for locally hosted function handlers.
//!
//! A handler running behind the bridge receives an [`InvocationContext`] for
//! every call. It mirrors the capability set a hosted function platform hands
//! to user code: a remaining-time countdown, identifiers, naming derived from
//! the function name and version, and an open table of extra properties the
//! host may attach.
//!
//! * [`InvocationContext`]: per-call context built from request overrides.
//! * [`ContextOverrides`]: host-side builder for the override mapping.
//! * [`LogSink`]: destination for [`InvocationContext::log`] output.

mod context;
mod overrides;
mod sink;

pub use context::{
	ARN_PREFIX, DEFAULT_NAME, DEFAULT_TIMEOUT_SECONDS, DEFAULT_VERSION, InvocationContext, LOG_GROUP_PREFIX, MEMORY_LIMIT_IN_MB,
};
pub use overrides::{ContextOverrides, keys};
pub use serde_json::{Map, Value};
pub use sink::LogSink;

#[cfg(test)]
mod tests;
