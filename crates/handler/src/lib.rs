//! Handler abstraction and resolution for the function bridge.
//!
//! A bridge process serves exactly one handler, named on its command line by
//! a module path and a function name. Handlers are linked into the bridge
//! binary and registered with [`register_handler!`]; at startup the bridge
//! resolves the reference once through a [`HandlerRegistry`] and reuses the
//! resulting [`Handler`] for every invocation.
//!
//! ```ignore
//! use fnhost_handler::{HandlerError, register_handler};
//! use fnhost_context::InvocationContext;
//! use serde_json::{Value, json};
//!
//! fn create(event: Value, ctx: &InvocationContext) -> Result<Value, HandlerError> {
//!     Ok(json!({ "received": event, "by": ctx.function_name() }))
//! }
//!
//! register_handler!(create);
//! ```

mod error;
mod handler;
mod path;
mod registry;

pub use error::ResolutionError;
pub use handler::{FnHandler, Handler, HandlerError, InvokeError};
pub use path::ModulePath;
pub use registry::{HandlerEntry, HandlerReg, HandlerRegistry};

#[doc(hidden)]
pub mod __private {
	pub use {inventory, paste};
}

/// Registers a handler for link-time resolution.
///
/// The entry records the calling module (`module_path!()`) and the handler's
/// identifier, which is the function name the bridge is started with.
///
/// * `register_handler!(name)` registers a function
///   `fn(Value, &InvocationContext) -> Result<R, E>` (see [`FnHandler`]).
/// * `register_handler!(name = Type)` registers a stateful handler type
///   implementing [`Handler`] and [`Default`] under `name`. One instance is
///   created per bridge process.
#[macro_export]
macro_rules! register_handler {
	(@entry $name:ident, $factory:expr) => {
		$crate::__private::paste::paste! {
			#[allow(non_upper_case_globals)]
			static [<__FNHOST_HANDLER_ $name>]: $crate::HandlerEntry = $crate::HandlerEntry {
				module: module_path!(),
				function: stringify!($name),
				crate_name: env!("CARGO_PKG_NAME"),
				factory: $factory,
			};

			$crate::__private::inventory::submit!($crate::HandlerReg(&[<__FNHOST_HANDLER_ $name>]));
		}
	};
	($function:ident) => {
		$crate::register_handler!(@entry $function, {
			fn factory() -> ::std::boxed::Box<dyn $crate::Handler> {
				$crate::FnHandler::boxed($function)
			}
			factory
		});
	};
	($name:ident = $handler:ty) => {
		$crate::register_handler!(@entry $name, {
			fn factory() -> ::std::boxed::Box<dyn $crate::Handler> {
				::std::boxed::Box::new(<$handler as ::core::default::Default>::default())
			}
			factory
		});
	};
}

#[cfg(test)]
mod tests;
