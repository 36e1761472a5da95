//! Handler registration via `inventory`.
//!
//! Each [`register_handler!`](crate::register_handler) call defines a static
//! [`HandlerEntry`] and submits it through `inventory::submit!`. The bridge
//! collects every linked entry into a [`HandlerRegistry`] at startup and
//! resolves its command line reference against it.

use std::collections::BTreeSet;

use crate::{Handler, ModulePath, ResolutionError};

/// Static handler registration entry collected via `inventory`.
pub struct HandlerEntry {
	/// Output of `module_path!()` at the registration site.
	pub module: &'static str,
	/// Name the handler is resolved by.
	pub function: &'static str,
	/// Crate that defined this handler.
	pub crate_name: &'static str,
	/// Creates the process-wide handler instance.
	pub factory: fn() -> Box<dyn Handler>,
}

/// Wrapper for `inventory::collect!`.
pub struct HandlerReg(pub &'static HandlerEntry);

inventory::collect!(HandlerReg);

struct Registered {
	path: ModulePath,
	module: String,
	function: String,
	factory: fn() -> Box<dyn Handler>,
}

/// Set of handlers a bridge can be started with.
#[derive(Default)]
pub struct HandlerRegistry {
	entries: Vec<Registered>,
}

impl HandlerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Collects every handler linked into the current binary.
	pub fn linked() -> Self {
		let mut registry = Self::new();
		for reg in inventory::iter::<HandlerReg> {
			let entry = reg.0;
			tracing::trace!(module = entry.module, function = entry.function, krate = entry.crate_name, "linked handler");
			registry.register(entry.module, entry.function, entry.factory);
		}
		tracing::debug!(count = registry.len(), "collected linked handlers");
		registry
	}

	/// Registers a handler under a full module path. A later registration
	/// with the same module and function replaces the earlier one.
	pub fn register(&mut self, module: &str, function: &str, factory: fn() -> Box<dyn Handler>) -> &mut Self {
		let path = ModulePath::from_module_path(module);
		let module = path.to_string();
		self.entries.retain(|e| !(e.module == module && e.function == function));
		self.entries.push(Registered {
			path,
			module,
			function: function.to_owned(),
			factory,
		});
		self
	}

	/// Resolves a module reference and function name to a fresh handler
	/// instance.
	pub fn resolve(&self, module: &str, function: &str) -> Result<Box<dyn Handler>, ResolutionError> {
		let wanted = ModulePath::parse(module).ok_or_else(|| ResolutionError::ModuleNotFound {
			module: module.to_owned(),
			known: self.modules(),
		})?;

		let in_module: Vec<&Registered> = self.entries.iter().filter(|e| wanted.matches(&e.path)).collect();
		if in_module.is_empty() {
			return Err(ResolutionError::ModuleNotFound {
				module: module.to_owned(),
				known: self.modules(),
			});
		}

		let found: Vec<&Registered> = in_module.iter().copied().filter(|e| e.function == function).collect();
		match found.as_slice() {
			[] => Err(ResolutionError::FunctionNotFound {
				module: module.to_owned(),
				function: function.to_owned(),
				available: in_module
					.iter()
					.map(|e| e.function.clone())
					.collect::<BTreeSet<_>>()
					.into_iter()
					.collect(),
			}),
			[entry] => {
				tracing::debug!(module = %entry.module, function = %entry.function, "resolved handler");
				Ok((entry.factory)())
			}
			many => Err(ResolutionError::Ambiguous {
				module: module.to_owned(),
				function: function.to_owned(),
				candidates: many.iter().map(|e| format!("{}::{}", e.module, e.function)).collect(),
			}),
		}
	}

	/// Registered module paths, sorted and deduplicated.
	pub fn modules(&self) -> Vec<String> {
		self.entries.iter().map(|e| e.module.clone()).collect::<BTreeSet<_>>().into_iter().collect()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl std::fmt::Debug for HandlerRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list()
			.entries(self.entries.iter().map(|e| format!("{}::{}", e.module, e.function)))
			.finish()
	}
}
