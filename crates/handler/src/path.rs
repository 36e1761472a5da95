use std::fmt;

/// A handler module reference, normalised to Rust module addressing.
///
/// Accepts file-like references (`./src/handlers/users.rs`,
/// `handlers\users`, `handlers.users`) as well as module paths
/// (`my_service::handlers::users`). A crate's `src` directory, the `.rs`
/// extension and trailing `mod`, `lib` or `main` segments are dropped, and
/// `-` becomes `_`. An empty segment list addresses the crate root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModulePath {
	segments: Vec<String>,
}

impl ModulePath {
	/// Parses a reference. Returns `None` for blank input.
	pub fn parse(raw: &str) -> Option<Self> {
		let mut rest = raw.trim();
		if rest.is_empty() {
			return None;
		}
		while let Some(stripped) = rest.strip_prefix("./").or_else(|| rest.strip_prefix(".\\")) {
			rest = stripped;
		}
		let rest = rest.strip_suffix(".rs").unwrap_or(rest);

		let mut segments: Vec<String> = rest
			.split(['/', '\\', '.', ':'])
			.filter(|s| !s.is_empty())
			.map(|s| s.replace('-', "_"))
			.collect();

		if let Some(src) = segments.iter().rposition(|s| s == "src") {
			segments.drain(..=src);
		} else if segments.first().is_some_and(|s| s == "crate") {
			segments.remove(0);
		}
		while segments.last().is_some_and(|s| matches!(s.as_str(), "mod" | "lib" | "main")) {
			segments.pop();
		}

		Some(Self { segments })
	}

	/// Builds a path from the output of `module_path!()`.
	pub fn from_module_path(path: &str) -> Self {
		Self {
			segments: path.split("::").filter(|s| !s.is_empty()).map(str::to_owned).collect(),
		}
	}

	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	pub fn is_crate_root(&self) -> bool {
		self.segments.is_empty()
	}

	/// Whether this reference addresses `registered`, a full module path
	/// whose first segment is the crate name. The crate segment may be
	/// omitted from the reference.
	pub fn matches(&self, registered: &ModulePath) -> bool {
		self.segments == registered.segments || registered.segments.get(1..).is_some_and(|tail| tail == self.segments.as_slice())
	}
}

impl fmt::Display for ModulePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.segments.is_empty() {
			return f.write_str("crate");
		}
		f.write_str(&self.segments.join("::"))
	}
}
