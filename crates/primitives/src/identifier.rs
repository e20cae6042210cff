use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Namespace assumed when a string identifier has no `:` separator.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Reasons an identifier string can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
	#[error("empty namespace in identifier {0:?}")]
	EmptyNamespace(String),
	#[error("empty path in identifier {0:?}")]
	EmptyPath(String),
	#[error("invalid character {ch:?} in namespace of identifier {input:?}")]
	InvalidNamespace { input: String, ch: char },
	#[error("invalid character {ch:?} in path of identifier {input:?}")]
	InvalidPath { input: String, ch: char },
}

/// A namespaced key written as `namespace:path`.
///
/// Identifiers order by namespace first, then path. Once constructed they are
/// immutable; [`Identifier::with_path`] builds a sibling rather than editing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier {
	namespace: String,
	path: String,
}

impl Identifier {
	/// Builds an identifier from its two halves, validating both.
	pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Result<Self, IdentifierError> {
		let namespace = namespace.into();
		let path = path.into();
		let display = || format!("{namespace}:{path}");
		if namespace.is_empty() {
			return Err(IdentifierError::EmptyNamespace(display()));
		}
		if path.is_empty() {
			return Err(IdentifierError::EmptyPath(display()));
		}
		if let Some(ch) = namespace.chars().find(|&c| !is_namespace_char(c)) {
			return Err(IdentifierError::InvalidNamespace { input: display(), ch });
		}
		if let Some(ch) = path.chars().find(|&c| !is_path_char(c)) {
			return Err(IdentifierError::InvalidPath { input: display(), ch });
		}
		Ok(Self { namespace, path })
	}

	/// Parses `namespace:path`, or a bare `path` in [`DEFAULT_NAMESPACE`].
	pub fn parse(input: &str) -> Result<Self, IdentifierError> {
		match input.split_once(':') {
			Some((namespace, path)) => Self::new(namespace, path),
			None => Self::new(DEFAULT_NAMESPACE, input),
		}
	}

	/// Returns an identifier in the same namespace with a different path.
	pub fn with_path(&self, path: impl Into<String>) -> Result<Self, IdentifierError> {
		Self::new(self.namespace.clone(), path)
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub fn path(&self) -> &str {
		&self.path
	}
}

fn is_namespace_char(c: char) -> bool {
	matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

fn is_path_char(c: char) -> bool {
	is_namespace_char(c) || c == '/'
}

impl fmt::Display for Identifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.namespace, self.path)
	}
}

impl FromStr for Identifier {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl TryFrom<&str> for Identifier {
	type Error = IdentifierError;

	fn try_from(value: &str) -> Result<Self, Self::Error> {
		Self::parse(value)
	}
}

impl Serialize for Identifier {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for Identifier {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		Self::parse(&raw).map_err(serde::de::Error::custom)
	}
}
