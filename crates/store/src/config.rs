//! Per-store settings, loadable from TOML.

use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

/// What a reload does when the validator rejects the candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionPolicy {
	/// Readers keep seeing the previous generation.
	#[default]
	KeepPrevious,
	/// Publish the decoded documents without the validator's changes.
	PublishAnyway,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
	/// Resource folder the store loads from, e.g. `spells`.
	pub folder: String,
	#[serde(default)]
	pub on_rejection: RejectionPolicy,
}

impl StoreConfig {
	pub fn new(folder: impl Into<String>) -> Self {
		Self {
			folder: folder.into(),
			on_rejection: RejectionPolicy::default(),
		}
	}

	pub fn with_rejection(mut self, policy: RejectionPolicy) -> Self {
		self.on_rejection = policy;
		self
	}

	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&input)
	}
}
