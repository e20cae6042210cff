use std::path::PathBuf;

use codeclib_primitives::Identifier;

/// Errors from store lookups and reloads.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("store {store} has not been loaded")]
	NotLoaded { store: Identifier },
	#[error("store {store} has no entry {key}")]
	NotFound { store: Identifier, key: Identifier },
	#[error(transparent)]
	Supplier(#[from] SupplierError),
}

/// Errors raised while collecting raw documents.
#[derive(Debug, thiserror::Error)]
pub enum SupplierError {
	#[error("failed to read {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Errors loading a store config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("invalid config: {0}")]
	Toml(#[from] toml::de::Error),
}
