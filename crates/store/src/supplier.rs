//! Sources of raw documents for a reload.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use codeclib_primitives::Identifier;
use ignore::WalkBuilder;

use crate::SupplierError;

/// Raw documents keyed by identifier, ready for decoding.
pub type Documents = BTreeMap<Identifier, serde_json::Value>;

/// What one folder yielded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collected {
	pub documents: Documents,
	/// Files that were found and named but could not be read or parsed.
	pub unreadable: Vec<(Identifier, String)>,
}

impl From<Documents> for Collected {
	fn from(documents: Documents) -> Self {
		Self {
			documents,
			unreadable: Vec::new(),
		}
	}
}

/// Produces every document in one resource folder.
pub trait ResourceSupplier: Send + Sync {
	fn collect(&self, folder: &str) -> Result<Collected, SupplierError>;
}

/// Reads `<root>/data/<namespace>/<folder>/**/*.json`.
///
/// A file at `data/arcana/spells/fire/bolt.json` becomes `arcana:fire/bolt`.
/// Files that cannot be read or parsed are logged and reported in
/// [`Collected::unreadable`]. Files that cannot be named are logged and
/// skipped.
#[derive(Debug, Clone)]
pub struct DirectorySupplier {
	root: PathBuf,
}

impl DirectorySupplier {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn namespaces(&self) -> Result<Vec<(String, PathBuf)>, SupplierError> {
		let data = self.root.join("data");
		let read = match std::fs::read_dir(&data) {
			Ok(read) => read,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound && self.root.is_dir() => return Ok(Vec::new()),
			Err(source) => return Err(SupplierError::Io { path: data, source }),
		};

		let mut namespaces = Vec::new();
		for entry in read {
			let entry = entry.map_err(|source| SupplierError::Io {
				path: data.clone(),
				source,
			})?;
			if !entry.file_type().is_ok_and(|t| t.is_dir()) {
				continue;
			}
			match entry.file_name().into_string() {
				Ok(name) => namespaces.push((name, entry.path())),
				Err(name) => tracing::warn!(?name, "skipping non UTF-8 namespace directory"),
			}
		}
		namespaces.sort();
		Ok(namespaces)
	}
}

impl ResourceSupplier for DirectorySupplier {
	fn collect(&self, folder: &str) -> Result<Collected, SupplierError> {
		let mut collected = Collected::default();

		for (namespace, ns_dir) in self.namespaces()? {
			let base = ns_dir.join(folder);
			if !base.is_dir() {
				continue;
			}

			let walker = WalkBuilder::new(&base)
				.standard_filters(false)
				.follow_links(false)
				.sort_by_file_name(|a, b| a.cmp(b))
				.build();

			for entry in walker {
				let entry = match entry {
					Ok(entry) => entry,
					Err(err) => {
						tracing::warn!(error = %err, "resource walk entry error");
						continue;
					}
				};
				if !entry.file_type().is_some_and(|t| t.is_file()) {
					continue;
				}

				let path = entry.into_path();
				if path.extension().is_none_or(|ext| ext != "json") {
					continue;
				}

				let Some(id) = identifier_for(&namespace, &base, &path) else {
					tracing::error!(path = %path.display(), "resource path is not a valid identifier");
					continue;
				};

				let text = match std::fs::read_to_string(&path) {
					Ok(text) => text,
					Err(err) => {
						tracing::error!(error = %err, key = %id, path = %path.display(), "failed to read data file");
						collected.unreadable.push((id, format!("unreadable file: {err}")));
						continue;
					}
				};
				match serde_json::from_str(&text) {
					Ok(doc) => {
						collected.documents.insert(id, doc);
					}
					Err(err) => {
						tracing::error!(error = %err, key = %id, path = %path.display(), "failed to parse data file");
						collected.unreadable.push((id, format!("invalid JSON: {err}")));
					}
				}
			}
		}

		Ok(collected)
	}
}

fn identifier_for(namespace: &str, base: &Path, path: &Path) -> Option<Identifier> {
	let relative = path.strip_prefix(base).ok()?.with_extension("");
	let mut segments = Vec::new();
	for component in relative.components() {
		segments.push(component.as_os_str().to_str()?);
	}
	Identifier::new(namespace, segments.join("/")).ok()
}

/// In-memory documents grouped by folder.
#[derive(Debug, Clone, Default)]
pub struct MemorySupplier {
	folders: BTreeMap<String, Documents>,
}

impl MemorySupplier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, folder: impl Into<String>, id: Identifier, document: serde_json::Value) -> &mut Self {
		self.folders.entry(folder.into()).or_default().insert(id, document);
		self
	}

	pub fn with(mut self, folder: impl Into<String>, id: Identifier, document: serde_json::Value) -> Self {
		self.insert(folder, id, document);
		self
	}
}

impl ResourceSupplier for MemorySupplier {
	fn collect(&self, folder: &str) -> Result<Collected, SupplierError> {
		Ok(self.folders.get(folder).cloned().unwrap_or_default().into())
	}
}
