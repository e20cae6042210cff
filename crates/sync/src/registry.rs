//! Stores that take part in replication, addressed by identity.

use std::sync::Arc;

use codeclib_codec::{Codec, Value};
use codeclib_primitives::Identifier;
use codeclib_store::{DataStore, Replaced};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::SyncError;

/// Type-erased view of a store for the sync layer.
pub trait SyncedStore: Send + Sync {
	fn store_id(&self) -> &Identifier;

	/// Encodes the whole current generation, sorted by key. `None` when the
	/// store has never been loaded.
	fn export(&self) -> Result<Option<Vec<(Identifier, Value)>>, SyncError>;

	/// Replaces the current generation wholesale. Any entry that fails to
	/// decode, or repeats an earlier key, rejects the import and leaves the
	/// store untouched.
	fn import(&self, entries: Vec<(Identifier, Value)>) -> Result<Replaced, SyncError>;
}

impl<T: Send + Sync + 'static> SyncedStore for DataStore<T> {
	fn store_id(&self) -> &Identifier {
		self.id()
	}

	fn export(&self) -> Result<Option<Vec<(Identifier, Value)>>, SyncError> {
		let Some(generation) = self.snapshot() else {
			return Ok(None);
		};
		let codec = self.network_codec();
		let mut entries = generation
			.iter()
			.map(|(key, value)| {
				codec
					.encode(value)
					.map(|encoded| (key.clone(), encoded))
					.map_err(|source| SyncError::Encode {
						key: key.clone(),
						source,
					})
			})
			.collect::<Result<Vec<_>, _>>()?;
		entries.sort_by(|a, b| a.0.cmp(&b.0));
		Ok(Some(entries))
	}

	fn import(&self, entries: Vec<(Identifier, Value)>) -> Result<Replaced, SyncError> {
		let codec = self.network_codec();
		let mut seen = FxHashSet::default();
		let decoded = entries
			.into_iter()
			.map(|(key, raw)| {
				if !seen.insert(key.clone()) {
					return Err(SyncError::MalformedEnvelope(format!("duplicate entry {key}")));
				}
				match codec.decode(&raw).and_then(|d| d.strict()) {
					Ok(value) => Ok((key, value)),
					Err(err) => Err(SyncError::MalformedEnvelope(format!("entry {key}: {err}"))),
				}
			})
			.collect::<Result<Vec<_>, _>>()?;
		Ok(self.replace_synced(self.generation_from_entries(decoded)))
	}
}

/// Explicit registry of synced stores.
#[derive(Default, Clone)]
pub struct StoreRegistry {
	inner: Arc<RwLock<FxHashMap<Identifier, Arc<dyn SyncedStore>>>>,
}

impl std::fmt::Debug for StoreRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StoreRegistry").field("stores", &self.ids()).finish()
	}
}

impl StoreRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a store under its own identity.
	pub fn register(&self, store: Arc<dyn SyncedStore>) -> Result<(), SyncError> {
		let id = store.store_id().clone();
		let mut guard = self.inner.write();
		if guard.contains_key(&id) {
			return Err(SyncError::DuplicateStore(id));
		}
		tracing::debug!(store = %id, "registered synced store");
		guard.insert(id, store);
		Ok(())
	}

	pub fn get(&self, id: &Identifier) -> Option<Arc<dyn SyncedStore>> {
		self.inner.read().get(id).cloned()
	}

	/// Registered identities, sorted.
	pub fn ids(&self) -> Vec<Identifier> {
		let mut ids: Vec<_> = self.inner.read().keys().cloned().collect();
		ids.sort();
		ids
	}

	pub fn len(&self) -> usize {
		self.inner.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.read().is_empty()
	}
}
