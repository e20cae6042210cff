//! Reloadable store container with atomic publication.
//!
//! # Role
//!
//! [`DataStore`] runs the decode, validate, publish pipeline and serves
//! lock-free reads from whichever generation is currently published.
//!
//! # Invariants
//!
//! - Readers never observe a partially built generation.
//! - A rejected reload under [`RejectionPolicy::KeepPrevious`] leaves the
//!   published generation untouched.
//! - Reloads and synced replacements are serialized by one mutex; reads never
//!   take it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use codeclib_codec::{BoxCodec, Codec, DecodeError, Value};
use codeclib_primitives::Identifier;
use parking_lot::Mutex;

use crate::supplier::{Collected, Documents};
use crate::{
	AcceptAll, Candidate, Generation, RejectionPolicy, ResourceSupplier, StoreConfig, StoreError,
	ValidationError, Validator,
};

/// Lifecycle of a store as seen by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
	Unloaded,
	/// A reload is running; reads still see the previous generation, if any.
	Loading,
	Loaded { revision: u64 },
}

/// Result of [`DataStore::replace_synced`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replaced {
	/// The incoming generation was already published.
	Unchanged,
	Replaced { revision: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReloadOutcome {
	Published { revision: u64 },
	Rejected(ValidationError),
}

/// Summary of one reload.
#[derive(Debug, Clone, PartialEq)]
pub struct ReloadReport {
	/// Documents that decoded cleanly.
	pub loaded: usize,
	/// Documents left out, with the reason each one failed.
	pub failures: Vec<(Identifier, DecodeError)>,
	pub outcome: ReloadOutcome,
}

impl ReloadReport {
	pub fn is_published(&self) -> bool {
		matches!(self.outcome, ReloadOutcome::Published { .. })
	}
}

/// A reloadable `Identifier -> T` store.
pub struct DataStore<T> {
	id: Identifier,
	config: StoreConfig,
	codec: BoxCodec<T>,
	network_codec: BoxCodec<T>,
	validator: Box<dyn Validator<T>>,
	current: ArcSwapOption<Generation<T>>,
	revisions: AtomicU64,
	loading: AtomicBool,
	reload_lock: Mutex<()>,
}

impl<T: Send + Sync + 'static> std::fmt::Debug for DataStore<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DataStore")
			.field("id", &self.id)
			.field("config", &self.config)
			.field("state", &self.state())
			.finish_non_exhaustive()
	}
}

impl<T: Send + Sync + 'static> DataStore<T> {
	pub fn builder(id: Identifier, folder: impl Into<String>, codec: BoxCodec<T>) -> DataStoreBuilder<T> {
		DataStoreBuilder {
			id,
			config: StoreConfig::new(folder),
			codec,
			network_codec: None,
			validator: Box::new(AcceptAll),
		}
	}

	pub fn id(&self) -> &Identifier {
		&self.id
	}

	pub fn config(&self) -> &StoreConfig {
		&self.config
	}

	/// Codec used for sync payloads.
	pub fn network_codec(&self) -> &BoxCodec<T> {
		&self.network_codec
	}

	/// Collects this store's folder from `supplier` and applies it.
	///
	/// Files the supplier could not read or parse are reported as failures
	/// alongside the documents that failed to decode.
	pub fn reload(&self, supplier: &dyn ResourceSupplier) -> Result<ReloadReport, StoreError> {
		let Collected { documents, unreadable } = supplier.collect(&self.config.folder)?;
		Ok(self.run(&documents, unreadable))
	}

	/// Decodes, validates and publishes a complete set of documents.
	pub fn apply(&self, documents: Documents) -> ReloadReport {
		self.run(&documents, Vec::new())
	}

	fn run(&self, documents: &Documents, unreadable: Vec<(Identifier, String)>) -> ReloadReport {
		let _guard = self.reload_lock.lock();
		let _loading = LoadingFlag::raise(&self.loading);
		self.apply_locked(documents, unreadable)
	}

	fn apply_locked(&self, documents: &Documents, unreadable: Vec<(Identifier, String)>) -> ReloadReport {
		tracing::info!(store = %self.id, folder = %self.config.folder, documents = documents.len(), "beginning data load");
		let (candidate, mut failures) = self.decode_all(documents, true);
		failures.extend(unreadable.into_iter().map(|(key, reason)| (key, DecodeError::new(reason))));
		failures.sort_by(|a, b| a.0.cmp(&b.0));
		let loaded = candidate.len();
		tracing::info!(store = %self.id, loaded, failed = failures.len(), "data load finished");

		tracing::info!(store = %self.id, "beginning validation");
		let outcome = match self.validator.validate(candidate) {
			Ok(accepted) => {
				tracing::info!(store = %self.id, entries = accepted.len(), "validation finished");
				ReloadOutcome::Published {
					revision: self.publish(accepted),
				}
			}
			Err(error) => {
				tracing::error!(store = %self.id, reason = %error, policy = ?self.config.on_rejection, "validation failed");
				if self.config.on_rejection == RejectionPolicy::PublishAnyway {
					// The validator consumed the candidate; decode again untouched.
					let (raw, _) = self.decode_all(documents, false);
					self.publish(raw);
				}
				ReloadOutcome::Rejected(error)
			}
		};

		ReloadReport {
			loaded,
			failures,
			outcome,
		}
	}

	fn decode_all(&self, documents: &Documents, log: bool) -> (Candidate<T>, Vec<(Identifier, DecodeError)>) {
		let mut candidate = Candidate::new();
		let mut failures = Vec::new();
		for (key, json) in documents {
			match self.codec.decode(&Value::from(json)).and_then(|decoded| decoded.strict()) {
				Ok(value) => {
					candidate.insert(key.clone(), value);
				}
				Err(error) => {
					if log {
						tracing::error!(store = %self.id, %key, reason = %error, "failed to parse data entry");
					}
					failures.push((key.clone(), error));
				}
			}
		}
		(candidate, failures)
	}

	fn next_revision(&self) -> u64 {
		self.revisions.fetch_add(1, Ordering::Relaxed) + 1
	}

	fn publish(&self, candidate: Candidate<T>) -> u64 {
		let revision = self.next_revision();
		let entries = candidate.len();
		self.current.store(Some(Arc::new(Generation::new(revision, candidate))));
		tracing::debug!(store = %self.id, revision, entries, "published generation");
		revision
	}

	/// Freezes decoded entries into a generation stamped with this store's
	/// next revision, ready for [`Self::replace_synced`].
	pub fn generation_from_entries(&self, entries: impl IntoIterator<Item = (Identifier, T)>) -> Arc<Generation<T>> {
		let candidate: Candidate<T> = entries.into_iter().collect();
		Arc::new(Generation::new(self.next_revision(), candidate))
	}

	/// Publishes a generation received from an authoritative peer.
	///
	/// Skips validation; the sender already validated it.
	pub fn replace_synced(&self, generation: Arc<Generation<T>>) -> Replaced {
		let _guard = self.reload_lock.lock();
		if self.current.load_full().is_some_and(|current| Arc::ptr_eq(&current, &generation)) {
			return Replaced::Unchanged;
		}
		let revision = generation.revision();
		let entries = generation.len();
		self.current.store(Some(generation));
		tracing::debug!(store = %self.id, revision, entries, "published synced generation");
		Replaced::Replaced { revision }
	}

	/// Current generation, if any has been published.
	#[inline]
	pub fn snapshot(&self) -> Option<Arc<Generation<T>>> {
		self.current.load_full()
	}

	#[inline]
	fn with_current<R>(&self, f: impl FnOnce(&Generation<T>) -> R) -> Option<R> {
		let guard = self.current.load();
		Option::as_deref(&guard).map(f)
	}

	pub fn state(&self) -> StoreState {
		if self.loading.load(Ordering::Acquire) {
			return StoreState::Loading;
		}
		self.with_current(|g| StoreState::Loaded { revision: g.revision() })
			.unwrap_or(StoreState::Unloaded)
	}

	pub fn is_loaded(&self) -> bool {
		self.with_current(|_| ()).is_some()
	}

	#[inline]
	pub fn get(&self, key: &Identifier) -> Option<Arc<T>> {
		self.with_current(|g| g.get(key).cloned()).flatten()
	}

	/// Like [`Self::get`], but says why nothing was found.
	pub fn get_or_err(&self, key: &Identifier) -> Result<Arc<T>, StoreError> {
		self.with_current(|g| g.get(key).cloned())
			.ok_or_else(|| StoreError::NotLoaded { store: self.id.clone() })?
			.ok_or_else(|| StoreError::NotFound {
				store: self.id.clone(),
				key: key.clone(),
			})
	}

	pub fn get_or_else(&self, key: &Identifier, fallback: impl FnOnce() -> Arc<T>) -> Arc<T> {
		self.get(key).unwrap_or_else(fallback)
	}

	pub fn contains_key(&self, key: &Identifier) -> bool {
		self.with_current(|g| g.contains_key(key)).unwrap_or(false)
	}

	/// Keys of the current generation, sorted. Empty when unloaded.
	pub fn keys(&self) -> Vec<Identifier> {
		let mut keys = self
			.with_current(|g| g.keys().cloned().collect::<Vec<_>>())
			.unwrap_or_default();
		keys.sort();
		keys
	}

	pub fn values(&self) -> Vec<Arc<T>> {
		self.with_current(|g| g.values().cloned().collect()).unwrap_or_default()
	}

	pub fn len(&self) -> usize {
		self.with_current(Generation::len).unwrap_or(0)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Holds the loading flag up for the duration of a reload, unwinding included.
struct LoadingFlag<'a>(&'a AtomicBool);

impl<'a> LoadingFlag<'a> {
	fn raise(flag: &'a AtomicBool) -> Self {
		flag.store(true, Ordering::Release);
		Self(flag)
	}
}

impl Drop for LoadingFlag<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

/// Builder returned by [`DataStore::builder`].
pub struct DataStoreBuilder<T> {
	id: Identifier,
	config: StoreConfig,
	codec: BoxCodec<T>,
	network_codec: Option<BoxCodec<T>>,
	validator: Box<dyn Validator<T>>,
}

impl<T: Send + Sync + 'static> DataStoreBuilder<T> {
	/// Codec for sync payloads when it differs from the load codec.
	pub fn network_codec(mut self, codec: BoxCodec<T>) -> Self {
		self.network_codec = Some(codec);
		self
	}

	pub fn validator(mut self, validator: impl Validator<T> + 'static) -> Self {
		self.validator = Box::new(validator);
		self
	}

	/// Replaces the whole config, folder included.
	pub fn config(mut self, config: StoreConfig) -> Self {
		self.config = config;
		self
	}

	pub fn build(self) -> DataStore<T> {
		let network_codec = self.network_codec.unwrap_or_else(|| Arc::clone(&self.codec));
		DataStore {
			id: self.id,
			config: self.config,
			codec: self.codec,
			network_codec,
			validator: self.validator,
			current: ArcSwapOption::empty(),
			revisions: AtomicU64::new(0),
			loading: AtomicBool::new(false),
			reload_lock: Mutex::new(()),
		}
	}
}

#[cfg(test)]
mod tests;
