//! Published snapshots and the drafts they are built from.

use std::sync::Arc;

use codeclib_primitives::Identifier;
use rustc_hash::FxHashMap;

/// One complete, immutable snapshot of a store.
///
/// Readers holding an `Arc<Generation<T>>` keep it alive across later
/// reloads; nothing inside ever changes.
#[derive(Debug)]
pub struct Generation<T> {
	revision: u64,
	entries: FxHashMap<Identifier, Arc<T>>,
}

impl<T> Generation<T> {
	pub(crate) fn new(revision: u64, candidate: Candidate<T>) -> Self {
		Self {
			revision,
			entries: candidate.entries.into_iter().map(|(k, v)| (k, Arc::new(v))).collect(),
		}
	}

	/// Monotonic publish counter of the store that produced this generation.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	#[inline]
	pub fn get(&self, id: &Identifier) -> Option<&Arc<T>> {
		self.entries.get(id)
	}

	#[inline]
	pub fn contains_key(&self, id: &Identifier) -> bool {
		self.entries.contains_key(id)
	}

	pub fn keys(&self) -> impl Iterator<Item = &Identifier> + '_ {
		self.entries.keys()
	}

	pub fn values(&self) -> impl Iterator<Item = &Arc<T>> + '_ {
		self.entries.values()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &Arc<T>)> + '_ {
		self.entries.iter()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Owned draft of the next generation.
///
/// Validators receive the candidate by value and may prune or rewrite it
/// before handing it back. It shares nothing with any published generation.
#[derive(Debug, Clone)]
pub struct Candidate<T> {
	entries: FxHashMap<Identifier, T>,
}

impl<T> Default for Candidate<T> {
	fn default() -> Self {
		Self {
			entries: FxHashMap::default(),
		}
	}
}

impl<T> Candidate<T> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, id: &Identifier) -> Option<&T> {
		self.entries.get(id)
	}

	pub fn get_mut(&mut self, id: &Identifier) -> Option<&mut T> {
		self.entries.get_mut(id)
	}

	pub fn contains_key(&self, id: &Identifier) -> bool {
		self.entries.contains_key(id)
	}

	pub fn insert(&mut self, id: Identifier, value: T) -> Option<T> {
		self.entries.insert(id, value)
	}

	pub fn remove(&mut self, id: &Identifier) -> Option<T> {
		self.entries.remove(id)
	}

	pub fn retain(&mut self, mut keep: impl FnMut(&Identifier, &T) -> bool) {
		self.entries.retain(|k, v| keep(k, v));
	}

	pub fn keys(&self) -> impl Iterator<Item = &Identifier> + '_ {
		self.entries.keys()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &T)> + '_ {
		self.entries.iter()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl<T> FromIterator<(Identifier, T)> for Candidate<T> {
	fn from_iter<I: IntoIterator<Item = (Identifier, T)>>(iter: I) -> Self {
		Self {
			entries: iter.into_iter().collect(),
		}
	}
}
