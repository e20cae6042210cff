//! Receiving side: applies envelopes to local stores.

use codeclib_store::Replaced;

use crate::{Inbox, StoreRegistry, SyncEnvelope, SyncError};

/// Applies incoming envelopes to the stores in a registry.
#[derive(Debug, Clone)]
pub struct Replica {
	registry: StoreRegistry,
}

impl Replica {
	pub fn new(registry: StoreRegistry) -> Self {
		Self { registry }
	}

	pub fn registry(&self) -> &StoreRegistry {
		&self.registry
	}

	/// Decodes one payload and replaces the matching store's generation.
	///
	/// On failure the store keeps its previous generation. Nothing is
	/// retried; the next full sync supersedes it.
	pub fn receive(&self, payload: &[u8]) -> Result<Replaced, SyncError> {
		let result = self.apply(payload);
		if let Err(error) = &result {
			tracing::error!(error = %error, "failed to apply store sync");
		}
		result
	}

	fn apply(&self, payload: &[u8]) -> Result<Replaced, SyncError> {
		let envelope = SyncEnvelope::from_bytes(payload)?;
		let store = self
			.registry
			.get(&envelope.store)
			.ok_or_else(|| SyncError::UnknownStore(envelope.store.clone()))?;
		let count = envelope.entries.len();
		let replaced = store.import(envelope.entries)?;
		tracing::info!(store = %envelope.store, entries = count, ?replaced, "applied store sync");
		Ok(replaced)
	}

	/// Applies payloads until the channel closes. Returns how many applied
	/// cleanly; failures are logged and skipped.
	pub async fn run(&self, mut inbox: Inbox) -> usize {
		let mut applied = 0;
		while let Ok(payload) = inbox.recv().await {
			if self.receive(&payload).is_ok() {
				applied += 1;
			}
		}
		tracing::debug!(peer = %inbox.peer(), applied, "sync inbox closed");
		applied
	}
}
