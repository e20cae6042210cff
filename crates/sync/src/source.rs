//! Authoritative side: turns registered stores into envelopes.

use std::sync::Arc;

use codeclib_primitives::Identifier;

use crate::{StoreRegistry, SyncChannel, SyncEnvelope, SyncError, SyncTarget};

/// Outcome of sending every registered store.
#[derive(Debug, Default)]
pub struct SyncSummary {
	/// Envelopes that went out.
	pub sent: usize,
	/// Stores that could not be sent. Each was logged and skipped.
	pub failed: Vec<(Identifier, SyncError)>,
}

impl SyncSummary {
	pub fn is_complete(&self) -> bool {
		self.failed.is_empty()
	}
}

/// Sends full store snapshots over a channel.
pub struct SyncSource {
	registry: StoreRegistry,
	channel: Arc<dyn SyncChannel>,
}

impl SyncSource {
	pub fn new(registry: StoreRegistry, channel: Arc<dyn SyncChannel>) -> Self {
		Self { registry, channel }
	}

	pub fn registry(&self) -> &StoreRegistry {
		&self.registry
	}

	/// Sends one store. Returns `false` when the store has nothing to send
	/// because it was never loaded.
	pub fn sync_store(&self, id: &Identifier, target: SyncTarget) -> Result<bool, SyncError> {
		let store = self.registry.get(id).ok_or_else(|| SyncError::UnknownStore(id.clone()))?;
		let Some(entries) = store.export()? else {
			tracing::debug!(store = %id, "skipping sync of unloaded store");
			return Ok(false);
		};
		let count = entries.len();
		let payload = SyncEnvelope::new(id.clone(), entries).to_bytes()?;
		let bytes = payload.len();
		self.channel.send(target, payload)?;
		tracing::info!(store = %id, ?target, entries = count, bytes, "sent store sync");
		Ok(true)
	}

	/// Sends every loaded store. Call after a reload completes or when a
	/// peer joins.
	///
	/// Stores are sent independently: one that fails is logged and recorded
	/// in the summary, and the rest still go out.
	pub fn on_reload_complete(&self, target: SyncTarget) -> SyncSummary {
		let mut summary = SyncSummary::default();
		for id in self.registry.ids() {
			match self.sync_store(&id, target) {
				Ok(true) => summary.sent += 1,
				Ok(false) => {}
				Err(error) => {
					tracing::error!(store = %id, ?target, %error, "failed to send store sync");
					summary.failed.push((id, error));
				}
			}
		}
		summary
	}
}
