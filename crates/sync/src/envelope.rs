//! The unit of replication: one whole store, encoded for the wire.

use bytes::Bytes;
use codeclib_codec::Value;
use codeclib_primitives::Identifier;
use serde::{Deserialize, Serialize};

use crate::SyncError;

/// Full contents of one store, keyed by store identity.
///
/// Entries are already encoded with the store's network codec, so the
/// envelope itself never needs to know the entry type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEnvelope {
	pub store: Identifier,
	pub entries: Vec<(Identifier, Value)>,
}

impl SyncEnvelope {
	pub fn new(store: Identifier, entries: Vec<(Identifier, Value)>) -> Self {
		Self { store, entries }
	}

	pub fn to_bytes(&self) -> Result<Bytes, SyncError> {
		Ok(Bytes::from(postcard::to_stdvec(self)?))
	}

	pub fn from_bytes(payload: &[u8]) -> Result<Self, SyncError> {
		postcard::from_bytes(payload).map_err(|e| SyncError::MalformedEnvelope(e.to_string()))
	}
}
