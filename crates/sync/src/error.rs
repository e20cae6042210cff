use codeclib_codec::EncodeError;
use codeclib_primitives::Identifier;

use crate::PeerId;

/// Errors from building, routing or applying sync envelopes.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
	#[error("malformed sync envelope: {0}")]
	MalformedEnvelope(String),
	#[error("no store registered as {0}")]
	UnknownStore(Identifier),
	#[error("store {0} is already registered")]
	DuplicateStore(Identifier),
	#[error("unknown or disconnected peer {0}")]
	UnknownPeer(PeerId),
	#[error("failed to encode entry {key}: {source}")]
	Encode {
		key: Identifier,
		#[source]
		source: EncodeError,
	},
	#[error("failed to serialize envelope: {0}")]
	Serialize(#[from] postcard::Error),
	#[error("sync channel disconnected")]
	Disconnected,
}
