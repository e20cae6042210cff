//! Replication of data stores from an authoritative node to replicas.
//!
//! A sync always carries a whole store: the [`SyncSource`] exports every
//! entry with the store's network codec, wraps them in a [`SyncEnvelope`]
//! and hands the bytes to a [`SyncChannel`]. A [`Replica`] decodes the
//! envelope, finds the store by identity and swaps in a new generation.
//! There are no deltas and no retries.

mod channel;
mod envelope;
mod error;
mod registry;
mod replica;
mod source;

pub use channel::{Inbox, LoopbackChannel, PeerId, SyncChannel, SyncTarget};
pub use envelope::SyncEnvelope;
pub use error::SyncError;
pub use registry::{StoreRegistry, SyncedStore};
pub use replica::Replica;
pub use source::{SyncSource, SyncSummary};
