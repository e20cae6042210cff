//! Message channels that carry encoded envelopes to peers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

use crate::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "peer#{}", self.0)
	}
}

/// Who receives a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
	/// Every connected peer.
	All,
	/// One peer, typically on join.
	Peer(PeerId),
}

pub trait SyncChannel: Send + Sync {
	fn send_to(&self, peer: PeerId, payload: Bytes) -> Result<(), SyncError>;

	fn broadcast(&self, payload: Bytes) -> Result<(), SyncError>;

	fn send(&self, target: SyncTarget, payload: Bytes) -> Result<(), SyncError> {
		match target {
			SyncTarget::All => self.broadcast(payload),
			SyncTarget::Peer(peer) => self.send_to(peer, payload),
		}
	}
}

/// Receiving end handed to one connected peer.
#[derive(Debug)]
pub struct Inbox {
	peer: PeerId,
	rx: mpsc::UnboundedReceiver<Bytes>,
}

impl Inbox {
	pub fn peer(&self) -> PeerId {
		self.peer
	}

	/// Waits for the next payload. Fails once the channel side is gone and
	/// everything queued has been drained.
	pub async fn recv(&mut self) -> Result<Bytes, SyncError> {
		self.rx.recv().await.ok_or(SyncError::Disconnected)
	}

	/// Next queued payload without waiting.
	pub fn try_recv(&mut self) -> Option<Bytes> {
		self.rx.try_recv().ok()
	}
}

/// In-process channel; each [`Self::connect`] creates one peer.
#[derive(Debug, Default)]
pub struct LoopbackChannel {
	next_peer: AtomicU64,
	peers: Mutex<FxHashMap<PeerId, mpsc::UnboundedSender<Bytes>>>,
}

impl LoopbackChannel {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn connect(&self) -> (PeerId, Inbox) {
		let peer = PeerId(self.next_peer.fetch_add(1, Ordering::Relaxed));
		let (tx, rx) = mpsc::unbounded_channel();
		self.peers.lock().insert(peer, tx);
		tracing::debug!(%peer, "peer connected");
		(peer, Inbox { peer, rx })
	}

	/// Forgets a peer; its inbox drains what was already queued, then ends.
	pub fn disconnect(&self, peer: PeerId) -> bool {
		self.peers.lock().remove(&peer).is_some()
	}

	pub fn peer_count(&self) -> usize {
		self.peers.lock().len()
	}
}

impl SyncChannel for LoopbackChannel {
	fn send_to(&self, peer: PeerId, payload: Bytes) -> Result<(), SyncError> {
		let mut peers = self.peers.lock();
		let Some(tx) = peers.get(&peer) else {
			return Err(SyncError::UnknownPeer(peer));
		};
		if tx.send(payload).is_err() {
			peers.remove(&peer);
			tracing::debug!(%peer, "dropped closed peer");
			return Err(SyncError::UnknownPeer(peer));
		}
		Ok(())
	}

	fn broadcast(&self, payload: Bytes) -> Result<(), SyncError> {
		self.peers.lock().retain(|peer, tx| {
			let open = tx.send(payload.clone()).is_ok();
			if !open {
				tracing::debug!(%peer, "dropped closed peer");
			}
			open
		});
		Ok(())
	}
}
