//! Transport Seam
//!
//! The inbound queue follows a single-producer/single-consumer
//! discipline: the network side enqueues through a `Postbox` while the
//! owning node drains its `Inbox` inside its own tick. That channel is
//! the only structure shared between the delivery path and node state.

use tokio::sync::mpsc;

use crate::membership::types::PeerId;

/// Fire-and-forget message delivery. No delivery guarantee and no
/// synchronous reply; a lost message is recovered by later gossip
/// rounds, not by retries.
pub trait Transport: Send + Sync {
    fn send(&self, from: PeerId, to: PeerId, payload: Vec<u8>);
}

/// Receiving end of a node's inbound queue. Owned and drained
/// exclusively by the node's own tick.
pub struct Inbox {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl Inbox {
    /// Pops the next queued message without blocking. Returns `None`
    /// once the queue is drained for this tick.
    pub fn try_next(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }
}

/// Delivery handle for a node's queue, held by the network side. Safe
/// to use concurrently with the owning node's tick.
#[derive(Clone)]
pub struct Postbox {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl Postbox {
    /// Enqueues one inbound frame. Delivery to a node whose inbox is
    /// gone is silently dropped, matching the fire-and-forget contract.
    pub fn deliver(&self, payload: Vec<u8>) {
        let _ = self.tx.send(payload);
    }
}

/// Creates a connected postbox/inbox pair for one node.
pub fn mailbox() -> (Postbox, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Postbox { tx }, Inbox { rx })
}
