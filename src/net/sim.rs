//! In-Memory Network
//!
//! Loss-prone message delivery between in-process nodes, standing in
//! for a real UDP transport. Keeps a routing table from peer identity
//! to that peer's postbox and rolls a uniform drop chance per send, so
//! scenarios can exercise the protocol's tolerance to message loss.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use rand::Rng;

use crate::membership::types::PeerId;

use super::transport::{mailbox, Inbox, Postbox, Transport};

pub struct SimNetwork {
    routes: DashMap<PeerId, Postbox>,
    /// Probability in [0, 1] that any single send is lost in flight.
    drop_rate: f64,
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl SimNetwork {
    pub fn new(drop_rate: f64) -> Self {
        Self {
            routes: DashMap::new(),
            drop_rate: drop_rate.clamp(0.0, 1.0),
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Registers a peer and hands back the inbox it will drain.
    pub fn register(&self, peer: PeerId) -> Inbox {
        let (postbox, inbox) = mailbox();
        self.routes.insert(peer, postbox);
        inbox
    }

    /// Messages handed to `send` so far, dropped ones included.
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Messages lost to the drop roll.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Transport for SimNetwork {
    fn send(&self, from: PeerId, to: PeerId, payload: Vec<u8>) {
        self.sent.fetch_add(1, Ordering::Relaxed);

        if self.drop_rate > 0.0 && rand::thread_rng().gen_bool(self.drop_rate) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("dropping message {} -> {}", from, to);
            return;
        }

        match self.routes.get(&to) {
            Some(postbox) => postbox.deliver(payload),
            None => {
                tracing::warn!("no route to {} (message from {})", to, from);
            }
        }
    }
}
