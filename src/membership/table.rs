//! Membership Table
//!
//! The per-node view of the cluster: one liveness record per known peer.
//! Owns the merge and aging rules that make gossip converge:
//!
//! - **Merge**: an incoming record only wins with a strictly greater
//!   heartbeat, so re-delivered and reordered updates are harmless.
//! - **Aging**: two decoupled windows. After `suspect_after` ticks
//!   without a refresh an entry stops being advertised; after
//!   `remove_after` ticks it is evicted. The gap lets a transiently slow
//!   peer recover before it is purged.
//!
//! The local node's own record is a separate field rather than a
//! distinguished slot in the peer list, so it can never be aged out or
//! shadowed by a peer entry.

use rand::Rng;
use thiserror::Error;

use super::protocol::PeerRecord;
use super::types::{MemberEntry, PeerId};

/// Returned by `pick_gossip_target` when no peer besides the local node
/// is known.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no peers known besides the local node")]
pub struct EmptyTable;

/// Result of merging one incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Previously unknown peer, inserted.
    Added,
    /// Known peer, heartbeat advanced and timestamp refreshed.
    Updated,
    /// Incoming heartbeat did not exceed the stored one; ignored.
    Stale,
}

/// Liveness records for every known peer, local node first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipTable {
    local: MemberEntry,
    peers: Vec<MemberEntry>,
}

impl MembershipTable {
    /// Seeds the table with the local node's own record at heartbeat 0.
    pub fn new(identity: PeerId, now: u64) -> Self {
        Self {
            local: MemberEntry {
                peer: identity,
                heartbeat: 0,
                last_refreshed: now,
            },
            peers: Vec::new(),
        }
    }

    pub fn identity(&self) -> PeerId {
        self.local.peer
    }

    pub fn local_heartbeat(&self) -> u64 {
        self.local.heartbeat
    }

    /// Number of known peers, not counting the local node.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Looks up the entry for `peer`, the local node included.
    pub fn get(&self, peer: PeerId) -> Option<&MemberEntry> {
        if peer == self.local.peer {
            Some(&self.local)
        } else {
            self.peers.iter().find(|entry| entry.peer == peer)
        }
    }

    /// All entries, local node first.
    pub fn entries(&self) -> impl Iterator<Item = &MemberEntry> {
        std::iter::once(&self.local).chain(self.peers.iter())
    }

    /// Folds one externally sourced record into the table. This is the
    /// single mutation path for everything learned from the network.
    ///
    /// A known peer is only touched when the incoming heartbeat is
    /// strictly greater than the stored one; equal or older values are a
    /// deliberate no-op, which makes the merge idempotent and independent
    /// of arrival order.
    pub fn merge(&mut self, peer: PeerId, heartbeat: u64, now: u64) -> MergeOutcome {
        if peer == self.local.peer {
            // Our own record circling back through gossip. The same
            // strictly-greater rule applies; in steady state nobody else
            // ever advances our counter.
            if heartbeat > self.local.heartbeat {
                self.local.heartbeat = heartbeat;
                self.local.last_refreshed = now;
                return MergeOutcome::Updated;
            }
            return MergeOutcome::Stale;
        }

        if let Some(entry) = self.peers.iter_mut().find(|entry| entry.peer == peer) {
            if heartbeat > entry.heartbeat {
                entry.heartbeat = heartbeat;
                entry.last_refreshed = now;
                MergeOutcome::Updated
            } else {
                MergeOutcome::Stale
            }
        } else {
            self.peers.push(MemberEntry {
                peer,
                heartbeat,
                last_refreshed: now,
            });
            MergeOutcome::Added
        }
    }

    /// Advances the local heartbeat. Called once per tick.
    pub fn bump_self(&mut self, now: u64) {
        self.local.heartbeat += 1;
        self.local.last_refreshed = now;
    }

    /// Gossip-ack refresh: the peer answered our push, so advance its
    /// stored heartbeat by one and refresh its timestamp without waiting
    /// for a full snapshot exchange. Returns false when the peer is
    /// unknown.
    pub fn confirm_alive(&mut self, peer: PeerId, now: u64) -> bool {
        match self.peers.iter_mut().find(|entry| entry.peer == peer) {
            Some(entry) => {
                entry.heartbeat += 1;
                entry.last_refreshed = now;
                true
            }
            None => false,
        }
    }

    /// Entries to advertise this round: the local record first, then
    /// every peer still inside the suspect window. Entries past the
    /// window stay in the table but are no longer gossiped.
    pub fn snapshot_for_gossip(&self, now: u64, suspect_after: u64) -> Vec<PeerRecord> {
        let mut records = vec![PeerRecord::from(&self.local)];
        records.extend(
            self.peers
                .iter()
                .filter(|entry| now.saturating_sub(entry.last_refreshed) <= suspect_after)
                .map(PeerRecord::from),
        );
        records
    }

    /// The complete table, local record first. Sent in a join reply so a
    /// fresh node starts from everything this node knows.
    pub fn snapshot_full(&self) -> Vec<PeerRecord> {
        let mut records = vec![PeerRecord::from(&self.local)];
        records.extend(self.peers.iter().map(PeerRecord::from));
        records
    }

    /// Drops every peer that has not been refreshed within
    /// `remove_after`, returning the evicted identities so the caller
    /// can notify its observer exactly once each. The local record is
    /// exempt.
    pub fn evict_stale(&mut self, now: u64, remove_after: u64) -> Vec<PeerId> {
        let mut removed = Vec::new();
        self.peers.retain(|entry| {
            if now.saturating_sub(entry.last_refreshed) > remove_after {
                removed.push(entry.peer);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Uniformly picks one non-self entry as this round's gossip target.
    pub fn pick_gossip_target(&self) -> Result<&MemberEntry, EmptyTable> {
        if self.peers.is_empty() {
            return Err(EmptyTable);
        }
        let idx = rand::thread_rng().gen_range(0..self.peers.len());
        Ok(&self.peers[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_higher_heartbeat() {
        let me = PeerId::new(1, 0);
        let other = PeerId::new(2, 0);
        let mut table = MembershipTable::new(me, 0);

        assert_eq!(table.merge(other, 3, 1), MergeOutcome::Added);
        assert_eq!(table.merge(other, 5, 2), MergeOutcome::Updated);
        assert_eq!(table.merge(other, 5, 3), MergeOutcome::Stale);
        assert_eq!(table.merge(other, 4, 4), MergeOutcome::Stale);

        let entry = table.get(other).unwrap();
        assert_eq!(entry.heartbeat, 5);
        assert_eq!(entry.last_refreshed, 2);
    }

    #[test]
    fn test_pick_gossip_target_requires_a_peer() {
        let table = MembershipTable::new(PeerId::new(1, 0), 0);
        assert_eq!(table.pick_gossip_target(), Err(EmptyTable));
    }
}
