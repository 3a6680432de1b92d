//! Node State Machine
//!
//! One `Node` per cluster member: the message dispatcher, the per-type
//! handlers, and the tick driver that together run the membership
//! protocol. A node is single-threaded and cooperatively ticked; the
//! outer driver calls `tick` exactly once per global clock step, and
//! nothing else touches node state. The inbox channel is the only
//! boundary a concurrent producer (the network delivery path) writes
//! through.
//!
//! ## Lifecycle
//! 1. `new` seeds the table with the node's own record.
//! 2. `start` joins the group: the introducer marks itself joined
//!    immediately (it boots the group), everyone else sends a
//!    `JoinRequest` and waits for the snapshot reply. A node still
//!    unjoined after `join_timeout` ticks reports the failure and marks
//!    itself failed.
//! 3. `tick` drains and dispatches the inbox, then runs one round of
//!    failure detection and gossip fanout.

use std::sync::Arc;

use crate::net::transport::{Inbox, Transport};

use super::protocol::{Message, PeerRecord};
use super::table::{MembershipTable, MergeOutcome};
use super::types::{EventSink, MembershipEvent, PeerId, ProtocolConfig};

pub struct Node {
    identity: PeerId,
    config: ProtocolConfig,
    joined: bool,
    failed: bool,
    started_at: u64,
    table: MembershipTable,
    inbox: Inbox,
    transport: Arc<dyn Transport>,
    events: Arc<dyn EventSink>,
}

impl Node {
    /// Creates a node with its table seeded. The identity and the
    /// introducer in `config` are the only bootstrap inputs the protocol
    /// needs.
    pub fn new(
        identity: PeerId,
        config: ProtocolConfig,
        transport: Arc<dyn Transport>,
        inbox: Inbox,
        events: Arc<dyn EventSink>,
        now: u64,
    ) -> Self {
        debug_assert!(
            config.remove_after > config.suspect_after,
            "remove_after must exceed suspect_after"
        );
        Self {
            identity,
            table: MembershipTable::new(identity, now),
            joined: false,
            failed: false,
            started_at: now,
            config,
            inbox,
            transport,
            events,
        }
    }

    pub fn identity(&self) -> PeerId {
        self.identity
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn table(&self) -> &MembershipTable {
        &self.table
    }

    /// Takes the node down. Every later tick is a no-op and messages
    /// already queued in the inbox are left frozen there.
    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// Joins the group. The introducer boots the group by itself;
    /// everyone else asks the introducer for a membership snapshot.
    pub fn start(&mut self, now: u64) {
        self.started_at = now;
        if self.identity == self.config.introducer {
            tracing::info!("[{}] starting up group as introducer", self.identity);
            self.joined = true;
        } else {
            tracing::info!(
                "[{}] requesting to join via introducer {}",
                self.identity,
                self.config.introducer
            );
            let request = Message::JoinRequest {
                sender: self.identity,
                heartbeat: self.table.local_heartbeat(),
            };
            self.send(self.config.introducer, &request);
        }
    }

    /// One protocol step. Called exactly once per global clock tick by
    /// the outer driver.
    pub fn tick(&mut self, now: u64) {
        if self.failed {
            return;
        }

        self.drain_inbox(now);

        // A join reply may have arrived in the drain above; only give up
        // once the startup window has fully elapsed.
        if !self.joined {
            if now.saturating_sub(self.started_at) > self.config.join_timeout {
                tracing::error!(
                    "[{}] unable to join the group within {} ticks, giving up",
                    self.identity,
                    self.config.join_timeout
                );
                self.failed = true;
            }
            return;
        }

        self.table.bump_self(now);

        for peer in self.table.evict_stale(now, self.config.remove_after) {
            self.events
                .on_event(self.identity, MembershipEvent::PeerRemoved(peer));
        }

        self.gossip_round(now);
    }

    /// Pops every queued message in arrival order and dispatches it.
    fn drain_inbox(&mut self, now: u64) {
        while let Some(bytes) = self.inbox.try_next() {
            self.dispatch(&bytes, now);
        }
    }

    /// Decodes an inbound frame and routes it to exactly one handler;
    /// the exhaustive match guarantees a message can never reach two.
    /// Malformed input is dropped with a diagnostic, it never unseats
    /// the node.
    pub(crate) fn dispatch(&mut self, bytes: &[u8], now: u64) {
        let message = match Message::decode(bytes) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(
                    "[{}] dropping undecodable message ({} bytes): {}",
                    self.identity,
                    bytes.len(),
                    err
                );
                return;
            }
        };

        match message {
            Message::JoinRequest { sender, heartbeat } => {
                self.handle_join_request(sender, heartbeat, now);
            }
            Message::JoinReply { members, .. } => {
                self.handle_join_reply(members, now);
            }
            Message::GossipPush { sender, members } => {
                self.handle_gossip_push(sender, members, now);
            }
            Message::GossipAck { sender } => {
                self.handle_gossip_ack(sender, now);
            }
        }
    }

    /// A booting node asked to join: record it as a live peer, then
    /// answer with the full current snapshot so it starts from
    /// everything we know.
    fn handle_join_request(&mut self, sender: PeerId, heartbeat: u64, now: u64) {
        tracing::debug!("[{}] join request from {}", self.identity, sender);

        self.apply_record(sender, heartbeat, now);

        let reply = Message::JoinReply {
            sender: self.identity,
            members: self.table.snapshot_full(),
        };
        self.send(sender, &reply);
    }

    /// The introducer's snapshot arrived: fold it in and enter the
    /// group. Safe to receive twice; merging is idempotent and `joined`
    /// is just a flag.
    fn handle_join_reply(&mut self, members: Vec<PeerRecord>, now: u64) {
        self.merge_snapshot(&members, now);

        if !self.joined {
            self.joined = true;
            tracing::info!(
                "[{}] joined the group, {} peer(s) known",
                self.identity,
                self.table.peer_count()
            );
        }
    }

    /// One anti-entropy push: merge the advertised snapshot (the
    /// sender's own record rides first in it, so this also refreshes the
    /// sender) and acknowledge unconditionally.
    fn handle_gossip_push(&mut self, sender: PeerId, members: Vec<PeerRecord>, now: u64) {
        self.merge_snapshot(&members, now);

        let ack = Message::GossipAck {
            sender: self.identity,
        };
        self.send(sender, &ack);
    }

    /// A peer confirmed it is alive: refresh it without a full snapshot
    /// round-trip. An unknown sender usually means the entry was already
    /// evicted; reported and ignored.
    fn handle_gossip_ack(&mut self, sender: PeerId, now: u64) {
        if !self.table.confirm_alive(sender, now) {
            tracing::warn!(
                "[{}] gossip ack from unknown peer {}, ignoring",
                self.identity,
                sender
            );
        }
    }

    fn merge_snapshot(&mut self, members: &[PeerRecord], now: u64) {
        for record in members {
            self.apply_record(record.peer, record.heartbeat, now);
        }
    }

    /// Merges one record and surfaces an event when it introduced a new
    /// peer.
    fn apply_record(&mut self, peer: PeerId, heartbeat: u64, now: u64) {
        if let MergeOutcome::Added = self.table.merge(peer, heartbeat, now) {
            self.events
                .on_event(self.identity, MembershipEvent::PeerAdded(peer));
        }
    }

    /// Failure detection fanout for this tick: push our advertised
    /// snapshot to one randomly chosen peer. A target already past the
    /// suspect window is skipped; probing it would waste the round, and
    /// either a later update rescues it or eviction takes it.
    fn gossip_round(&self, now: u64) {
        let target = match self.table.pick_gossip_target() {
            Ok(entry) => entry,
            Err(_) => {
                // A lone introducer has nobody to talk to yet.
                tracing::trace!("[{}] no gossip target available", self.identity);
                return;
            }
        };

        if now.saturating_sub(target.last_refreshed) > self.config.suspect_after {
            tracing::debug!(
                "[{}] skipping suspect gossip target {}",
                self.identity,
                target.peer
            );
            return;
        }

        let push = Message::GossipPush {
            sender: self.identity,
            members: self.table.snapshot_for_gossip(now, self.config.suspect_after),
        };
        self.send(target.peer, &push);
    }

    fn send(&self, to: PeerId, message: &Message) {
        self.transport.send(self.identity, to, message.encode());
    }
}
