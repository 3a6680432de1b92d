use serde::{Deserialize, Serialize};

/// Compact identity of a cluster peer: a numeric host id plus a port.
///
/// Encodes to exactly six bytes on the wire (four for `id`, two for
/// `port`) and doubles as the delivery address in the transport layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PeerId {
    pub id: u32,
    pub port: u16,
}

impl PeerId {
    pub const fn new(id: u32, port: u16) -> Self {
        Self { id, port }
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.id, self.port)
    }
}

/// One row of the membership table: what this node currently believes
/// about a single peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntry {
    pub peer: PeerId,
    /// Monotonic counter owned by the peer it describes. Other nodes
    /// only copy the value forward, never invent it.
    pub heartbeat: u64,
    /// Local clock value of the last update that touched this entry.
    /// Never transmitted.
    pub last_refreshed: u64,
}

/// Protocol tunables, passed explicitly into the node and table instead
/// of living as file-scope constants.
///
/// `remove_after` must be greater than `suspect_after`; the gap is the
/// grace window in which a suspect peer can still recover.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Ticks without a refresh after which an entry is no longer
    /// advertised in outgoing gossip.
    pub suspect_after: u64,
    /// Ticks without a refresh after which an entry is evicted from the
    /// table.
    pub remove_after: u64,
    /// Ticks a booting node waits for a join reply before giving up.
    pub join_timeout: u64,
    /// Well-known peer that new nodes contact to join the group.
    pub introducer: PeerId,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            suspect_after: 5,
            remove_after: 20,
            join_timeout: 30,
            introducer: PeerId::new(1, 0),
        }
    }
}

/// Membership change notification surfaced to an external observer.
///
/// Purely informational; nothing here feeds back into protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipEvent {
    PeerAdded(PeerId),
    PeerRemoved(PeerId),
}

/// Observer for membership changes on a node.
pub trait EventSink: Send + Sync {
    fn on_event(&self, local: PeerId, event: MembershipEvent);
}

/// Default sink: reports membership changes through `tracing`.
pub struct TraceSink;

impl EventSink for TraceSink {
    fn on_event(&self, local: PeerId, event: MembershipEvent) {
        match event {
            MembershipEvent::PeerAdded(peer) => {
                tracing::info!("[{}] peer {} added to membership", local, peer);
            }
            MembershipEvent::PeerRemoved(peer) => {
                tracing::info!("[{}] peer {} removed from membership", local, peer);
            }
        }
    }
}
