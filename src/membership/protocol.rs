//! Wire Protocol
//!
//! Defines the four gossip messages and their exact byte layout. Every
//! message starts with a one-byte type tag; all integers are big-endian
//! and fixed width:
//!
//! - `JoinRequest`: tag, sender `PeerId` (6), heartbeat `u64` (8)
//! - `JoinReply`:   tag, sender `PeerId` (6), count `u64` (8), count x record
//! - `GossipPush`:  same layout as `JoinReply`
//! - `GossipAck`:   tag, sender `PeerId` (6)
//!
//! A record is a `PeerId` followed by its heartbeat (14 bytes total).
//! Snapshot payloads always carry the sender's own record first.
//!
//! Decoding is a pure function over the input bytes: short input yields
//! `WireError::Truncated`, an unrecognized leading tag yields
//! `WireError::UnknownType`. Neither touches any state.

use bytes::{Buf, BufMut};
use thiserror::Error;

use super::types::{MemberEntry, PeerId};

pub const JOINREQ: u8 = 0;
pub const JOINREP: u8 = 1;
pub const GOSSIP_PUSH: u8 = 2;
pub const GOSSIP_ACK: u8 = 3;

/// Size of one snapshot record on the wire: PeerId (6) + heartbeat (8).
const RECORD_LEN: usize = 14;

/// Decode failure. Malformed input is dropped by the receiver, never
/// propagated as a node fault.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    #[error("message shorter than its declared layout")]
    Truncated,
    #[error("unknown message type tag {0}")]
    UnknownType(u8),
}

/// The wire form of one membership entry. Local bookkeeping such as
/// `last_refreshed` never leaves the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerRecord {
    pub peer: PeerId,
    pub heartbeat: u64,
}

impl From<&MemberEntry> for PeerRecord {
    fn from(entry: &MemberEntry) -> Self {
        Self {
            peer: entry.peer,
            heartbeat: entry.heartbeat,
        }
    }
}

/// Protocol messages exchanged between peers. Created per send or
/// receive, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Sent by a booting node to the introducer.
    JoinRequest { sender: PeerId, heartbeat: u64 },
    /// The introducer's answer: its full membership snapshot.
    JoinReply {
        sender: PeerId,
        members: Vec<PeerRecord>,
    },
    /// One round of anti-entropy: the sender's advertised snapshot.
    GossipPush {
        sender: PeerId,
        members: Vec<PeerRecord>,
    },
    /// Liveness confirmation sent in response to a push.
    GossipAck { sender: PeerId },
}

impl Message {
    /// Serializes into a fresh buffer. Always succeeds for well-formed
    /// input.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        match self {
            Message::JoinRequest { sender, heartbeat } => {
                buf.put_u8(JOINREQ);
                put_peer(&mut buf, *sender);
                buf.put_u64(*heartbeat);
            }
            Message::JoinReply { sender, members } => {
                buf.put_u8(JOINREP);
                put_peer(&mut buf, *sender);
                put_members(&mut buf, members);
            }
            Message::GossipPush { sender, members } => {
                buf.put_u8(GOSSIP_PUSH);
                put_peer(&mut buf, *sender);
                put_members(&mut buf, members);
            }
            Message::GossipAck { sender } => {
                buf.put_u8(GOSSIP_ACK);
                put_peer(&mut buf, *sender);
            }
        }
        buf
    }

    /// Parses one message from a raw frame.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let buf = &mut &bytes[..];
        if buf.remaining() < 1 {
            return Err(WireError::Truncated);
        }

        match buf.get_u8() {
            JOINREQ => {
                let sender = get_peer(buf)?;
                let heartbeat = get_u64(buf)?;
                Ok(Message::JoinRequest { sender, heartbeat })
            }
            JOINREP => {
                let sender = get_peer(buf)?;
                let members = get_members(buf)?;
                Ok(Message::JoinReply { sender, members })
            }
            GOSSIP_PUSH => {
                let sender = get_peer(buf)?;
                let members = get_members(buf)?;
                Ok(Message::GossipPush { sender, members })
            }
            GOSSIP_ACK => {
                let sender = get_peer(buf)?;
                Ok(Message::GossipAck { sender })
            }
            other => Err(WireError::UnknownType(other)),
        }
    }

    /// The peer this message claims to come from.
    pub fn sender(&self) -> PeerId {
        match self {
            Message::JoinRequest { sender, .. }
            | Message::JoinReply { sender, .. }
            | Message::GossipPush { sender, .. }
            | Message::GossipAck { sender } => *sender,
        }
    }

    fn encoded_len(&self) -> usize {
        match self {
            Message::JoinRequest { .. } => 1 + 6 + 8,
            Message::JoinReply { members, .. } | Message::GossipPush { members, .. } => {
                1 + 6 + 8 + members.len() * RECORD_LEN
            }
            Message::GossipAck { .. } => 1 + 6,
        }
    }
}

fn put_peer(buf: &mut Vec<u8>, peer: PeerId) {
    buf.put_u32(peer.id);
    buf.put_u16(peer.port);
}

fn get_peer(buf: &mut &[u8]) -> Result<PeerId, WireError> {
    if buf.remaining() < 6 {
        return Err(WireError::Truncated);
    }
    let id = buf.get_u32();
    let port = buf.get_u16();
    Ok(PeerId { id, port })
}

fn get_u64(buf: &mut &[u8]) -> Result<u64, WireError> {
    if buf.remaining() < 8 {
        return Err(WireError::Truncated);
    }
    Ok(buf.get_u64())
}

fn put_members(buf: &mut Vec<u8>, members: &[PeerRecord]) {
    buf.put_u64(members.len() as u64);
    for record in members {
        put_peer(buf, record.peer);
        buf.put_u64(record.heartbeat);
    }
}

fn get_members(buf: &mut &[u8]) -> Result<Vec<PeerRecord>, WireError> {
    let count = get_u64(buf)?;

    // Reject the declared count before allocating for it; a frame cannot
    // carry more records than it has bytes.
    let needed = count.checked_mul(RECORD_LEN as u64).ok_or(WireError::Truncated)?;
    if (buf.remaining() as u64) < needed {
        return Err(WireError::Truncated);
    }

    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let peer = get_peer(buf)?;
        let heartbeat = get_u64(buf)?;
        members.push(PeerRecord { peer, heartbeat });
    }
    Ok(members)
}
