//! Membership & Discovery Module
//!
//! Implements a gossip-based membership protocol: every node keeps a
//! table of per-peer heartbeat records, pushes a snapshot of that table
//! to one randomly chosen peer per tick, and folds incoming snapshots
//! into its own view. There is no coordinator; views converge through
//! repeated rounds even under message loss.
//!
//! ## Core Mechanisms
//! - **Heartbeat counters**: each peer increments only its own counter,
//!   everyone else copies the value forward. Higher values win during
//!   merges, so updates commute and re-delivery is harmless.
//! - **Join handshake**: a booting node contacts the well-known
//!   introducer and bootstraps its table from the introducer's snapshot.
//! - **Two-stage failure detection**: a silent peer first stops being
//!   advertised (`suspect_after`), then gets evicted (`remove_after`).
//!   The gap in between lets a transiently slow peer recover its
//!   reputation instead of being purged and re-discovered from scratch.

pub mod protocol;
pub mod service;
pub mod table;
pub mod types;
