//! Gossip Cluster Membership Library
//!
//! Core of a coordinator-free membership layer: nodes discover each other
//! through a well-known introducer, spread liveness information with
//! periodic gossip rounds, and detect and evict peers that stop
//! refreshing.
//!
//! ## Architecture Modules
//! The crate is composed of three loosely coupled subsystems:
//!
//! - **`membership`**: the protocol itself. The per-peer liveness table
//!   with its merge and aging rules, the wire codec, and the per-node
//!   state machine (join handshake, message dispatch, gossip and
//!   failure-detection ticks).
//! - **`net`**: the transport seam the protocol talks through. A
//!   fire-and-forget `Transport` trait, the per-node inbound queue, and
//!   an in-memory lossy network used for simulation and tests.
//! - **`sim`**: the outer driver. Scenario descriptions plus the cluster
//!   harness that steps every node once per global tick and injects
//!   scheduled failures.

pub mod membership;
pub mod net;
pub mod sim;
