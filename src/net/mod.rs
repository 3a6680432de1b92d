//! Network Layer
//!
//! The narrow seam between the protocol and whatever actually moves
//! bytes. `transport` defines the interface the membership core
//! consumes: a fire-and-forget send primitive plus a per-node inbound
//! queue. `sim` provides the in-memory lossy implementation used by the
//! simulation harness and the test suite.

pub mod sim;
pub mod transport;
