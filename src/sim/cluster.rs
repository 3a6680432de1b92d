//! Cluster Driver
//!
//! Builds a set of nodes over one simulated network and advances them in
//! lockstep: every global tick steps each node exactly once, in index
//! order, so no two ticks of the same node ever overlap. Node 0 carries
//! the well-known introducer identity; the rest join through it.

use std::sync::Arc;

use crate::membership::service::Node;
use crate::membership::types::{EventSink, PeerId, TraceSink};
use crate::net::sim::SimNetwork;

use super::scenario::Scenario;

pub struct Cluster {
    network: Arc<SimNetwork>,
    nodes: Vec<Node>,
    scenario: Scenario,
    now: u64,
}

impl Cluster {
    /// Builds and starts every node in the scenario, reporting
    /// membership events through `tracing`.
    pub fn build(scenario: Scenario) -> Self {
        Self::with_sink(scenario, Arc::new(TraceSink))
    }

    /// Same as `build`, with a caller-supplied event sink.
    pub fn with_sink(scenario: Scenario, events: Arc<dyn EventSink>) -> Self {
        let network = Arc::new(SimNetwork::new(scenario.drop_rate));
        let introducer = scenario.protocol.introducer;

        let mut nodes = Vec::with_capacity(scenario.nodes as usize);
        for i in 0..scenario.nodes {
            // Identities count up from the introducer's well-known id.
            let identity = PeerId::new(introducer.id + i, introducer.port);
            let inbox = network.register(identity);
            nodes.push(Node::new(
                identity,
                scenario.protocol.clone(),
                network.clone(),
                inbox,
                events.clone(),
                0,
            ));
        }

        for node in &mut nodes {
            node.start(0);
        }

        Self {
            network,
            nodes,
            scenario,
            now: 0,
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn network(&self) -> &SimNetwork {
        &self.network
    }

    /// Advances the whole cluster by one global tick: applies any
    /// failure injections due now, then steps each node once.
    pub fn step(&mut self) {
        self.now += 1;

        for failure in &self.scenario.failures {
            if failure.at_tick == self.now {
                tracing::info!(
                    "injecting failure into node {} at tick {}",
                    failure.node,
                    self.now
                );
                self.nodes[failure.node].mark_failed();
            }
        }

        for node in &mut self.nodes {
            node.tick(self.now);
        }
    }

    /// Runs the scenario to completion.
    pub fn run(&mut self) {
        while self.now < self.scenario.ticks {
            self.step();
        }
    }
}
