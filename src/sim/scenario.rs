//! Scenario Description
//!
//! Declarative shape of one simulation run, loadable from a JSON file
//! or assembled from command-line flags.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::membership::types::ProtocolConfig;

/// Takes one node down at a fixed tick. The node simply stops ticking;
/// its queued messages stay frozen and its peers have to notice the
/// silence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FailureInjection {
    pub at_tick: u64,
    /// Index into the cluster's node list (0 is the introducer).
    pub node: usize,
}

/// One simulation run: cluster size, duration, message loss, and
/// scheduled crashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub nodes: u32,
    pub ticks: u64,
    #[serde(default)]
    pub drop_rate: f64,
    #[serde(default)]
    pub failures: Vec<FailureInjection>,
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            nodes: 10,
            ticks: 120,
            drop_rate: 0.0,
            failures: Vec::new(),
            protocol: ProtocolConfig::default(),
        }
    }
}

impl Scenario {
    /// Reads a scenario from a JSON file and validates it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        let scenario: Scenario = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse scenario {}", path.display()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Rejects configurations the protocol cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.nodes == 0 {
            bail!("scenario needs at least one node");
        }
        if !(0.0..=1.0).contains(&self.drop_rate) {
            bail!("drop_rate must be within [0, 1], got {}", self.drop_rate);
        }
        if self.protocol.remove_after <= self.protocol.suspect_after {
            bail!(
                "remove_after ({}) must be greater than suspect_after ({})",
                self.protocol.remove_after,
                self.protocol.suspect_after
            );
        }
        for failure in &self.failures {
            if failure.node >= self.nodes as usize {
                bail!(
                    "failure injection targets node {} but the cluster has {} nodes",
                    failure.node,
                    self.nodes
                );
            }
        }
        Ok(())
    }
}
