use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use cluster_membership::sim::cluster::Cluster;
use cluster_membership::sim::scenario::Scenario;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut scenario = Scenario::default();
    let mut tick_ms: u64 = 0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                let path = PathBuf::from(value_of(&args, i, "--scenario")?);
                scenario = Scenario::from_file(&path)?;
                i += 2;
            }
            "--nodes" => {
                scenario.nodes = value_of(&args, i, "--nodes")?.parse()?;
                i += 2;
            }
            "--ticks" => {
                scenario.ticks = value_of(&args, i, "--ticks")?.parse()?;
                i += 2;
            }
            "--drop" => {
                scenario.drop_rate = value_of(&args, i, "--drop")?.parse()?;
                i += 2;
            }
            "--tick-ms" => {
                tick_ms = value_of(&args, i, "--tick-ms")?.parse()?;
                i += 2;
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage(&args[0]);
                std::process::exit(1);
            }
        }
    }

    scenario.validate()?;

    tracing::info!(
        "Starting {} node cluster for {} ticks (drop rate {})",
        scenario.nodes,
        scenario.ticks,
        scenario.drop_rate
    );

    // 1. Build the cluster; node 0 boots the group as the introducer.
    let ticks = scenario.ticks;
    let mut cluster = Cluster::build(scenario);

    // 2. Advance one global tick at a time, optionally paced in wall
    //    time so the log is watchable.
    for _ in 0..ticks {
        cluster.step();
        if tick_ms > 0 {
            tokio::time::sleep(Duration::from_millis(tick_ms)).await;
        }
    }

    // 3. Final report: what each surviving node believes the cluster
    //    looks like.
    tracing::info!(
        "Simulation finished: {} messages sent, {} dropped",
        cluster.network().sent(),
        cluster.network().dropped()
    );

    for node in cluster.nodes() {
        if node.is_failed() {
            tracing::info!("  node {} failed", node.identity());
            continue;
        }
        tracing::info!(
            "  node {} tracks {} peer(s)",
            node.identity(),
            node.table().peer_count()
        );
        for entry in node.table().entries() {
            tracing::info!(
                "    - {} hb={} refreshed={}",
                entry.peer,
                entry.heartbeat,
                entry.last_refreshed
            );
        }
    }

    Ok(())
}

fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(|value| value.as_str())
        .ok_or_else(|| anyhow!("{} requires a value", flag))
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} [--scenario <file.json>] [--nodes <n>] [--ticks <n>] [--drop <rate>] [--tick-ms <ms>]",
        program
    );
    eprintln!("Example: {} --nodes 10 --ticks 200 --drop 0.1", program);
}
