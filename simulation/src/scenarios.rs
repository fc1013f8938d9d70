//! Reference scenarios
//!
//! Each scenario builds a tiny hand-placed network whose outcome is known in
//! advance, runs it, and checks the observed result against that expectation.

use std::fmt::{self, Display};

use clap::ValueEnum;
use dpsim_core::{NetworkConfig, NodeId, cost};
use dpsim_models::{Model, PriorityGreedyModel};
use dpsim_network::SensorNetwork;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Two nodes in range: direct path, single-hop cost
    A,
    /// One capacity-bound storage node
    B,
    /// No battery anywhere
    C,
    /// Near and far storage nodes
    D,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [Scenario::A, Scenario::B, Scenario::C, Scenario::D];

    pub fn run(self) -> anyhow::Result<ScenarioReport> {
        let report = match self {
            Scenario::A => direct_path()?,
            Scenario::B => capacity_bound()?,
            Scenario::C => no_energy()?,
            Scenario::D => cheaper_destination_first()?,
        };
        info!(scenario = report.title, passed = report.passed, "Scenario finished");
        Ok(report)
    }
}

/// Outcome of a scenario run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub title: &'static str,
    pub expected: &'static str,
    pub observed: Vec<String>,
    pub passed: bool,
}

impl Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.title)?;
        writeln!(f, "expected: {}", self.expected)?;
        for line in &self.observed {
            writeln!(f, "  {line}")?;
        }
        write!(f, "{}", if self.passed { "PASS" } else { "FAIL" })
    }
}

fn config(battery: u64) -> NetworkConfig {
    NetworkConfig {
        width: 100.0,
        length: 100.0,
        transmission_range: 20.0,
        packets_per_node: 5,
        capacity_per_node: 3,
        battery_capacity: battery,
    }
}

fn labels(network: &SensorNetwork, path: &[NodeId]) -> anyhow::Result<String> {
    let hops = path
        .iter()
        .map(|id| -> anyhow::Result<String> { Ok(network.node(*id)?.label().to_string()) })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(hops.join(" -> "))
}

fn direct_path() -> anyhow::Result<ScenarioReport> {
    let mut builder = SensorNetwork::builder(config(1_000_000_000));
    let dn = builder.data_node(0.0, 0.0, 100);
    let sn = builder.storage_node(10.0, 0.0);
    let network = builder.build()?;

    let path = network.min_cost_path(dn, sn)?;
    let min_cost = network.calculate_min_cost(dn, sn)?;
    let expected_cost = cost::transmission_cost(10.0) + cost::reception_cost();

    Ok(ScenarioReport {
        title: "A: direct path",
        expected: "path [DN01 -> SN01], cost = transmit(10 m) + receive",
        observed: vec![
            format!("path [{}]", labels(&network, &path)?),
            format!("min cost {min_cost} uJ (expected {expected_cost} uJ)"),
        ],
        passed: path == vec![dn, sn] && min_cost == expected_cost,
    })
}

fn capacity_bound() -> anyhow::Result<ScenarioReport> {
    let mut builder = SensorNetwork::builder(config(1_000_000_000));
    let dn = builder.data_node(0.0, 0.0, 100);
    builder.storage_node(10.0, 0.0);
    let mut model = PriorityGreedyModel::new(builder.build()?);
    model.run()?;

    let packets = model.total_packets()?;
    let value = model.total_value()?;
    let left = model.network().node(dn)?.packets_left();

    Ok(ScenarioReport {
        title: "B: capacity-bound storage",
        expected: "3 packets stored, value 300, 2 packets left",
        observed: vec![
            format!("packets {packets}, value {value}, left {left}"),
            model.route_report()?.trim_end().to_string(),
        ],
        passed: packets == 3 && value == 300 && left == 2,
    })
}

fn no_energy() -> anyhow::Result<ScenarioReport> {
    let mut builder = SensorNetwork::builder(config(0));
    builder.data_node(0.0, 0.0, 100);
    builder.storage_node(10.0, 0.0);
    let mut model = PriorityGreedyModel::new(builder.build()?);
    model.run()?;

    let packets = model.total_packets()?;
    let value = model.total_value()?;
    let spent = model.total_cost()?;
    Ok(ScenarioReport {
        title: "C: no energy",
        expected: "no transfers, all totals zero",
        observed: vec![format!("packets {packets}, value {value}, cost {spent}")],
        passed: packets == 0 && value == 0 && spent == 0,
    })
}

fn cheaper_destination_first() -> anyhow::Result<ScenarioReport> {
    let mut builder = SensorNetwork::builder(config(1_000_000_000));
    builder.data_node(0.0, 0.0, 100);
    builder.storage_node(20.0, 0.0);
    builder.storage_node(10.0, 0.0);
    let mut model = PriorityGreedyModel::new(builder.build()?);
    model.run()?;

    let first = model
        .routes()?
        .first()
        .map(|route| route.destination.clone())
        .unwrap_or_default();

    Ok(ScenarioReport {
        title: "D: cheaper destination first",
        expected: "SN02 (10 m) filled before SN01 (20 m)",
        observed: model.routes()?.iter().map(|route| route.to_string()).collect(),
        passed: first == "SN02" && model.network().storage_node(2)?.is_full(),
    })
}
