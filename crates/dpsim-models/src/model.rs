//! The model contract
//!
//! Every scheduling strategy implements [`Model`], so comparison harnesses can
//! drive greedy, flow-solver backed, or any future strategy the same way.
//!
//! A model exclusively owns the network it runs against. Comparing models on
//! the same topology means cloning the network once per model, which keeps
//! a single writer per network instance.

use std::fmt::{self, Display};

use dpsim_core::NodeId;
use dpsim_network::{NetworkResult, SensorNetwork, Transfer};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ModelError, ModelResult};

/// One delivered batch of packets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    /// Label of the data node the packets came from
    pub source: String,
    /// Label of the storage node that kept them
    pub destination: String,
    pub packets: u32,
    /// Labels of every node on the path, source and destination included
    pub hops: Vec<String>,
}

impl RouteRecord {
    /// Describe a path of node ids by label
    pub fn from_path(
        network: &SensorNetwork,
        path: &[NodeId],
        packets: u32,
    ) -> NetworkResult<Self> {
        let hops = path
            .iter()
            .map(|id| network.node(*id).map(|node| node.label().to_string()))
            .collect::<NetworkResult<Vec<_>>>()?;
        Ok(Self {
            source: hops.first().cloned().unwrap_or_default(),
            destination: hops.last().cloned().unwrap_or_default(),
            packets,
            hops,
        })
    }

    pub fn from_transfer(network: &SensorNetwork, transfer: &Transfer) -> NetworkResult<Self> {
        Self::from_path(network, &transfer.path, transfer.packets)
    }
}

impl Display for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} -> {} (flow = {})",
            self.source, self.destination, self.packets
        )?;
        write!(f, "\t[{}]", self.hops.join(" -> "))
    }
}

/// Totals and routes of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOutcome {
    pub total_value: u64,
    pub total_cost: u64,
    pub total_packets: u64,
    pub routes: Vec<RouteRecord>,
}

impl ModelOutcome {
    /// Value preserved minus energy spent
    pub fn total_profit(&self) -> i64 {
        self.total_value as i64 - self.total_cost as i64
    }

    /// Account for a delivered batch
    pub fn record(&mut self, packet_value: u32, unit_cost: u64, route: RouteRecord) {
        let packets = u64::from(route.packets);
        self.total_value += u64::from(packet_value) * packets;
        self.total_cost += unit_cost * packets;
        self.routes.push(route);
    }

    /// All routes in the `DN -> SN (flow = k)` report format
    pub fn route_report(&self) -> String {
        self.routes
            .iter()
            .filter(|route| route.packets > 0)
            .map(|route| format!("{route}\n"))
            .collect()
    }
}

/// A packet-preservation strategy
pub trait Model {
    /// Short human-readable name
    fn name(&self) -> &str;

    /// The network this model owns
    fn network(&self) -> &SensorNetwork;

    /// Reset the network state and run the strategy once
    fn run(&mut self) -> ModelResult<()>;

    /// Outcome of the last completed run, if any
    fn outcome(&self) -> Option<&ModelOutcome>;

    /// Run for a number of episodes
    ///
    /// Single-pass strategies run once and warn if more episodes are asked for.
    fn run_episodes(&mut self, episodes: usize) -> ModelResult<()> {
        if episodes == 0 {
            return Err(ModelError::InvalidEpisodes(episodes));
        }
        if episodes > 1 {
            warn!(
                model = self.name(),
                episodes, "Ignoring episode count; running a single pass"
            );
        }
        self.run()
    }

    /// Outcome of the last run, or [`ModelError::NotRun`]
    fn results(&self) -> ModelResult<&ModelOutcome> {
        self.outcome().ok_or_else(|| ModelError::NotRun {
            model: self.name().to_string(),
        })
    }

    fn total_value(&self) -> ModelResult<u64> {
        Ok(self.results()?.total_value)
    }

    fn total_cost(&self) -> ModelResult<u64> {
        Ok(self.results()?.total_cost)
    }

    fn total_profit(&self) -> ModelResult<i64> {
        Ok(self.results()?.total_profit())
    }

    fn total_packets(&self) -> ModelResult<u64> {
        Ok(self.results()?.total_packets)
    }

    fn routes(&self) -> ModelResult<&[RouteRecord]> {
        Ok(&self.results()?.routes)
    }

    fn route_report(&self) -> ModelResult<String> {
        Ok(self.results()?.route_report())
    }

    /// Print every route to stdout
    fn print_route(&self) -> ModelResult<()> {
        print!("{}", self.route_report()?);
        Ok(())
    }
}
