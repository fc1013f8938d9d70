//! Priority-value greedy scheduler
//!
//! Data nodes are served in descending order of per-packet value. Each data
//! node works through the storage nodes from cheapest to most expensive
//! min-cost path (ranked once, when the data node is picked up) and sends
//! the largest batch the current cheapest destination can take before
//! moving on to the next one.

use std::collections::VecDeque;

use dpsim_core::{MicroJoules, NodeId};
use dpsim_network::SensorNetwork;
use tracing::{debug, info, trace};

use crate::error::ModelResult;
use crate::model::{Model, ModelOutcome, RouteRecord};

/// Greedy model that favours the most valuable data first
#[derive(Debug, Clone)]
pub struct PriorityGreedyModel {
    network: SensorNetwork,
    outcome: Option<ModelOutcome>,
}

impl PriorityGreedyModel {
    pub fn new(network: SensorNetwork) -> Self {
        Self {
            network,
            outcome: None,
        }
    }

    /// Give the network back, with the state left by the last run
    pub fn into_network(self) -> SensorNetwork {
        self.network
    }
}

/// Storage nodes ranked by ascending min cost from `dn`; ties keep network order
fn rank_destinations(network: &SensorNetwork, dn: NodeId) -> ModelResult<VecDeque<NodeId>> {
    let mut ranked = network
        .storage_node_ids()
        .iter()
        .map(|sn| Ok((network.calculate_min_cost(dn, *sn)?, *sn)))
        .collect::<ModelResult<Vec<(MicroJoules, NodeId)>>>()?;
    ranked.sort_by_key(|(cost, _)| *cost);
    Ok(ranked.into_iter().map(|(_, sn)| sn).collect())
}

/// Largest batch of at most `packets_left` packets that fits along `path`
fn largest_feasible_batch(network: &SensorNetwork, path: &[NodeId], packets_left: u32) -> u32 {
    (1..=packets_left)
        .rev()
        .find(|packets| network.can_send_along(path, *packets))
        .unwrap_or(0)
}

impl Model for PriorityGreedyModel {
    fn name(&self) -> &str {
        "priority-greedy"
    }

    fn network(&self) -> &SensorNetwork {
        &self.network
    }

    fn outcome(&self) -> Option<&ModelOutcome> {
        self.outcome.as_ref()
    }

    fn run(&mut self) -> ModelResult<()> {
        self.outcome = None;
        let network = &mut self.network;
        network.reset_packets();
        network.reset_energy();

        let mut data: Vec<(NodeId, u32)> = network
            .data_nodes()
            .map(|dn| (dn.id(), dn.packet_value()))
            .collect();
        data.sort_by(|a, b| b.1.cmp(&a.1));

        let mut outcome = ModelOutcome::default();
        for (dn, value) in data {
            let mut destinations = rank_destinations(network, dn)?;

            loop {
                let source = network.node(dn)?;
                if !source.has_energy() || source.is_empty() {
                    break;
                }
                let packets_left = source.packets_left();
                let Some(sn) = destinations.pop_front() else {
                    break;
                };

                if network.node(sn)?.is_full() {
                    trace!(dn = %dn, sn = %sn, "Destination full, skipping");
                    continue;
                }

                let path = network.min_cost_path(dn, sn)?;
                let packets = largest_feasible_batch(network, &path, packets_left);
                if packets == 0 {
                    debug!(dn = %dn, sn = %sn, "No feasible batch, trying next destination");
                    continue;
                }

                let transfer = network.send_along(path, packets)?;
                let route = RouteRecord::from_transfer(network, &transfer)?;
                outcome.record(value, transfer.unit_cost, route);
            }
        }
        outcome.total_packets = network.total_stored();

        info!(
            model = self.name(),
            value = outcome.total_value,
            cost = outcome.total_cost,
            profit = outcome.total_profit(),
            packets = outcome.total_packets,
            "Run complete"
        );
        self.outcome = Some(outcome);
        Ok(())
    }
}
