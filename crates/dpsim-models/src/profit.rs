//! Max-profit greedy scheduler
//!
//! Data nodes are served in network order. While a data node has packets
//! left, the storage node offering the highest per-packet profit for a batch
//! of `min(packets left, space left)` is chosen. Batches are only sent while
//! that profit is positive; once no profitable destination remains, the
//! remaining packets are discarded.

use dpsim_core::NodeId;
use dpsim_network::SensorNetwork;
use tracing::{debug, info};

use crate::error::ModelResult;
use crate::model::{Model, ModelOutcome, RouteRecord};

/// Greedy model that always takes the most profitable destination
#[derive(Debug, Clone)]
pub struct ProfitGreedyModel {
    network: SensorNetwork,
    outcome: Option<ModelOutcome>,
}

struct Candidate {
    path: Vec<NodeId>,
    packets: u32,
    unit_cost: u64,
    profit: i64,
}

impl ProfitGreedyModel {
    pub fn new(network: SensorNetwork) -> Self {
        Self {
            network,
            outcome: None,
        }
    }

    pub fn into_network(self) -> SensorNetwork {
        self.network
    }
}

/// Most profitable feasible destination for the remaining packets of `dn`
fn best_candidate(network: &SensorNetwork, dn: NodeId) -> ModelResult<Option<Candidate>> {
    let source = network.node(dn)?;
    let value = i64::from(source.packet_value());
    let packets_left = source.packets_left();

    let mut best: Option<Candidate> = None;
    for sn in network.storage_nodes() {
        if sn.is_full() {
            continue;
        }
        let packets = packets_left.min(sn.space_left());
        let path = network.min_cost_path(dn, sn.id())?;
        if !network.can_send_along(&path, packets) {
            continue;
        }

        let unit_cost = network.calculate_cost_of_path(&path)?;
        let profit = value - unit_cost as i64;
        if best.as_ref().is_none_or(|current| profit > current.profit) {
            best = Some(Candidate {
                path,
                packets,
                unit_cost,
                profit,
            });
        }
    }
    Ok(best)
}

impl Model for ProfitGreedyModel {
    fn name(&self) -> &str {
        "profit-greedy"
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

        let mut outcome = ModelOutcome::default();
        let data: Vec<NodeId> = network.data_node_ids().to_vec();
        for dn in data {
            while !network.node(dn)?.is_empty() {
                match best_candidate(network, dn)? {
                    Some(candidate) if candidate.profit > 0 => {
                        let value = network.node(dn)?.packet_value();
                        let transfer = network.send_along(candidate.path, candidate.packets)?;
                        let route = RouteRecord::from_transfer(network, &transfer)?;
                        outcome.record(value, candidate.unit_cost, route);
                    }
                    _ => {
                        let left = network.node(dn)?.packets_left();
                        debug!(dn = %dn, packets = left, "No profitable destination, discarding");
                        network.discard_packets(dn, left)?;
                    }
                }
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

#[cfg(test)]
mod tests {
    use super::*;
    use dpsim_core::NetworkConfig;

    fn config() -> NetworkConfig {
        NetworkConfig {
            width: 100.0,
            length: 100.0,
            transmission_range: 20.0,
            packets_per_node: 4,
            capacity_per_node: 3,
            battery_capacity: 1_000_000,
        }
    }

    #[test]
    fn test_unprofitable_packets_discarded() {
        // 672 uJ per packet against a value of 100
        let mut builder = SensorNetwork::builder(config());
        let dn = builder.data_node(0.0, 0.0, 100);
        builder.storage_node(10.0, 0.0);
        let mut model = ProfitGreedyModel::new(builder.build().unwrap());

        model.run().unwrap();
        assert_eq!(model.total_packets().unwrap(), 0);
        assert_eq!(model.total_value().unwrap(), 0);
        assert!(model.network().node(dn).unwrap().is_empty());
    }

    #[test]
    fn test_splits_across_destinations_by_profit() {
        let mut builder = SensorNetwork::builder(config());
        let dn = builder.data_node(0.0, 0.0, 2000);
        let far = builder.storage_node(18.0, 0.0);
        let near = builder.storage_node(0.0, 10.0);
        let mut model = ProfitGreedyModel::new(builder.build().unwrap());

        model.run().unwrap();
        let routes = model.routes().unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].destination, "SN02");
        assert_eq!(routes[0].packets, 3);
        assert_eq!(routes[1].destination, "SN01");
        assert_eq!(routes[1].packets, 1);

        let network = model.network();
        assert_eq!(network.node(near).unwrap().used_space(), 3);
        assert_eq!(network.node(far).unwrap().used_space(), 1);
        assert!(network.node(dn).unwrap().is_empty());
        assert_eq!(model.total_value().unwrap(), 8000);
        assert_eq!(
            model.total_profit().unwrap(),
            8000 - model.total_cost().unwrap() as i64
        );
    }

    #[test]
    fn test_no_destination_discards() {
        let mut builder = SensorNetwork::builder(config());
        builder.data_node(0.0, 0.0, 5000);
        builder.storage_node(90.0, 90.0);
        let mut model = ProfitGreedyModel::new(builder.build().unwrap());

        model.run().unwrap();
        assert_eq!(model.total_packets().unwrap(), 0);
        assert!(model.routes().unwrap().is_empty());
    }
}
