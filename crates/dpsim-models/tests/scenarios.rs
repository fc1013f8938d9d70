//! Reference scenarios for the scheduling models
//!
//! Small hand-built topologies whose outcomes can be worked out on paper:
//! a single capacity-bound destination, a network without energy, and a
//! data node choosing between a near and a far storage node.

use dpsim_core::{NetworkConfig, cost};
use dpsim_models::{
    ExternalFlowModel, FlowSolver, Model, ModelResult, PriorityGreedyModel, ProfitGreedyModel,
};
use dpsim_network::{FlowNetwork, SensorNetwork};

// Test helpers
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

fn single_destination(value: u32, battery: u64) -> SensorNetwork {
    let mut builder = SensorNetwork::builder(config(battery));
    builder.data_node(0.0, 0.0, value);
    builder.storage_node(10.0, 0.0);
    builder.build().unwrap()
}

fn near_and_far(value: u32) -> SensorNetwork {
    let mut builder = SensorNetwork::builder(config(1_000_000_000));
    builder.data_node(0.0, 0.0, value);
    builder.storage_node(20.0, 0.0);
    builder.storage_node(10.0, 0.0);
    builder.build().unwrap()
}

#[test]
fn test_capacity_bound_destination() {
    let mut model = PriorityGreedyModel::new(single_destination(100, 1_000_000_000));
    model.run().unwrap();

    assert_eq!(model.total_packets().unwrap(), 3);
    assert_eq!(model.total_value().unwrap(), 300);
    assert_eq!(model.total_cost().unwrap(), 3 * 672);

    let network = model.network();
    let dn = network.data_node(1).unwrap();
    let sn = network.storage_node(1).unwrap();
    assert_eq!(dn.packets_left(), 2);
    assert!(sn.is_full());
}

#[test]
fn test_no_energy_no_transfers() {
    let mut priority = PriorityGreedyModel::new(single_destination(100, 0));
    priority.run().unwrap();
    assert_eq!(priority.total_packets().unwrap(), 0);
    assert_eq!(priority.total_value().unwrap(), 0);
    assert_eq!(priority.total_cost().unwrap(), 0);

    let mut profit = ProfitGreedyModel::new(single_destination(5000, 0));
    profit.run().unwrap();
    assert_eq!(profit.total_packets().unwrap(), 0);
    assert_eq!(profit.total_value().unwrap(), 0);
    assert_eq!(profit.total_cost().unwrap(), 0);
}

#[test]
fn test_cheaper_destination_filled_first() {
    let mut model = PriorityGreedyModel::new(near_and_far(100));
    model.run().unwrap();

    let routes = model.routes().unwrap();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].destination, "SN02");
    assert_eq!(routes[0].packets, 3);
    assert_eq!(routes[1].destination, "SN01");
    assert_eq!(routes[1].hops, vec!["DN01", "SN01"]);
    assert_eq!(routes[1].packets, 2);

    let near = cost::transmission_cost(10.0) + cost::reception_cost();
    let far = cost::transmission_cost(20.0) + cost::reception_cost();
    assert_eq!(model.total_cost().unwrap(), 3 * near + 2 * far);
    assert_eq!(model.total_packets().unwrap(), 5);
}

#[test]
fn test_profit_model_matches_priority_on_profitable_data() {
    let mut priority = PriorityGreedyModel::new(near_and_far(5000));
    let mut profit = ProfitGreedyModel::new(near_and_far(5000));
    priority.run().unwrap();
    profit.run().unwrap();

    assert_eq!(priority.results().unwrap(), profit.results().unwrap());
}

#[test]
fn test_route_report_format() {
    let mut model = PriorityGreedyModel::new(single_destination(100, 1_000_000_000));
    model.run().unwrap();
    assert_eq!(
        model.route_report().unwrap(),
        "DN01 -> SN01 (flow = 3)\n\t[DN01 -> SN01]\n"
    );
}

/// Stores as much as the capacity allows, every packet on its direct arc
struct SaturatingSolver;

impl FlowSolver for SaturatingSolver {
    fn solve(&mut self, problem: &FlowNetwork) -> ModelResult<String> {
        // source=1, DN01=2, SN01=3, dummy=4, sink=5
        assert_eq!(problem.index().node_count(), 5);
        Ok("s -3984\nf 1 2 5\nf 2 3 3\nf 2 4 2\nf 3 5 3\nf 4 5 2\n".to_string())
    }
}

#[test]
fn test_external_model_agrees_with_greedy() {
    let mut greedy = PriorityGreedyModel::new(single_destination(2000, 1_000_000_000));
    let mut external =
        ExternalFlowModel::new(single_destination(2000, 1_000_000_000), SaturatingSolver);
    greedy.run().unwrap();
    external.run().unwrap();

    assert_eq!(external.total_packets().unwrap(), greedy.total_packets().unwrap());
    assert_eq!(external.total_profit().unwrap(), greedy.total_profit().unwrap());
    assert_eq!(external.routes().unwrap(), greedy.routes().unwrap());
}
