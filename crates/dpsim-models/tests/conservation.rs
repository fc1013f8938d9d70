//! Conservation properties of the greedy models over random topologies

use dpsim_core::{GenerationParams, ValueRange};
use dpsim_models::{Model, PriorityGreedyModel, ProfitGreedyModel};
use dpsim_network::SensorNetwork;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn network(seed: u64, battery: u64) -> SensorNetwork {
    let mut params = GenerationParams::small();
    params.network.battery_capacity = battery;
    params.value_range = ValueRange::new(1, 5000).unwrap();
    SensorNetwork::generate(&params, &mut StdRng::seed_from_u64(seed)).unwrap()
}

fn assert_conserved(model: &dyn Model) {
    let network = model.network();
    let outcome = model.results().unwrap();

    assert!(outcome.total_packets <= network.total_overflow_packets());
    assert!(outcome.total_packets <= network.total_storage_capacity());
    assert_eq!(outcome.total_packets, network.total_stored());

    let routed: u64 = outcome.routes.iter().map(|r| u64::from(r.packets)).sum();
    assert_eq!(routed, outcome.total_packets);

    for node in network.nodes() {
        assert!(node.energy() <= node.battery_capacity());
    }
    for sn in network.storage_nodes() {
        let state = sn.as_storage().unwrap();
        assert!(state.used_space() <= state.capacity());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_priority_greedy_conserves_packets(seed in any::<u64>(), battery in 0u64..50_000) {
        let mut model = PriorityGreedyModel::new(network(seed, battery));
        model.run().unwrap();
        assert_conserved(&model);
    }

    #[test]
    fn prop_profit_greedy_conserves_packets(seed in any::<u64>(), battery in 0u64..50_000) {
        let mut model = ProfitGreedyModel::new(network(seed, battery));
        model.run().unwrap();
        assert_conserved(&model);

        // Only profitable batches are ever committed
        prop_assert!(model.total_profit().unwrap() >= 0);
    }

    #[test]
    fn prop_rerun_is_deterministic(seed in any::<u64>()) {
        let mut model = PriorityGreedyModel::new(network(seed, 1_000_000));
        model.run().unwrap();
        let first = model.results().unwrap().clone();
        model.run().unwrap();
        prop_assert_eq!(model.results().unwrap(), &first);
    }
}
