//! Property tests for the node energy and packet invariants
//!
//! Arbitrary sequences of transfers, discards, and resets must never leave a
//! node with more energy than its battery, more stored packets than its
//! capacity, or more packets left than it started with. Rejected operations
//! must leave the node untouched.

use dpsim_core::{
    DataState, IdAllocator, NodeKind, NodeRole, Position, SensorNode, StorageState,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Offload(u32),
    Store(u32),
    Discard(u32),
    ResetEnergy,
    ResetPackets,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..8).prop_map(Op::Offload),
        (0u32..8).prop_map(Op::Store),
        (0u32..8).prop_map(Op::Discard),
        Just(Op::ResetEnergy),
        Just(Op::ResetPackets),
    ]
}

fn pair(battery: u64, packets: u32, capacity: u32, distance: f64) -> (SensorNode, SensorNode) {
    let mut ids = IdAllocator::new();
    let dn = SensorNode::new(
        ids.allocate(NodeKind::Data),
        Position::new(0.0, 0.0),
        100.0,
        battery,
        NodeRole::Data(DataState::new(packets, 10)),
    );
    let sn = SensorNode::new(
        ids.allocate(NodeKind::Storage),
        Position::new(distance, 0.0),
        100.0,
        battery,
        NodeRole::Storage(StorageState::new(capacity)),
    );
    (dn, sn)
}

fn assert_invariants(dn: &SensorNode, sn: &SensorNode) {
    assert!(dn.energy() <= dn.battery_capacity());
    assert!(sn.energy() <= sn.battery_capacity());
    let data = dn.as_data().unwrap();
    assert!(data.packets_left() <= data.overflow_packets());
    let storage = sn.as_storage().unwrap();
    assert!(storage.used_space() <= storage.capacity());
}

proptest! {
    #[test]
    fn prop_operations_preserve_invariants(
        battery in 0u64..5_000,
        packets in 0u32..10,
        capacity in 0u32..10,
        distance in 0.0f64..90.0,
        ops in prop::collection::vec(op_strategy(), 0..40),
    ) {
        let (mut dn, mut sn) = pair(battery, packets, capacity, distance);

        for op in ops {
            let before = (dn.clone(), sn.clone());
            let result = match op {
                Op::Offload(k) => dn.offload_to(&sn, k),
                Op::Store(k) => sn.store_from(&dn, k),
                Op::Discard(k) => dn.discard_packets(k),
                Op::ResetEnergy => {
                    dn.reset_energy();
                    sn.reset_energy();
                    Ok(())
                }
                Op::ResetPackets => {
                    dn.reset_packets();
                    sn.reset_packets();
                    Ok(())
                }
            };

            if result.is_err() {
                prop_assert_eq!(&before.0, &dn);
                prop_assert_eq!(&before.1, &sn);
            }
            assert_invariants(&dn, &sn);
        }
    }

    #[test]
    fn prop_feasibility_check_matches_commit(
        battery in 0u64..5_000,
        capacity in 0u32..10,
        distance in 0.0f64..90.0,
        k in 0u32..10,
    ) {
        let (dn, mut sn) = pair(battery, 10, capacity, distance);
        let predicted = sn.can_store_from(&dn, k);
        prop_assert_eq!(predicted, sn.store_from(&dn, k).is_ok());
    }
}

#[test]
fn test_reset_is_idempotent() {
    let (mut dn, mut sn) = pair(10_000, 5, 5, 10.0);
    dn.offload_to(&sn, 3).unwrap();
    sn.store_from(&dn, 3).unwrap();

    dn.reset_energy();
    dn.reset_packets();
    let once = dn.clone();
    dn.reset_energy();
    dn.reset_packets();
    assert_eq!(once, dn);

    sn.reset_energy();
    sn.reset_packets();
    let once = sn.clone();
    sn.reset_energy();
    sn.reset_packets();
    assert_eq!(once, sn);
}
