//! Sensor node model
//!
//! A [`SensorNode`] is one physical sensor: a position, a transmission range,
//! a battery, and a role. Role-specific state lives in [`NodeRole`]; what a
//! node may do is expressed as a [`Capability`] set, and every operation a
//! role does not support fails with [`NodeError::Unsupported`].
//!
//! ## Invariants
//!
//! - `0 <= energy <= battery_capacity`
//! - data nodes: `0 <= packets_left <= overflow_packets`
//! - storage nodes: `0 <= used_space <= capacity`
//!
//! Every mutating operation checks its precondition first and returns an
//! error without touching state if the check fails.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::cost::{self, HopCost, MicroJoules};
use crate::error::{NodeError, NodeResult};
use crate::identity::{NodeId, NodeIdentity, NodeKind};

/// Slack added to the range check to absorb floating-point error
pub const RANGE_TOLERANCE: f64 = 1e-4;

/// Planar position in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position
    pub fn distance_to(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Something a node is able to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Originate overflow packets
    Generate,
    /// Keep packets in local storage
    Store,
    /// Forward packets on behalf of others
    Relay,
}

/// Packet state of a data node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataState {
    overflow_packets: u32,
    packet_value: u32,
    packets_left: u32,
}

impl DataState {
    pub fn new(overflow_packets: u32, packet_value: u32) -> Self {
        Self {
            overflow_packets,
            packet_value,
            packets_left: overflow_packets,
        }
    }

    pub fn overflow_packets(&self) -> u32 {
        self.overflow_packets
    }

    /// Value of each packet
    pub fn packet_value(&self) -> u32 {
        self.packet_value
    }

    pub fn packets_left(&self) -> u32 {
        self.packets_left
    }
}

/// Packet state of a storage node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageState {
    capacity: u32,
    used_space: u32,
}

impl StorageState {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            used_space: 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn used_space(&self) -> u32 {
        self.used_space
    }

    pub fn space_left(&self) -> u32 {
        self.capacity - self.used_space
    }
}

/// Role-specific node state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Data(DataState),
    Storage(StorageState),
    Transition,
}

impl NodeRole {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRole::Data(_) => NodeKind::Data,
            NodeRole::Storage(_) => NodeKind::Storage,
            NodeRole::Transition => NodeKind::Transition,
        }
    }

    /// Capabilities granted by this role
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            NodeRole::Data(_) => &[Capability::Generate, Capability::Relay],
            NodeRole::Storage(_) => &[Capability::Store, Capability::Relay],
            NodeRole::Transition => &[Capability::Relay],
        }
    }
}

/// One sensor in the network
#[derive(Debug, Clone, PartialEq)]
pub struct SensorNode {
    identity: NodeIdentity,
    position: Position,
    range: f64,
    battery_capacity: MicroJoules,
    energy: MicroJoules,
    role: NodeRole,
}

impl SensorNode {
    /// Create a node with a full battery
    pub fn new(
        identity: NodeIdentity,
        position: Position,
        range: f64,
        battery_capacity: MicroJoules,
        role: NodeRole,
    ) -> Self {
        Self {
            identity,
            position,
            range,
            battery_capacity,
            energy: battery_capacity,
            role,
        }
    }

    pub fn id(&self) -> NodeId {
        self.identity.id
    }

    /// 1-based number within the node's role
    pub fn role_id(&self) -> u32 {
        self.identity.role_id
    }

    pub fn label(&self) -> &str {
        &self.identity.label
    }

    pub fn kind(&self) -> NodeKind {
        self.role.kind()
    }

    pub fn role(&self) -> &NodeRole {
        &self.role
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Transmission range in metres
    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        self.role.capabilities()
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    pub fn as_data(&self) -> Option<&DataState> {
        match &self.role {
            NodeRole::Data(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_storage(&self) -> Option<&StorageState> {
        match &self.role {
            NodeRole::Storage(state) => Some(state),
            _ => None,
        }
    }

    // ---- geometry ----

    pub fn distance_to(&self, other: &SensorNode) -> f64 {
        self.position.distance_to(&other.position)
    }

    /// Whether both nodes can hear each other
    pub fn in_range_of(&self, other: &SensorNode) -> bool {
        self.distance_to(other) <= self.range.min(other.range) + RANGE_TOLERANCE
    }

    /// Per-packet cost of a hop from this node to `receiver`
    pub fn hop_cost_to(&self, receiver: &SensorNode) -> HopCost {
        HopCost::over(self.distance_to(receiver))
    }

    pub fn transmission_cost_to(&self, receiver: &SensorNode) -> MicroJoules {
        cost::transmission_cost(self.distance_to(receiver))
    }

    pub fn reception_cost(&self) -> MicroJoules {
        cost::reception_cost()
    }

    // ---- energy ----

    pub fn battery_capacity(&self) -> MicroJoules {
        self.battery_capacity
    }

    /// Remaining energy
    pub fn energy(&self) -> MicroJoules {
        self.energy
    }

    pub fn has_energy(&self) -> bool {
        self.energy > 0
    }

    /// Configure the battery and refill it
    pub fn set_battery_capacity(&mut self, battery_capacity: MicroJoules) {
        self.battery_capacity = battery_capacity;
        self.reset_energy();
    }

    pub fn reset_energy(&mut self) {
        self.energy = self.battery_capacity;
    }

    fn spend(&mut self, amount: MicroJoules) -> NodeResult<()> {
        if amount > self.energy {
            return Err(NodeError::InsufficientEnergy {
                node: self.label().to_string(),
                required: amount,
                available: self.energy,
                capacity: self.battery_capacity,
            });
        }
        self.energy -= amount;
        Ok(())
    }

    pub fn can_transmit_to(&self, receiver: &SensorNode, packets: u32) -> bool {
        self.hop_cost_to(receiver).transmit_for(packets) <= self.energy
    }

    /// Pay the transmit cost of `packets` packets to `receiver`
    pub fn transmit_to(&mut self, receiver: &SensorNode, packets: u32) -> NodeResult<()> {
        let amount = self.hop_cost_to(receiver).transmit_for(packets);
        self.spend(amount)
    }

    pub fn can_receive_from(&self, sender: &SensorNode, packets: u32) -> bool {
        sender.hop_cost_to(self).receive_for(packets) <= self.energy
    }

    /// Pay the receive cost of `packets` packets from `sender`
    pub fn receive_from(&mut self, sender: &SensorNode, packets: u32) -> NodeResult<()> {
        let amount = sender.hop_cost_to(self).receive_for(packets);
        self.spend(amount)
    }

    // ---- packets ----

    fn unsupported(&self, operation: &'static str) -> NodeError {
        NodeError::Unsupported {
            node: self.label().to_string(),
            kind: self.kind(),
            operation,
        }
    }

    /// Remaining packets of a data node; zero for other roles
    pub fn packets_left(&self) -> u32 {
        self.as_data().map(DataState::packets_left).unwrap_or(0)
    }

    /// Per-packet value of a data node; zero for other roles
    pub fn packet_value(&self) -> u32 {
        self.as_data().map(DataState::packet_value).unwrap_or(0)
    }

    /// Data nodes: no packets left. Other roles never hold packets to offload.
    pub fn is_empty(&self) -> bool {
        self.packets_left() < 1
    }

    /// Used space of a storage node; zero for other roles
    pub fn used_space(&self) -> u32 {
        self.as_storage().map(StorageState::used_space).unwrap_or(0)
    }

    /// Free space of a storage node; zero for other roles
    pub fn space_left(&self) -> u32 {
        self.as_storage().map(StorageState::space_left).unwrap_or(0)
    }

    /// Storage nodes: no space left. Other roles are always full.
    pub fn is_full(&self) -> bool {
        self.space_left() == 0
    }

    /// Energy that would be spent keeping the stored packets
    pub fn storage_cost(&self) -> MicroJoules {
        cost::storage_cost(self.used_space())
    }

    /// Change the overflow packet count; packets left is refilled
    pub fn set_overflow_packets(&mut self, overflow_packets: u32) -> NodeResult<()> {
        match &mut self.role {
            NodeRole::Data(state) => {
                state.overflow_packets = overflow_packets;
                state.packets_left = overflow_packets;
                Ok(())
            }
            _ => Err(self.unsupported("overflow packets")),
        }
    }

    /// Change the storage capacity; used space is cleared
    pub fn set_capacity(&mut self, capacity: u32) -> NodeResult<()> {
        match &mut self.role {
            NodeRole::Storage(state) => {
                state.capacity = capacity;
                state.used_space = 0;
                Ok(())
            }
            _ => Err(self.unsupported("storage capacity")),
        }
    }

    /// Restore packet state to its configured defaults
    pub fn reset_packets(&mut self) {
        match &mut self.role {
            NodeRole::Data(state) => state.packets_left = state.overflow_packets,
            NodeRole::Storage(state) => state.used_space = 0,
            NodeRole::Transition => {}
        }
    }

    pub fn can_offload_to(&self, receiver: &SensorNode, packets: u32) -> bool {
        self.can(Capability::Generate)
            && self.packets_left() >= packets
            && self.can_transmit_to(receiver, packets)
    }

    /// Send `packets` of this node's own packets to `receiver`
    pub fn offload_to(&mut self, receiver: &SensorNode, packets: u32) -> NodeResult<()> {
        let left = match &self.role {
            NodeRole::Data(state) => state.packets_left,
            _ => return Err(self.unsupported("offload")),
        };
        if packets > left {
            return Err(NodeError::InsufficientPackets {
                node: self.label().to_string(),
                left,
                requested: packets,
            });
        }
        self.transmit_to(receiver, packets)?;
        if let NodeRole::Data(state) = &mut self.role {
            state.packets_left -= packets;
        }
        Ok(())
    }

    /// Drop `packets` packets that will never be delivered
    pub fn discard_packets(&mut self, packets: u32) -> NodeResult<()> {
        let label = self.label().to_string();
        match &mut self.role {
            NodeRole::Data(state) => {
                if packets > state.packets_left {
                    return Err(NodeError::InsufficientPackets {
                        node: label,
                        left: state.packets_left,
                        requested: packets,
                    });
                }
                state.packets_left -= packets;
                Ok(())
            }
            _ => Err(self.unsupported("discard")),
        }
    }

    pub fn can_store_from(&self, sender: &SensorNode, packets: u32) -> bool {
        self.can(Capability::Store)
            && self.space_left() >= packets
            && self.can_receive_from(sender, packets)
    }

    /// Receive `packets` from `sender` and keep them
    pub fn store_from(&mut self, sender: &SensorNode, packets: u32) -> NodeResult<()> {
        let space_left = match &self.role {
            NodeRole::Storage(state) => state.space_left(),
            _ => return Err(self.unsupported("store")),
        };
        if packets > space_left {
            return Err(NodeError::StorageFull {
                node: self.label().to_string(),
                space_left,
                requested: packets,
            });
        }
        self.receive_from(sender, packets)?;
        if let NodeRole::Storage(state) = &mut self.role {
            state.used_space += packets;
        }
        Ok(())
    }
}

impl Display for SensorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<14}({:.6}, {:.6}) [{}]",
            self.label(),
            self.position.x,
            self.position.y,
            self.id()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdAllocator;

    fn data_node(ids: &mut IdAllocator, x: f64, battery: u64, packets: u32) -> SensorNode {
        SensorNode::new(
            ids.allocate(NodeKind::Data),
            Position::new(x, 0.0),
            20.0,
            battery,
            NodeRole::Data(DataState::new(packets, 100)),
        )
    }

    fn storage_node(ids: &mut IdAllocator, x: f64, battery: u64, capacity: u32) -> SensorNode {
        SensorNode::new(
            ids.allocate(NodeKind::Storage),
            Position::new(x, 0.0),
            20.0,
            battery,
            NodeRole::Storage(StorageState::new(capacity)),
        )
    }

    #[test]
    fn test_capabilities_by_role() {
        let mut ids = IdAllocator::new();
        let dn = data_node(&mut ids, 0.0, 1000, 5);
        let sn = storage_node(&mut ids, 10.0, 1000, 5);
        let tn = SensorNode::new(
            ids.allocate(NodeKind::Transition),
            Position::new(5.0, 0.0),
            20.0,
            1000,
            NodeRole::Transition,
        );

        assert!(dn.can(Capability::Generate));
        assert!(!dn.can(Capability::Store));
        assert!(sn.can(Capability::Store));
        assert!(!sn.can(Capability::Generate));
        assert!(tn.can(Capability::Relay));
        assert!(!tn.can(Capability::Store));
        assert!(!tn.can(Capability::Generate));
    }

    #[test]
    fn test_in_range_uses_smaller_range_with_tolerance() {
        let mut ids = IdAllocator::new();
        let a = data_node(&mut ids, 0.0, 0, 0);
        let mut b = storage_node(&mut ids, 20.00005, 0, 0);
        assert!(a.in_range_of(&b));

        b.range = 10.0;
        assert!(!a.in_range_of(&b));
        assert!(!b.in_range_of(&a));
    }

    #[test]
    fn test_transmit_rejects_without_mutation() {
        let mut ids = IdAllocator::new();
        let mut dn = data_node(&mut ids, 0.0, 500, 5);
        let sn = storage_node(&mut ids, 10.0, 500, 5);

        // 2 packets over 10 m cost 704 uJ
        assert!(!dn.can_transmit_to(&sn, 2));
        let err = dn.transmit_to(&sn, 2).unwrap_err();
        assert!(matches!(err, NodeError::InsufficientEnergy { required: 704, .. }));
        assert_eq!(dn.energy(), 500);

        dn.transmit_to(&sn, 1).unwrap();
        assert_eq!(dn.energy(), 500 - 352);
    }

    #[test]
    fn test_store_from_updates_space_and_energy() {
        let mut ids = IdAllocator::new();
        let dn = data_node(&mut ids, 0.0, 10_000, 5);
        let mut sn = storage_node(&mut ids, 10.0, 10_000, 3);

        sn.store_from(&dn, 2).unwrap();
        assert_eq!(sn.used_space(), 2);
        assert_eq!(sn.space_left(), 1);
        assert_eq!(sn.energy(), 10_000 - 640);

        let err = sn.store_from(&dn, 2).unwrap_err();
        assert!(matches!(err, NodeError::StorageFull { space_left: 1, .. }));
        assert_eq!(sn.used_space(), 2);
    }

    #[test]
    fn test_role_unsupported_operations() {
        let mut ids = IdAllocator::new();
        let mut dn = data_node(&mut ids, 0.0, 10_000, 5);
        let mut sn = storage_node(&mut ids, 10.0, 10_000, 3);

        assert!(matches!(
            dn.store_from(&sn, 1),
            Err(NodeError::Unsupported { kind: NodeKind::Data, .. })
        ));
        assert!(matches!(
            sn.offload_to(&dn, 1),
            Err(NodeError::Unsupported { kind: NodeKind::Storage, .. })
        ));
        assert!(matches!(
            sn.discard_packets(1),
            Err(NodeError::Unsupported { .. })
        ));
        assert!(dn.set_capacity(4).is_err());
        assert!(!dn.can_store_from(&sn, 1));
        assert!(!sn.can_offload_to(&dn, 1));
    }

    #[test]
    fn test_discard_never_clamps() {
        let mut ids = IdAllocator::new();
        let mut dn = data_node(&mut ids, 0.0, 0, 5);

        let err = dn.discard_packets(6).unwrap_err();
        assert!(matches!(err, NodeError::InsufficientPackets { left: 5, requested: 6, .. }));
        assert_eq!(dn.packets_left(), 5);

        dn.discard_packets(5).unwrap();
        assert!(dn.is_empty());
        assert_eq!(dn.as_data().unwrap().overflow_packets(), 5);
    }

    #[test]
    fn test_offload_decrements_packets_left() {
        let mut ids = IdAllocator::new();
        let mut dn = data_node(&mut ids, 0.0, 10_000, 5);
        let sn = storage_node(&mut ids, 10.0, 10_000, 3);

        dn.offload_to(&sn, 3).unwrap();
        assert_eq!(dn.packets_left(), 2);
        assert!(dn.offload_to(&sn, 3).is_err());
        assert_eq!(dn.packets_left(), 2);
    }

    #[test]
    fn test_resets_restore_defaults() {
        let mut ids = IdAllocator::new();
        let mut dn = data_node(&mut ids, 0.0, 10_000, 5);
        let mut sn = storage_node(&mut ids, 10.0, 10_000, 3);

        dn.offload_to(&sn, 2).unwrap();
        sn.store_from(&dn, 2).unwrap();

        dn.reset_packets();
        dn.reset_energy();
        sn.reset_packets();
        sn.reset_energy();

        assert_eq!(dn.packets_left(), 5);
        assert_eq!(dn.energy(), 10_000);
        assert_eq!(sn.used_space(), 0);
        assert_eq!(sn.energy(), 10_000);
    }

    #[test]
    fn test_set_battery_capacity_refills() {
        let mut ids = IdAllocator::new();
        let mut dn = data_node(&mut ids, 0.0, 1000, 5);
        let sn = storage_node(&mut ids, 10.0, 1000, 3);
        dn.transmit_to(&sn, 1).unwrap();

        dn.set_battery_capacity(2000);
        assert_eq!(dn.energy(), 2000);
        assert_eq!(dn.battery_capacity(), 2000);
    }

    #[test]
    fn test_storage_cost_tracks_used_space() {
        let mut ids = IdAllocator::new();
        let dn = data_node(&mut ids, 0.0, 10_000, 5);
        let mut sn = storage_node(&mut ids, 10.0, 10_000, 3);
        assert_eq!(sn.storage_cost(), 0);
        sn.store_from(&dn, 2).unwrap();
        assert_eq!(sn.storage_cost(), 640);
    }

    #[test]
    fn test_display_format() {
        let mut ids = IdAllocator::new();
        let dn = data_node(&mut ids, 1.5, 0, 0);
        assert_eq!(dn.to_string(), "DN01          (1.500000, 0.000000) [1]");
    }
}
