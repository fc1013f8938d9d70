//! The sensor network graph
//!
//! A [`SensorNetwork`] owns its nodes and the adjacency relation between
//! them. Nodes and adjacency are fixed once the network is built; only
//! per-node energy and packet state changes afterwards.

use dpsim_core::{
    DataState, IdAllocator, NetworkConfig, NodeId, NodeKind, NodeRole, Position, SensorNode,
    StorageState,
};
use tracing::debug;

use crate::error::{NetworkError, NetworkResult};
use crate::topology::Adjacency;

/// A wireless sensor network on a rectangular field
#[derive(Debug, Clone)]
pub struct SensorNetwork {
    config: NetworkConfig,
    /// All nodes; `nodes[i].id() == NodeId::from_index(i)`
    nodes: Vec<SensorNode>,
    data_nodes: Vec<NodeId>,
    storage_nodes: Vec<NodeId>,
    transition_nodes: Vec<NodeId>,
    adjacency: Adjacency,
}

impl SensorNetwork {
    /// Start building a network with the given templates
    pub fn builder(config: NetworkConfig) -> NetworkBuilder {
        NetworkBuilder::new(config)
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn width(&self) -> f64 {
        self.config.width
    }

    pub fn length(&self) -> f64 {
        self.config.length
    }

    pub fn transmission_range(&self) -> f64 {
        self.config.transmission_range
    }

    // ---- node lookup ----

    /// All nodes in id order
    pub fn nodes(&self) -> &[SensorNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> NetworkResult<&SensorNode> {
        self.nodes
            .get(id.index())
            .filter(|node| node.id() == id)
            .ok_or(NetworkError::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> NetworkResult<&mut SensorNode> {
        self.nodes
            .get_mut(id.index())
            .filter(|node| node.id() == id)
            .ok_or(NetworkError::UnknownNode(id))
    }

    /// Ids of the data nodes, in construction order
    pub fn data_node_ids(&self) -> &[NodeId] {
        &self.data_nodes
    }

    pub fn storage_node_ids(&self) -> &[NodeId] {
        &self.storage_nodes
    }

    pub fn transition_node_ids(&self) -> &[NodeId] {
        &self.transition_nodes
    }

    pub fn data_nodes(&self) -> impl Iterator<Item = &SensorNode> {
        self.data_nodes.iter().map(|id| &self.nodes[id.index()])
    }

    pub fn storage_nodes(&self) -> impl Iterator<Item = &SensorNode> {
        self.storage_nodes.iter().map(|id| &self.nodes[id.index()])
    }

    pub fn transition_nodes(&self) -> impl Iterator<Item = &SensorNode> {
        self.transition_nodes.iter().map(|id| &self.nodes[id.index()])
    }

    pub fn data_node_count(&self) -> usize {
        self.data_nodes.len()
    }

    pub fn storage_node_count(&self) -> usize {
        self.storage_nodes.len()
    }

    pub fn transition_node_count(&self) -> usize {
        self.transition_nodes.len()
    }

    fn by_role_id(&self, kind: NodeKind, role_id: u32) -> NetworkResult<&SensorNode> {
        let ids = match kind {
            NodeKind::Data => &self.data_nodes,
            NodeKind::Storage => &self.storage_nodes,
            NodeKind::Transition => &self.transition_nodes,
        };
        (role_id as usize)
            .checked_sub(1)
            .and_then(|index| ids.get(index))
            .map(|id| &self.nodes[id.index()])
            .ok_or(NetworkError::UnknownRoleId { kind, id: role_id })
    }

    /// Data node by its 1-based role id (`DN01` is 1)
    pub fn data_node(&self, role_id: u32) -> NetworkResult<&SensorNode> {
        self.by_role_id(NodeKind::Data, role_id)
    }

    pub fn storage_node(&self, role_id: u32) -> NetworkResult<&SensorNode> {
        self.by_role_id(NodeKind::Storage, role_id)
    }

    pub fn transition_node(&self, role_id: u32) -> NetworkResult<&SensorNode> {
        self.by_role_id(NodeKind::Transition, role_id)
    }

    /// Two distinct nodes borrowed mutably at once
    pub(crate) fn pair_mut(
        &mut self,
        a: NodeId,
        b: NodeId,
    ) -> NetworkResult<(&mut SensorNode, &mut SensorNode)> {
        self.node(a)?;
        self.node(b)?;
        let (ia, ib) = (a.index(), b.index());
        if ia == ib {
            return Err(NetworkError::Consistency {
                from: self.nodes[ia].label().to_string(),
                to: self.nodes[ib].label().to_string(),
                reason: "a node cannot transfer to itself".to_string(),
            });
        }

        if ia < ib {
            let (left, right) = self.nodes.split_at_mut(ib);
            Ok((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.nodes.split_at_mut(ia);
            Ok((&mut right[0], &mut left[ib]))
        }
    }

    // ---- topology ----

    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.neighbors(id)
    }

    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency.are_adjacent(a, b)
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.edge_count()
    }

    /// Whether every node can reach every other node
    pub fn is_connected(&self) -> bool {
        self.adjacency.is_connected()
    }

    /// Whether the storage nodes can hold every overflow packet
    pub fn is_feasible(&self) -> bool {
        self.total_overflow_packets() <= self.total_storage_capacity()
    }

    pub fn total_overflow_packets(&self) -> u64 {
        self.data_nodes()
            .filter_map(SensorNode::as_data)
            .map(|state| u64::from(state.overflow_packets()))
            .sum()
    }

    pub fn total_storage_capacity(&self) -> u64 {
        self.storage_nodes()
            .filter_map(SensorNode::as_storage)
            .map(|state| u64::from(state.capacity()))
            .sum()
    }

    /// Packets currently held by storage nodes
    pub fn total_stored(&self) -> u64 {
        self.storage_nodes()
            .map(|node| u64::from(node.used_space()))
            .sum()
    }

    /// Drop `packets` undeliverable packets from a data node
    pub fn discard_packets(&mut self, id: NodeId, packets: u32) -> NetworkResult<()> {
        self.node_mut(id)?.discard_packets(packets)?;
        Ok(())
    }

    // ---- state resets and templates ----

    /// Restore packets left and used space to their configured values
    pub fn reset_packets(&mut self) {
        for node in &mut self.nodes {
            node.reset_packets();
        }
    }

    /// Refill every battery
    pub fn reset_energy(&mut self) {
        for node in &mut self.nodes {
            node.reset_energy();
        }
    }

    /// Apply a new overflow packet count to every data node
    pub fn set_overflow_packets(&mut self, packets: u32) -> NetworkResult<()> {
        self.config.packets_per_node = packets;
        for id in self.data_nodes.clone() {
            self.nodes[id.index()].set_overflow_packets(packets)?;
        }
        Ok(())
    }

    /// Apply a new capacity to every storage node
    pub fn set_storage_capacity(&mut self, capacity: u32) -> NetworkResult<()> {
        self.config.capacity_per_node = capacity;
        for id in self.storage_nodes.clone() {
            self.nodes[id.index()].set_capacity(capacity)?;
        }
        Ok(())
    }

    /// Apply a new battery capacity to every node and refill it
    pub fn set_battery_capacity(&mut self, battery_capacity: u64) {
        self.config.battery_capacity = battery_capacity;
        for node in &mut self.nodes {
            node.set_battery_capacity(battery_capacity);
        }
    }
}

/// Incremental network construction
///
/// Owns the [`IdAllocator`] for the network under construction, so ids and
/// labels restart at 1 for every builder.
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    config: NetworkConfig,
    ids: IdAllocator,
    nodes: Vec<SensorNode>,
}

impl NetworkBuilder {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            ids: IdAllocator::new(),
            nodes: Vec::new(),
        }
    }

    fn push(&mut self, kind: NodeKind, position: Position, role: NodeRole) -> NodeId {
        let identity = self.ids.allocate(kind);
        let id = identity.id;
        self.nodes.push(SensorNode::new(
            identity,
            position,
            self.config.transmission_range,
            self.config.battery_capacity,
            role,
        ));
        id
    }

    /// Add a data node carrying the template packet count
    pub fn data_node(&mut self, x: f64, y: f64, packet_value: u32) -> NodeId {
        let state = DataState::new(self.config.packets_per_node, packet_value);
        self.push(NodeKind::Data, Position::new(x, y), NodeRole::Data(state))
    }

    /// Add a storage node carrying the template capacity
    pub fn storage_node(&mut self, x: f64, y: f64) -> NodeId {
        let state = StorageState::new(self.config.capacity_per_node);
        self.push(NodeKind::Storage, Position::new(x, y), NodeRole::Storage(state))
    }

    pub fn transition_node(&mut self, x: f64, y: f64) -> NodeId {
        self.push(NodeKind::Transition, Position::new(x, y), NodeRole::Transition)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Compute adjacency and finish the network
    pub fn build(self) -> NetworkResult<SensorNetwork> {
        self.config.validate()?;

        let mut data_nodes = Vec::new();
        let mut storage_nodes = Vec::new();
        let mut transition_nodes = Vec::new();
        for node in &self.nodes {
            match node.kind() {
                NodeKind::Data => data_nodes.push(node.id()),
                NodeKind::Storage => storage_nodes.push(node.id()),
                NodeKind::Transition => transition_nodes.push(node.id()),
            }
        }

        let adjacency = Adjacency::from_nodes(&self.nodes);
        debug!(
            nodes = self.nodes.len(),
            edges = adjacency.edge_count(),
            data = data_nodes.len(),
            storage = storage_nodes.len(),
            "Built sensor network"
        );

        Ok(SensorNetwork {
            config: self.config,
            nodes: self.nodes,
            data_nodes,
            storage_nodes,
            transition_nodes,
            adjacency,
        })
    }
}
