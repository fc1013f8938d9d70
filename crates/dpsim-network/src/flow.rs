//! Min-cost flow export
//!
//! The network is flattened into a bipartite flow problem for an external
//! min-cost-flow solver, written in the DIMACS `p min` format:
//!
//! ```text
//! source -> DNi     capacity = packets of DNi     cost 0
//! DNi    -> SNj     capacity = packets of DNi     cost -profit(DNi, SNj)
//! DNi    -> dummy   capacity = packets of DNi     cost 0
//! SNj    -> sink    capacity = capacity of SNj    cost 0
//! dummy  -> sink    capacity = total supply       cost 0
//! ```
//!
//! Minimising cost therefore maximises preserved profit, and the dummy node
//! soaks up packets that are not worth storing. Flow nodes are numbered from
//! 1: the source, then data and storage nodes in network order, then the
//! dummy, then the sink.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use dpsim_core::{NodeId, NodeKind};
use tracing::{debug, info};

use crate::error::NetworkResult;
use crate::network::SensorNetwork;

/// A node of the flow problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlowEndpoint {
    Source,
    Node(NodeId),
    /// Absorbs packets that are discarded instead of stored
    Dummy,
    Sink,
}

/// Bidirectional map between flow indices and endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowIndex {
    /// Data and storage nodes, in network order; flow index = position + 2
    members: Vec<NodeId>,
    positions: BTreeMap<NodeId, usize>,
}

impl FlowIndex {
    /// Index the data and storage nodes of a network
    pub fn for_network(network: &SensorNetwork) -> Self {
        let members: Vec<NodeId> = network
            .nodes()
            .iter()
            .filter(|node| matches!(node.kind(), NodeKind::Data | NodeKind::Storage))
            .map(|node| node.id())
            .collect();
        let positions = members
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect();
        Self { members, positions }
    }

    /// Number of flow nodes, source and sink included
    pub fn node_count(&self) -> usize {
        self.members.len() + 3
    }

    pub fn source(&self) -> usize {
        1
    }

    pub fn dummy(&self) -> usize {
        self.members.len() + 2
    }

    pub fn sink(&self) -> usize {
        self.members.len() + 3
    }

    /// Flow index of an endpoint; `None` for nodes that are not indexed
    pub fn index_of(&self, endpoint: FlowEndpoint) -> Option<usize> {
        match endpoint {
            FlowEndpoint::Source => Some(self.source()),
            FlowEndpoint::Node(id) => self.positions.get(&id).map(|position| position + 2),
            FlowEndpoint::Dummy => Some(self.dummy()),
            FlowEndpoint::Sink => Some(self.sink()),
        }
    }

    /// Endpoint behind a flow index
    pub fn endpoint(&self, index: usize) -> Option<FlowEndpoint> {
        match index {
            0 => None,
            1 => Some(FlowEndpoint::Source),
            i if i == self.dummy() => Some(FlowEndpoint::Dummy),
            i if i == self.sink() => Some(FlowEndpoint::Sink),
            i => self.members.get(i - 2).map(|id| FlowEndpoint::Node(*id)),
        }
    }
}

/// One arc of the flow problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowArc {
    pub tail: FlowEndpoint,
    pub head: FlowEndpoint,
    pub capacity: u64,
    pub cost: i64,
    /// Human-readable description, written as a `c` line
    pub comment: String,
}

/// The flow problem derived from a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowNetwork {
    index: FlowIndex,
    supply: u64,
    arcs: Vec<FlowArc>,
}

impl FlowNetwork {
    pub fn index(&self) -> &FlowIndex {
        &self.index
    }

    /// Packets entering at the source and leaving at the sink
    pub fn supply(&self) -> u64 {
        self.supply
    }

    pub fn arcs(&self) -> &[FlowArc] {
        &self.arcs
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    fn idx(&self, endpoint: FlowEndpoint) -> usize {
        // Every arc endpoint was indexed when the arc was created
        self.index.index_of(endpoint).unwrap_or(0)
    }

    /// Write the problem in DIMACS format
    pub fn write_dimacs<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.to_string().as_bytes())
    }

    /// Save the problem to a file
    pub fn save(&self, path: impl AsRef<Path>) -> NetworkResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_string())?;
        info!(
            path = %path.display(),
            nodes = self.index.node_count(),
            arcs = self.arcs.len(),
            "Saved flow network"
        );
        Ok(())
    }
}

impl Display for FlowNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.index.node_count();
        let source = self.index.source();
        let sink = self.index.sink();

        writeln!(
            f,
            "c Min-cost flow problem with {nodes} nodes and {} arcs",
            self.arcs.len()
        )?;
        writeln!(f, "p min {nodes} {}", self.arcs.len())?;
        writeln!(f, "c Supply of {} at node {source} (source)", self.supply)?;
        writeln!(f, "n {source} {}", self.supply)?;
        writeln!(f, "c Demand of {} at node {sink} (sink)", self.supply)?;
        writeln!(f, "n {sink} -{}", self.supply)?;
        writeln!(f, "c arc list follows")?;
        writeln!(f, "c arc has <tail> <head> <capacity l.b.> <capacity u.b.> <cost>")?;

        for arc in &self.arcs {
            writeln!(f, "c {}", arc.comment)?;
            writeln!(
                f,
                "a {} {} 0 {} {}",
                self.idx(arc.tail),
                self.idx(arc.head),
                arc.capacity,
                arc.cost
            )?;
        }
        Ok(())
    }
}

impl SensorNetwork {
    /// Build the max-profit flow problem for the current node state
    ///
    /// Data-to-storage arcs are only emitted for pairs with a feasible path.
    pub fn flow_network(&self) -> NetworkResult<FlowNetwork> {
        let index = FlowIndex::for_network(self);
        let supply: u64 = self.data_nodes().map(|dn| u64::from(dn.packets_left())).sum();
        let mut arcs = Vec::new();

        for dn in self.data_nodes() {
            arcs.push(FlowArc {
                tail: FlowEndpoint::Source,
                head: FlowEndpoint::Node(dn.id()),
                capacity: u64::from(dn.packets_left()),
                cost: 0,
                comment: format!("Source -> {}", dn.label()),
            });
        }

        for dn in self.data_nodes() {
            let packets = u64::from(dn.packets_left());
            for sn in self.storage_nodes() {
                let path = self.min_cost_path(dn.id(), sn.id())?;
                if path.len() < 2 {
                    debug!(from = %dn.label(), to = %sn.label(), "No feasible path, arc omitted");
                    continue;
                }
                let cost = self.calculate_cost_of_path(&path)?;
                let profit = i64::from(dn.packet_value()) - cost as i64;
                arcs.push(FlowArc {
                    tail: FlowEndpoint::Node(dn.id()),
                    head: FlowEndpoint::Node(sn.id()),
                    capacity: packets,
                    cost: -profit,
                    comment: format!("{} -> {}", dn.label(), sn.label()),
                });
            }
            arcs.push(FlowArc {
                tail: FlowEndpoint::Node(dn.id()),
                head: FlowEndpoint::Dummy,
                capacity: packets,
                cost: 0,
                comment: format!("{} -> Dummy", dn.label()),
            });
        }

        for sn in self.storage_nodes() {
            arcs.push(FlowArc {
                tail: FlowEndpoint::Node(sn.id()),
                head: FlowEndpoint::Sink,
                capacity: u64::from(sn.space_left()),
                cost: 0,
                comment: format!("{} -> Sink", sn.label()),
            });
        }
        arcs.push(FlowArc {
            tail: FlowEndpoint::Dummy,
            head: FlowEndpoint::Sink,
            capacity: supply,
            cost: 0,
            comment: "Dummy -> Sink".to_string(),
        });

        Ok(FlowNetwork {
            index,
            supply,
            arcs,
        })
    }
}
