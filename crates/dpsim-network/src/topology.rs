//! Geometric adjacency between sensor nodes
//!
//! Two nodes are adjacent iff their distance is within the smaller of their
//! transmission ranges (plus a small tolerance). The relation is undirected,
//! computed once when a network is built, and never changes afterwards.

use std::collections::{BTreeMap, BTreeSet};

use dpsim_core::{NodeId, SensorNode};

/// Undirected adjacency relation over node ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjacency {
    neighbors: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl Adjacency {
    /// Build the relation from node positions and ranges
    pub fn from_nodes(nodes: &[SensorNode]) -> Self {
        let mut neighbors: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();

        for (i, a) in nodes.iter().enumerate() {
            neighbors.entry(a.id()).or_default();
            for b in &nodes[i + 1..] {
                neighbors.entry(b.id()).or_default();
                if a.in_range_of(b) {
                    neighbors.entry(a.id()).or_default().insert(b.id());
                    neighbors.entry(b.id()).or_default().insert(a.id());
                }
            }
        }

        Self { neighbors }
    }

    /// Neighbors of a node, in id order
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors
            .get(&node)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Number of neighbors of a node
    pub fn degree(&self, node: NodeId) -> usize {
        self.neighbors.get(&node).map(BTreeSet::len).unwrap_or(0)
    }

    /// Check if two nodes are directly connected
    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors
            .get(&a)
            .map(|set| set.contains(&b))
            .unwrap_or(false)
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.neighbors.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Number of nodes in the relation
    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Whether every node is reachable from every other node
    ///
    /// An empty relation is not connected.
    pub fn is_connected(&self) -> bool {
        let Some(&start) = self.neighbors.keys().next() else {
            return false;
        };

        let mut stack = vec![start];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            stack.extend(self.neighbors(current).filter(|n| !seen.contains(n)));
        }

        seen.len() == self.neighbors.len()
    }

    /// Iterate over `(node, neighbors)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &BTreeSet<NodeId>)> {
        self.neighbors.iter().map(|(id, set)| (*id, set))
    }
}
