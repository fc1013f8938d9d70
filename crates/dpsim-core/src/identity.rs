//! Node identity and id allocation
//!
//! Every node carries two identifiers:
//!
//! - a network-unique [`NodeId`] assigned in construction order, starting at 1
//! - a per-role label such as `DN01` or `SN12`, numbered within its role
//!
//! Both are handed out by an [`IdAllocator`] owned by whoever builds the
//! network, so two networks built side by side never share counters.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Network-unique node identifier (1-based, dense)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Zero-based position of this node in its network's node list
    ///
    /// `NodeId(0)` is never allocated; it maps to `usize::MAX` so that every
    /// bounds-checked lookup misses.
    pub fn index(self) -> usize {
        (self.0 as usize).checked_sub(1).unwrap_or(usize::MAX)
    }

    /// Id of the node stored at zero-based `index`, if it fits
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok()?.checked_add(1).map(Self)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role a node plays in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Generates overflow packets
    Data,
    /// Stores packets up to a capacity
    Storage,
    /// Relays only
    Transition,
}

impl NodeKind {
    /// Label prefix for nodes of this kind
    pub fn prefix(self) -> &'static str {
        match self {
            NodeKind::Data => "DN",
            NodeKind::Storage => "SN",
            NodeKind::Transition => "TN",
        }
    }

    /// Single-letter tag used in snapshot files
    pub fn tag(self) -> char {
        match self {
            NodeKind::Data => 'd',
            NodeKind::Storage => 's',
            NodeKind::Transition => 't',
        }
    }

    /// Parse a snapshot tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "d" => Some(NodeKind::Data),
            "s" => Some(NodeKind::Storage),
            "t" => Some(NodeKind::Transition),
            _ => None,
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Data => "data node",
            NodeKind::Storage => "storage node",
            NodeKind::Transition => "transition node",
        };
        f.write_str(name)
    }
}

/// Identity handed to a freshly constructed node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub id: NodeId,
    /// 1-based number within the node's role
    pub role_id: u32,
    pub label: String,
}

/// Sequential id source for one network build
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next_id: u32,
    next_data: u32,
    next_storage: u32,
    next_transition: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_data: 1,
            next_storage: 1,
            next_transition: 1,
        }
    }

    /// Allocate the next identity for a node of `kind`
    pub fn allocate(&mut self, kind: NodeKind) -> NodeIdentity {
        let counter = match kind {
            NodeKind::Data => &mut self.next_data,
            NodeKind::Storage => &mut self.next_storage,
            NodeKind::Transition => &mut self.next_transition,
        };
        let role_id = *counter;
        *counter += 1;

        let id = NodeId(self.next_id);
        self.next_id += 1;

        NodeIdentity {
            id,
            role_id,
            label: format!("{}{:02}", kind.prefix(), role_id),
        }
    }

    /// Number of identities handed out so far
    pub fn allocated(&self) -> u32 {
        self.next_id - 1
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
