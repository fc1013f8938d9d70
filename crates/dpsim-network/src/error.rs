//! Network error types
//!
//! Wraps the core node and configuration errors and adds errors raised by
//! the graph, the transfer engine, and snapshot loading.

use thiserror::Error;

pub use dpsim_core::{ConfigError, NodeError};
use dpsim_core::{NodeId, NodeKind};

/// Errors raised by a [`SensorNetwork`](crate::SensorNetwork)
#[derive(Debug, Error)]
pub enum NetworkError {
    /// A node rejected an operation
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    /// Invalid network parameters
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No node with this id exists
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    /// No node of this role has the given 1-based role id
    #[error("Invalid {kind} id {id}")]
    UnknownRoleId { kind: NodeKind, id: u32 },

    /// Malformed snapshot record
    #[error("Invalid snapshot line {line}: {reason}")]
    Snapshot { line: usize, reason: String },

    /// Snapshot file could not be read or written
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A transfer was requested that the feasibility check rejects
    #[error(
        "Cannot send {packets} packets from {from} ({packets_left} packets left) -> {to} ({space_left} space left)"
    )]
    TransferRejected {
        from: String,
        to: String,
        packets: u32,
        packets_left: u32,
        space_left: u32,
    },

    /// Random generation never produced a connected network
    #[error("Failed to create a connected network after {attempts} tries")]
    Disconnected { attempts: usize },

    /// State the engine guarantees cannot happen; always a bug
    #[error("Internal consistency failure between {from} and {to}: {reason}")]
    Consistency {
        from: String,
        to: String,
        reason: String,
    },
}

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;
