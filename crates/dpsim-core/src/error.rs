//! Error types for dpsim

use thiserror::Error;

use crate::identity::NodeKind;

/// Errors raised by a single sensor node when an operation is rejected
///
/// Every variant is returned before any state is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("{kind} {node} does not support {operation}")]
    Unsupported {
        node: String,
        kind: NodeKind,
        operation: &'static str,
    },

    #[error("{node} needs {required} uJ but has {available}/{capacity} uJ left")]
    InsufficientEnergy {
        node: String,
        required: u64,
        available: u64,
        capacity: u64,
    },

    #[error("{node} with {left} packets left cannot release {requested} packets")]
    InsufficientPackets {
        node: String,
        left: u32,
        requested: u32,
    },

    #[error("{node} with {space_left} spaces left cannot store {requested} packets")]
    StorageFull {
        node: String,
        space_left: u32,
        requested: u32,
    },

    #[error("{node}: a transfer must move at least one packet")]
    ZeroPackets { node: String },
}

/// Errors in network parameters, detected at construction or load time
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("network must contain at least one node")]
    EmptyNetwork,

    #[error("{data} data nodes and {storage} storage nodes do not fit in {total} nodes")]
    TooManyRoles {
        data: usize,
        storage: usize,
        total: usize,
    },

    #[error("invalid packet value range [{min}, {max}]")]
    InvalidValueRange { min: u32, max: u32 },

    #[error("{field} must be finite and positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("data packets ({supply}) exceed total storage capacity ({capacity})")]
    CapacityImbalance { supply: u64, capacity: u64 },
}

/// Result type for node operations
pub type NodeResult<T> = Result<T, NodeError>;
