//! Model error types

use thiserror::Error;

use dpsim_network::NetworkError;

/// Errors raised while reading or decomposing a flow solution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// A solver reported negative flow on an arc
    #[error("Flow from {from} -> {to} is negative ({flow})")]
    NegativeFlow { from: String, to: String, flow: i64 },

    /// An arc refers to a flow node that does not exist
    #[error("Flow arc {tail} -> {head} has an unknown endpoint")]
    UnknownArcEndpoint { tail: usize, head: usize },

    /// Flow entering a node does not match flow leaving it
    #[error("Flow at {node} is unbalanced by {residual} packets")]
    Unbalanced { node: String, residual: i64 },

    /// Malformed solution line
    #[error("Invalid solution line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// Errors raised by a [`Model`](crate::Model)
#[derive(Debug, Error)]
pub enum ModelError {
    /// Results were requested before the model completed a run
    #[error("Model '{model}' has not been run yet")]
    NotRun { model: String },

    /// Episode count must be at least one
    #[error("Invalid episode count {0}; at least one episode is required")]
    InvalidEpisodes(usize),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    /// The external flow solver failed
    #[error("Solver error: {0}")]
    Solver(String),
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;
