//! # dpsim Models
//!
//! Scheduling strategies that decide which data packets get preserved, and
//! where.
//!
//! ## Core Components
//!
//! - [`Model`]: the uniform contract (`run`, totals, route report)
//! - [`PriorityGreedyModel`]: most valuable data first, cheapest storage first
//! - [`ProfitGreedyModel`]: most profitable destination per batch, discards
//!   unprofitable packets
//! - [`ExternalFlowModel`]: optimal allocation from a min-cost-flow solver
//! - [`compare`]: run several models on the same topology
//!
//! Each model owns its [`SensorNetwork`](dpsim_network::SensorNetwork) and
//! resets packets and energy at the start of every run.
//!
//! ## Example
//!
//! ```rust
//! use dpsim_core::NetworkConfig;
//! use dpsim_models::{Model, PriorityGreedyModel};
//! use dpsim_network::SensorNetwork;
//!
//! let mut builder = SensorNetwork::builder(NetworkConfig {
//!     packets_per_node: 5,
//!     capacity_per_node: 3,
//!     ..NetworkConfig::default()
//! });
//! builder.data_node(0.0, 0.0, 1_000);
//! builder.storage_node(10.0, 0.0);
//!
//! let mut model = PriorityGreedyModel::new(builder.build().unwrap());
//! model.run().unwrap();
//! assert_eq!(model.total_packets().unwrap(), 3);
//! assert_eq!(model.total_value().unwrap(), 3_000);
//! ```

pub mod compare;
pub mod error;
pub mod external;
pub mod greedy;
pub mod model;
pub mod profit;
pub mod solution;

pub use compare::{ComparisonReport, ModelSummary, compare};
pub use error::{FlowError, ModelError, ModelResult};
pub use external::{ExternalFlowModel, FlowSolver, ProcessFlowSolver};
pub use greedy::PriorityGreedyModel;
pub use model::{Model, ModelOutcome, RouteRecord};
pub use profit::ProfitGreedyModel;
pub use solution::{ArcFlow, FlowRoute, FlowSolution, NodeFlows, decompose};
