//! # dpsim Core
//!
//! Node model, cost functions, configuration templates, and errors for the
//! dpsim wireless sensor network data preservation simulator.
//!
//! ## Key Types
//!
//! - [`SensorNode`]: one sensor with position, range, battery, and a [`NodeRole`]
//! - [`Capability`]: what a role may do (generate, store, relay)
//! - [`IdAllocator`]: sequential ids and per-role labels for one network build
//! - [`HopCost`]: per-packet transmit/receive cost of a single hop
//! - [`NetworkConfig`] / [`GenerationParams`]: template values and generation input
//!
//! ## Cost Model
//!
//! Costs are integer micro-joules, rounded to nearest:
//!
//! - transmit: `round(3200 * (1e-7 + 1e-10 * d^2) * 1e6)` per packet
//! - receive: `round(3200 * 1e-7 * 1e6)` per packet
//! - storage: `round(used * 3200 * 1e-7 * 1e6)` (informational)

pub mod config;
pub mod cost;
pub mod error;
pub mod identity;
pub mod node;

pub use config::{GenerationParams, NetworkConfig, ValueRange};
pub use cost::{HopCost, MicroJoules};
pub use error::{ConfigError, NodeError, NodeResult};
pub use identity::{IdAllocator, NodeId, NodeIdentity, NodeKind};
pub use node::{Capability, DataState, NodeRole, Position, SensorNode, StorageState};
