//! # dpsim Network
//!
//! The sensor network graph and its energy-aware routing engine.
//!
//! ## Core Components
//!
//! - [`SensorNetwork`]: owns the nodes and the immutable adjacency relation
//! - [`NetworkBuilder`]: incremental construction with its own id allocator
//! - [`Adjacency`]: undirected geometric range relation
//! - [`Transfer`]: a committed multi-hop packet transfer
//! - [`FlowNetwork`]: max-profit min-cost-flow export
//!
//! ## Path & Transfer Engine
//!
//! [`SensorNetwork::min_cost_path`] is a Dijkstra search whose hops are gated
//! by [`hop_affordable`] for a single test packet against the *current*
//! residual energies. [`SensorNetwork::can_send_packets`] simulates a batch
//! along that path on a copy of the energies, and
//! [`SensorNetwork::send_packets`] commits it hop by hop, or fails without
//! touching anything.
//!
//! ## Example
//!
//! ```rust
//! use dpsim_core::NetworkConfig;
//! use dpsim_network::SensorNetwork;
//!
//! let mut builder = SensorNetwork::builder(NetworkConfig::default());
//! let dn = builder.data_node(0.0, 0.0, 5_000);
//! let sn = builder.storage_node(10.0, 0.0);
//! let mut network = builder.build().unwrap();
//!
//! assert_eq!(network.calculate_min_cost(dn, sn).unwrap(), 672);
//! let transfer = network.send_packets(dn, sn, 3).unwrap();
//! assert_eq!(transfer.total_cost(), 3 * 672);
//! ```

pub mod error;
pub mod flow;
pub mod generator;
pub mod network;
pub mod path;
pub mod snapshot;
pub mod topology;
pub mod transfer;

pub use error::{NetworkError, NetworkResult};
pub use flow::{FlowArc, FlowEndpoint, FlowIndex, FlowNetwork};
pub use network::{NetworkBuilder, SensorNetwork};
pub use path::{PROBE_PACKETS, hop_affordable};
pub use topology::Adjacency;
pub use transfer::Transfer;
