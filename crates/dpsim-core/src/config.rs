//! Network configuration templates
//!
//! These are the values applied when node state is (re)initialised. They are
//! distinct from each node's live, possibly drained, state.

use serde::{Deserialize, Serialize};

use crate::cost::MicroJoules;
use crate::error::ConfigError;

/// Global template values of a network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Field width in metres
    pub width: f64,
    /// Field length in metres
    pub length: f64,
    /// Transmission range of every node in metres
    pub transmission_range: f64,
    /// Overflow packets per data node
    pub packets_per_node: u32,
    /// Storage capacity per storage node
    pub capacity_per_node: u32,
    /// Battery capacity per node in micro-joules
    pub battery_capacity: MicroJoules,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            length: 1000.0,
            transmission_range: 250.0,
            packets_per_node: 100,
            capacity_per_node: 200,
            battery_capacity: 15_000_000,
        }
    }
}

impl NetworkConfig {
    /// Reject non-finite or non-positive field dimensions and ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("width", self.width),
            ("length", self.length),
            ("transmission_range", self.transmission_range),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        Ok(())
    }
}

/// Inclusive range of per-packet values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: u32,
    pub max: u32,
}

impl ValueRange {
    pub fn new(min: u32, max: u32) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidValueRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// A range holding exactly one value
    pub fn fixed(value: u32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self { min: 1, max: 10 }
    }
}

/// Parameters for generating a random network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(flatten)]
    pub network: NetworkConfig,
    /// Total number of nodes
    pub node_count: usize,
    /// Number of data nodes
    pub data_nodes: usize,
    /// Number of storage nodes
    pub storage_nodes: usize,
    /// Per-packet value range for data nodes
    pub value_range: ValueRange,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            node_count: 50,
            data_nodes: 10,
            storage_nodes: 20,
            value_range: ValueRange::default(),
        }
    }
}

impl GenerationParams {
    /// Small dense field, handy for quick experiments
    pub fn small() -> Self {
        Self {
            network: NetworkConfig {
                width: 100.0,
                length: 100.0,
                transmission_range: 50.0,
                packets_per_node: 10,
                capacity_per_node: 20,
                battery_capacity: 1_000_000,
            },
            node_count: 10,
            data_nodes: 3,
            storage_nodes: 4,
            value_range: ValueRange::default(),
        }
    }

    pub fn transition_nodes(&self) -> usize {
        self.node_count
            .saturating_sub(self.data_nodes + self.storage_nodes)
    }

    /// Total packets the data nodes need to offload
    pub fn total_supply(&self) -> u64 {
        self.data_nodes as u64 * u64::from(self.network.packets_per_node)
    }

    /// Total packets the storage nodes can hold
    pub fn total_capacity(&self) -> u64 {
        self.storage_nodes as u64 * u64::from(self.network.capacity_per_node)
    }

    /// Check the parameters before any generation attempt
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.network.validate()?;
        if self.node_count == 0 {
            return Err(ConfigError::EmptyNetwork);
        }
        if self.data_nodes + self.storage_nodes > self.node_count {
            return Err(ConfigError::TooManyRoles {
                data: self.data_nodes,
                storage: self.storage_nodes,
                total: self.node_count,
            });
        }
        if self.value_range.min > self.value_range.max {
            return Err(ConfigError::InvalidValueRange {
                min: self.value_range.min,
                max: self.value_range.max,
            });
        }
        if self.total_supply() > self.total_capacity() {
            return Err(ConfigError::CapacityImbalance {
                supply: self.total_supply(),
                capacity: self.total_capacity(),
            });
        }
        Ok(())
    }
}
