//! Generation parameters and network overrides taken from the command line
//!
//! Parameters start from a JSON file (or the defaults) and individual flags
//! override single fields on top.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use dpsim_core::{GenerationParams, ValueRange};
use dpsim_network::SensorNetwork;
use tracing::debug;

/// Flags that override fields of [`GenerationParams`]
#[derive(Debug, Clone, Default, Args)]
pub struct GenerationOverrides {
    /// JSON file with generation parameters
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Field width in metres
    #[arg(long)]
    pub width: Option<f64>,

    /// Field length in metres
    #[arg(long)]
    pub length: Option<f64>,

    /// Transmission range in metres
    #[arg(long)]
    pub range: Option<f64>,

    /// Total number of nodes
    #[arg(short = 'n', long)]
    pub nodes: Option<usize>,

    /// Number of data nodes
    #[arg(short = 'p', long)]
    pub data: Option<usize>,

    /// Number of storage nodes
    #[arg(short = 's', long)]
    pub storage: Option<usize>,

    /// Overflow packets per data node
    #[arg(short = 'q', long)]
    pub packets: Option<u32>,

    /// Storage capacity per storage node
    #[arg(short = 'm', long)]
    pub capacity: Option<u32>,

    /// Battery capacity per node in micro-joules
    #[arg(long)]
    pub battery: Option<u64>,

    /// Lowest per-packet value
    #[arg(long)]
    pub min_value: Option<u32>,

    /// Highest per-packet value
    #[arg(long)]
    pub max_value: Option<u32>,
}

impl GenerationOverrides {
    /// Parameters from the file (or defaults) with every given flag applied
    pub fn resolve(&self) -> anyhow::Result<GenerationParams> {
        let mut params = match &self.params {
            Some(path) => load_params(path)?,
            None => GenerationParams::default(),
        };
        self.apply(&mut params)?;
        params.validate()?;
        Ok(params)
    }

    pub fn apply(&self, params: &mut GenerationParams) -> anyhow::Result<()> {
        let network = &mut params.network;
        if let Some(width) = self.width {
            network.width = width;
        }
        if let Some(length) = self.length {
            network.length = length;
        }
        if let Some(range) = self.range {
            network.transmission_range = range;
        }
        if let Some(packets) = self.packets {
            network.packets_per_node = packets;
        }
        if let Some(capacity) = self.capacity {
            network.capacity_per_node = capacity;
        }
        if let Some(battery) = self.battery {
            network.battery_capacity = battery;
        }
        if let Some(nodes) = self.nodes {
            params.node_count = nodes;
        }
        if let Some(data) = self.data {
            params.data_nodes = data;
        }
        if let Some(storage) = self.storage {
            params.storage_nodes = storage;
        }
        if self.min_value.is_some() || self.max_value.is_some() {
            params.value_range = ValueRange::new(
                self.min_value.unwrap_or(params.value_range.min),
                self.max_value.unwrap_or(params.value_range.max),
            )?;
        }
        Ok(())
    }
}

/// Read generation parameters from a JSON file
pub fn load_params(path: &Path) -> anyhow::Result<GenerationParams> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameters from {}", path.display()))?;
    let params = serde_json::from_str(&text)
        .with_context(|| format!("Invalid parameters in {}", path.display()))?;
    debug!(path = %path.display(), "Loaded generation parameters");
    Ok(params)
}

/// Flags that override the templates of a loaded snapshot
#[derive(Debug, Clone, Default, Args)]
pub struct NetworkOverrides {
    /// Overflow packets per data node
    #[arg(short = 'q', long)]
    pub packets: Option<u32>,

    /// Storage capacity per storage node
    #[arg(short = 'm', long)]
    pub capacity: Option<u32>,

    /// Battery capacity per node in micro-joules
    #[arg(long)]
    pub battery: Option<u64>,
}

impl NetworkOverrides {
    pub fn apply(&self, network: &mut SensorNetwork) -> anyhow::Result<()> {
        if let Some(packets) = self.packets {
            network.set_overflow_packets(packets)?;
        }
        if let Some(capacity) = self.capacity {
            network.set_storage_capacity(capacity)?;
        }
        if let Some(battery) = self.battery {
            network.set_battery_capacity(battery);
        }
        Ok(())
    }
}

/// Load a snapshot and apply the overrides
pub fn load_network(path: &Path, overrides: &NetworkOverrides) -> anyhow::Result<SensorNetwork> {
    let mut network = SensorNetwork::load(path)
        .with_context(|| format!("Failed to load network from {}", path.display()))?;
    overrides.apply(&mut network)?;
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let overrides = GenerationOverrides {
            nodes: Some(12),
            data: Some(2),
            storage: Some(5),
            packets: Some(4),
            max_value: Some(99),
            ..Default::default()
        };
        let params = overrides.resolve().unwrap();
        assert_eq!(params.node_count, 12);
        assert_eq!(params.data_nodes, 2);
        assert_eq!(params.storage_nodes, 5);
        assert_eq!(params.network.packets_per_node, 4);
        assert_eq!(params.value_range, ValueRange::new(1, 99).unwrap());
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        fs::write(&path, serde_json::to_string(&GenerationParams::small()).unwrap()).unwrap();

        let overrides = GenerationOverrides {
            params: Some(path),
            battery: Some(42),
            ..Default::default()
        };
        let params = overrides.resolve().unwrap();
        assert_eq!(params.node_count, GenerationParams::small().node_count);
        assert_eq!(params.network.battery_capacity, 42);
    }

    #[test]
    fn test_invalid_overrides_rejected() {
        let inverted = GenerationOverrides {
            min_value: Some(10),
            max_value: Some(5),
            ..Default::default()
        };
        assert!(inverted.resolve().is_err());

        let too_many_roles = GenerationOverrides {
            nodes: Some(3),
            data: Some(2),
            storage: Some(2),
            ..Default::default()
        };
        assert!(too_many_roles.resolve().is_err());
    }

    #[test]
    fn test_missing_params_file() {
        let overrides = GenerationOverrides {
            params: Some(PathBuf::from("/nonexistent/params.json")),
            ..Default::default()
        };
        let err = overrides.resolve().unwrap_err();
        assert!(err.to_string().contains("Failed to read parameters"));
    }
}
