//! Random network generation
//!
//! Nodes are scattered uniformly over the field. Each node draws its role
//! from a weighted choice (roughly 30% data, 40% storage, the rest
//! transition) that is overridden once the remaining slots are needed to
//! reach the requested data and storage counts exactly.

use dpsim_core::GenerationParams;
use rand::Rng;
use tracing::{debug, info};

use crate::error::{NetworkError, NetworkResult};
use crate::network::{NetworkBuilder, SensorNetwork};

/// Generation attempts allowed per node before giving up
pub const ATTEMPTS_PER_NODE: usize = 1000;

impl SensorNetwork {
    /// Generate a random connected network
    ///
    /// Parameters are validated before the first attempt. Placement is
    /// retried until the network is connected, up to
    /// `node_count * ATTEMPTS_PER_NODE` times.
    pub fn generate<R: Rng>(
        params: &GenerationParams,
        rng: &mut R,
    ) -> NetworkResult<SensorNetwork> {
        params.validate()?;

        let max_attempts = params.node_count.saturating_mul(ATTEMPTS_PER_NODE);
        for attempt in 1..=max_attempts {
            let network = place_nodes(params, rng)?;
            if network.is_connected() {
                info!(
                    attempt,
                    nodes = network.node_count(),
                    edges = network.edge_count(),
                    "Generated connected network"
                );
                return Ok(network);
            }
            debug!(attempt, "Generated network is disconnected, retrying");
        }

        Err(NetworkError::Disconnected {
            attempts: max_attempts,
        })
    }

    /// Generate with the thread-local random source
    pub fn random(params: &GenerationParams) -> NetworkResult<SensorNetwork> {
        Self::generate(params, &mut rand::rng())
    }
}

fn place_nodes<R: Rng>(
    params: &GenerationParams,
    rng: &mut R,
) -> NetworkResult<SensorNetwork> {
    let config = &params.network;
    let mut builder = NetworkBuilder::new(config.clone());
    let mut data_left = params.data_nodes;
    let mut storage_left = params.storage_nodes;

    for index in 0..params.node_count {
        let remaining = params.node_count - index;
        let choice: u32 = rng.random_range(1..=10);
        let x = config.width * rng.random::<f64>();
        let y = config.length * rng.random::<f64>();
        let value = rng.random_range(params.value_range.min..=params.value_range.max);

        if (choice < 4 && data_left > 0) || remaining <= data_left {
            builder.data_node(x, y, value);
            data_left -= 1;
        } else if (choice < 8 && storage_left > 0) || remaining <= data_left + storage_left {
            builder.storage_node(x, y);
            storage_left -= 1;
        } else {
            builder.transition_node(x, y);
        }
    }

    builder.build()
}
