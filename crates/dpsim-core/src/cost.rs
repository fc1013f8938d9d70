//! Radio energy cost model
//!
//! First-order radio model: the electronics spend `E_ELEC` per bit on both
//! ends of a hop, and the transmit amplifier spends `E_AMP` per bit per
//! square metre of distance. All costs are converted from joules to integer
//! micro-joules by rounding to the nearest integer.

use serde::{Deserialize, Serialize};

/// Energy in micro-joules
pub type MicroJoules = u64;

/// Size of one data packet in bits
pub const BITS_PER_PACKET: f64 = 3200.0;

/// Electronics energy per bit (J/bit)
pub const E_ELEC: f64 = 1e-7;

/// Amplifier energy per bit per square metre (J/bit/m^2)
pub const E_AMP: f64 = 1e-10;

/// Storage energy per bit (J/bit)
pub const E_STORE: f64 = 1e-7;

const MICRO_PER_JOULE: f64 = 1e6;

fn to_micro_joules(joules: f64) -> MicroJoules {
    (joules * MICRO_PER_JOULE).round() as MicroJoules
}

/// Cost to transmit one packet over `distance` metres
pub fn transmission_cost(distance: f64) -> MicroJoules {
    to_micro_joules(BITS_PER_PACKET * (E_ELEC + E_AMP * distance * distance))
}

/// Cost to receive one packet (distance-independent)
pub fn reception_cost() -> MicroJoules {
    to_micro_joules(BITS_PER_PACKET * E_ELEC)
}

/// Cost of keeping `used_space` packets in storage.
///
/// Informational only; models never charge it against a node's battery.
pub fn storage_cost(used_space: u32) -> MicroJoules {
    to_micro_joules(f64::from(used_space) * BITS_PER_PACKET * E_STORE)
}

/// Per-packet cost of a single hop, split by the side that pays it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopCost {
    /// Paid by the sender
    pub transmit: MicroJoules,
    /// Paid by the receiver
    pub receive: MicroJoules,
}

impl HopCost {
    /// Cost of a hop spanning `distance` metres
    pub fn over(distance: f64) -> Self {
        Self {
            transmit: transmission_cost(distance),
            receive: reception_cost(),
        }
    }

    /// Combined per-packet cost, used as the edge weight in path search
    pub fn total(&self) -> MicroJoules {
        self.transmit + self.receive
    }

    /// Sender-side cost for `packets` packets
    pub fn transmit_for(&self, packets: u32) -> MicroJoules {
        self.transmit.saturating_mul(MicroJoules::from(packets))
    }

    /// Receiver-side cost for `packets` packets
    pub fn receive_for(&self, packets: u32) -> MicroJoules {
        self.receive.saturating_mul(MicroJoules::from(packets))
    }
}
