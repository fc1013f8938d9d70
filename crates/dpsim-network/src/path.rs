//! Energy-aware minimum-cost path search
//!
//! Edge weight is the per-packet transmit cost of the hop plus the receive
//! cost at its far end. A hop may only be relaxed while both ends can
//! currently afford a single packet; the check is [`hop_affordable`], kept
//! separate from the search so it can be tested on its own.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use dpsim_core::{Capability, HopCost, MicroJoules, NodeId};
use tracing::trace;

use crate::error::NetworkResult;
use crate::network::SensorNetwork;

/// Packet count checked when gating a hop during the search
pub const PROBE_PACKETS: u32 = 1;

/// Whether a sender and receiver with the given residual energies can afford
/// moving `packets` packets over a hop
pub fn hop_affordable(
    sender_energy: MicroJoules,
    receiver_energy: MicroJoules,
    hop: &HopCost,
    packets: u32,
) -> bool {
    hop.transmit_for(packets) <= sender_energy && hop.receive_for(packets) <= receiver_energy
}

impl SensorNetwork {
    /// Per-packet cost of the hop `from -> to`
    pub fn hop_cost(&self, from: NodeId, to: NodeId) -> NetworkResult<HopCost> {
        Ok(self.node(from)?.hop_cost_to(self.node(to)?))
    }

    /// Cheapest currently feasible path from `from` to `to`, both inclusive
    ///
    /// Returns `[from]` when both ends are the same node and an empty path
    /// when `to` cannot be reached. Equal-cost alternatives resolve to the
    /// one discovered first.
    pub fn min_cost_path(&self, from: NodeId, to: NodeId) -> NetworkResult<Vec<NodeId>> {
        self.node(from)?;
        self.node(to)?;
        if from == to {
            return Ok(vec![from]);
        }

        let nodes = self.nodes();
        let mut best: Vec<Option<MicroJoules>> = vec![None; nodes.len()];
        let mut previous: Vec<Option<NodeId>> = vec![None; nodes.len()];
        let mut settled = vec![false; nodes.len()];
        let mut heap = BinaryHeap::new();
        let mut discovered: u64 = 0;

        best[from.index()] = Some(0);
        heap.push(Reverse((0, discovered, from)));

        while let Some(Reverse((cost, _, current))) = heap.pop() {
            if settled[current.index()] {
                continue;
            }
            settled[current.index()] = true;
            if current == to {
                break;
            }

            let sender = &nodes[current.index()];
            if current != from && !sender.can(Capability::Relay) {
                continue;
            }

            for next in self.neighbors(current) {
                if settled[next.index()] {
                    continue;
                }
                let receiver = &nodes[next.index()];
                let hop = sender.hop_cost_to(receiver);
                if !hop_affordable(sender.energy(), receiver.energy(), &hop, PROBE_PACKETS) {
                    trace!(from = %sender.label(), to = %receiver.label(), "Hop unaffordable");
                    continue;
                }

                let candidate = cost + hop.total();
                if best[next.index()].is_none_or(|known| candidate < known) {
                    best[next.index()] = Some(candidate);
                    previous[next.index()] = Some(current);
                    discovered += 1;
                    heap.push(Reverse((candidate, discovered, next)));
                }
            }
        }

        if !settled[to.index()] {
            return Ok(Vec::new());
        }

        let mut path = vec![to];
        let mut current = to;
        while let Some(prev) = previous[current.index()] {
            path.push(prev);
            current = prev;
        }
        path.reverse();
        Ok(path)
    }

    /// Per-packet cost of the current min-cost path; zero when unreachable
    pub fn calculate_min_cost(&self, from: NodeId, to: NodeId) -> NetworkResult<MicroJoules> {
        let path = self.min_cost_path(from, to)?;
        self.calculate_cost_of_path(&path)
    }

    /// Per-packet cost of walking `path`
    pub fn calculate_cost_of_path(&self, path: &[NodeId]) -> NetworkResult<MicroJoules> {
        path.windows(2)
            .try_fold(0, |total: MicroJoules, hop| -> NetworkResult<MicroJoules> {
                Ok(total + self.hop_cost(hop[0], hop[1])?.total())
            })
    }

    /// Per-packet value of `data` minus the min cost of reaching `storage`
    ///
    /// An unreachable pair has a min cost of zero, so callers that care must
    /// check the path separately.
    pub fn calculate_profit_of(&self, data: NodeId, storage: NodeId) -> NetworkResult<i64> {
        let value = i64::from(self.node(data)?.packet_value());
        let cost = self.calculate_min_cost(data, storage)?;
        Ok(value - cost as i64)
    }
}
