//! Transactional multi-hop packet transfers
//!
//! A transfer is checked against a copy of the residual energies along its
//! path before anything is touched. Once the check passes, every hop is
//! committed; a hop that fails to commit after a passing check means the
//! check and the node primitives disagree, which is reported as
//! [`NetworkError::Consistency`].

use dpsim_core::{Capability, MicroJoules, NodeId};
use tracing::debug;

use crate::error::{NetworkError, NetworkResult};
use crate::network::SensorNetwork;

/// A committed transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Nodes visited, origin first and storage node last
    pub path: Vec<NodeId>,
    pub packets: u32,
    /// Per-packet cost of the path
    pub unit_cost: MicroJoules,
}

impl Transfer {
    pub fn origin(&self) -> Option<NodeId> {
        self.path.first().copied()
    }

    pub fn destination(&self) -> Option<NodeId> {
        self.path.last().copied()
    }

    /// Cost of moving every packet of the transfer
    pub fn total_cost(&self) -> MicroJoules {
        self.unit_cost.saturating_mul(MicroJoules::from(self.packets))
    }
}

impl SensorNetwork {
    /// Whether `packets` packets can travel the current min-cost path from
    /// `from` to `to` and be stored there
    pub fn can_send_packets(&self, from: NodeId, to: NodeId, packets: u32) -> NetworkResult<bool> {
        let path = self.min_cost_path(from, to)?;
        Ok(self.can_send_along(&path, packets))
    }

    /// Whether `packets` packets can travel `path` and be stored at its end
    ///
    /// Simulates the energy drain of every hop on a copy of the residual
    /// energies; never mutates the network.
    pub fn can_send_along(&self, path: &[NodeId], packets: u32) -> bool {
        if packets == 0 || path.len() < 2 {
            return false;
        }
        let Ok(nodes) = path
            .iter()
            .map(|id| self.node(*id))
            .collect::<NetworkResult<Vec<_>>>()
        else {
            return false;
        };

        let origin = nodes[0];
        if !origin.can(Capability::Generate) || origin.packets_left() < packets {
            return false;
        }

        let mut residual: Vec<MicroJoules> = nodes.iter().map(|node| node.energy()).collect();
        for (i, hop) in nodes.windows(2).enumerate() {
            let cost = hop[0].hop_cost_to(hop[1]);
            let Some(sender) = residual[i].checked_sub(cost.transmit_for(packets)) else {
                return false;
            };
            let Some(receiver) = residual[i + 1].checked_sub(cost.receive_for(packets)) else {
                return false;
            };
            residual[i] = sender;
            residual[i + 1] = receiver;
        }

        let terminal = nodes[nodes.len() - 1];
        terminal.can(Capability::Store) && terminal.space_left() >= packets
    }

    /// Send `packets` packets along the current min-cost path from `from`
    /// to `to`
    ///
    /// Fails with [`NetworkError::TransferRejected`] and leaves the network
    /// untouched if [`can_send_packets`](Self::can_send_packets) is false.
    pub fn send_packets(
        &mut self,
        from: NodeId,
        to: NodeId,
        packets: u32,
    ) -> NetworkResult<Transfer> {
        let path = self.min_cost_path(from, to)?;
        self.send_along(path, packets)
    }

    /// Send `packets` packets along an explicit path
    pub fn send_along(&mut self, path: Vec<NodeId>, packets: u32) -> NetworkResult<Transfer> {
        if !self.can_send_along(&path, packets) {
            return Err(self.rejection(&path, packets));
        }

        let unit_cost = self.calculate_cost_of_path(&path)?;
        self.commit(&path, packets)?;

        let transfer = Transfer {
            path,
            packets,
            unit_cost,
        };
        debug!(
            from = %self.label_of(transfer.origin()),
            to = %self.label_of(transfer.destination()),
            hops = transfer.path.len() - 1,
            packets,
            cost = transfer.total_cost(),
            "Committed transfer"
        );
        Ok(transfer)
    }

    fn commit(&mut self, path: &[NodeId], packets: u32) -> NetworkResult<()> {
        let last = path.len() - 1;
        for (i, hop) in path.windows(2).enumerate() {
            let (sender, receiver) = self.pair_mut(hop[0], hop[1])?;

            let sent = if i == 0 {
                sender.offload_to(receiver, packets)
            } else {
                sender.transmit_to(receiver, packets)
            };
            let received = sent.and_then(|()| {
                if i + 1 == last {
                    receiver.store_from(sender, packets)
                } else {
                    receiver.receive_from(sender, packets)
                }
            });

            if let Err(err) = received {
                return Err(NetworkError::Consistency {
                    from: sender.label().to_string(),
                    to: receiver.label().to_string(),
                    reason: err.to_string(),
                });
            }
        }
        Ok(())
    }

    fn rejection(&self, path: &[NodeId], packets: u32) -> NetworkError {
        let origin = path.first().and_then(|id| self.node(*id).ok());
        let terminal = path.last().and_then(|id| self.node(*id).ok());
        NetworkError::TransferRejected {
            from: self.label_of(path.first().copied()),
            to: self.label_of(path.last().copied()),
            packets,
            packets_left: origin.map(|node| node.packets_left()).unwrap_or(0),
            space_left: terminal.map(|node| node.space_left()).unwrap_or(0),
        }
    }

    fn label_of(&self, id: Option<NodeId>) -> String {
        id.and_then(|id| self.node(id).ok())
            .map(|node| node.label().to_string())
            .unwrap_or_else(|| "<none>".to_string())
    }
}
