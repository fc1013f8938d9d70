//! Flow solutions and their decomposition into routes
//!
//! A min-cost-flow solver reports aggregate flow per arc. [`FlowSolution`]
//! reads that report, [`NodeFlows`] maps it back onto network nodes, and
//! [`decompose`] turns the aggregate back into concrete routes: direct
//! data-to-storage arcs are matched first, then any residual supply is pushed
//! breadth-first along the adjacency relation.

use std::collections::{BTreeMap, VecDeque};

use dpsim_core::NodeId;
use dpsim_network::{FlowEndpoint, FlowIndex, SensorNetwork};
use tracing::warn;

use crate::error::FlowError;

/// Flow on one arc, as reported by a solver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcFlow {
    pub tail: usize,
    pub head: usize,
    pub flow: i64,
}

/// Parsed solver output in DIMACS solution format
///
/// `s <objective>` carries the optimal cost, `f <tail> <head> <flow>` one
/// arc flow, and `c` lines are comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowSolution {
    pub objective: Option<i64>,
    pub arcs: Vec<ArcFlow>,
}

fn parse_field<T: std::str::FromStr>(
    line: usize,
    tokens: &[&str],
    i: usize,
    what: &str,
) -> Result<T, FlowError> {
    let token = tokens.get(i).ok_or_else(|| FlowError::Parse {
        line,
        reason: format!("missing {what}"),
    })?;
    token.parse().map_err(|_| FlowError::Parse {
        line,
        reason: format!("invalid {what} '{token}'"),
    })
}

impl FlowSolution {
    pub fn parse(text: &str) -> Result<Self, FlowError> {
        let mut solution = FlowSolution::default();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let tokens: Vec<&str> = raw.split_whitespace().collect();
            let Some(kind) = tokens.first() else {
                continue;
            };

            match *kind {
                "c" => {}
                "s" => solution.objective = Some(parse_field(line, &tokens, 1, "objective")?),
                "f" => solution.arcs.push(ArcFlow {
                    tail: parse_field(line, &tokens, 1, "tail")?,
                    head: parse_field(line, &tokens, 2, "head")?,
                    flow: parse_field(line, &tokens, 3, "flow")?,
                }),
                other => warn!(line, command = other, "Skipping unknown solution line"),
            }
        }

        if solution.arcs.is_empty() {
            warn!("Flow solution contains no arc flows");
        }
        Ok(solution)
    }
}

/// Aggregate flow mapped onto network nodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFlows {
    /// Source to data node
    pub supplied: BTreeMap<NodeId, u64>,
    /// Data node to the discard dummy
    pub discarded: BTreeMap<NodeId, u64>,
    /// Node to node
    pub links: BTreeMap<(NodeId, NodeId), u64>,
    /// Storage node to sink
    pub stored: BTreeMap<NodeId, u64>,
}

fn endpoint_label(network: &SensorNetwork, endpoint: FlowEndpoint) -> String {
    match endpoint {
        FlowEndpoint::Source => "Source".to_string(),
        FlowEndpoint::Dummy => "Dummy".to_string(),
        FlowEndpoint::Sink => "Sink".to_string(),
        FlowEndpoint::Node(id) => node_label(network, id),
    }
}

fn node_label(network: &SensorNetwork, id: NodeId) -> String {
    network
        .node(id)
        .map(|node| node.label().to_string())
        .unwrap_or_else(|_| format!("#{id}"))
}

impl NodeFlows {
    /// Map a solver's arc flows back onto the nodes of `network`
    pub fn from_solution(
        network: &SensorNetwork,
        index: &FlowIndex,
        solution: &FlowSolution,
    ) -> Result<Self, FlowError> {
        let mut flows = NodeFlows::default();

        for arc in &solution.arcs {
            let unknown = FlowError::UnknownArcEndpoint {
                tail: arc.tail,
                head: arc.head,
            };
            let (Some(tail), Some(head)) = (index.endpoint(arc.tail), index.endpoint(arc.head))
            else {
                return Err(unknown);
            };
            if arc.flow < 0 {
                return Err(FlowError::NegativeFlow {
                    from: endpoint_label(network, tail),
                    to: endpoint_label(network, head),
                    flow: arc.flow,
                });
            }
            let flow = arc.flow as u64;
            if flow == 0 {
                continue;
            }

            match (tail, head) {
                (FlowEndpoint::Source, FlowEndpoint::Node(dn)) => {
                    *flows.supplied.entry(dn).or_default() += flow;
                }
                (FlowEndpoint::Node(dn), FlowEndpoint::Dummy) => {
                    *flows.discarded.entry(dn).or_default() += flow;
                }
                (FlowEndpoint::Node(from), FlowEndpoint::Node(to)) => {
                    *flows.links.entry((from, to)).or_default() += flow;
                }
                (FlowEndpoint::Node(sn), FlowEndpoint::Sink) => {
                    *flows.stored.entry(sn).or_default() += flow;
                }
                (FlowEndpoint::Dummy, FlowEndpoint::Sink) => {}
                _ => return Err(unknown),
            }
        }
        Ok(flows)
    }

    /// Packets delivered over node-to-node arcs leaving data nodes
    pub fn delivered_from(&self, dn: NodeId) -> u64 {
        self.links
            .range((dn, NodeId(0))..=(dn, NodeId(u32::MAX)))
            .map(|(_, flow)| *flow)
            .sum()
    }
}

/// A concrete route recovered from aggregate flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRoute {
    /// Data node first, storage node last
    pub path: Vec<NodeId>,
    pub packets: u64,
}

fn take(map: &mut BTreeMap<NodeId, u64>, key: NodeId, amount: u64) {
    if let Some(value) = map.get_mut(&key) {
        *value -= amount;
    }
}

/// Decompose aggregate flow into routes
///
/// Fails with [`FlowError::Unbalanced`] if supply cannot be followed to a
/// storage node or storage flow is left without a matching supply.
pub fn decompose(network: &SensorNetwork, flows: &NodeFlows) -> Result<Vec<FlowRoute>, FlowError> {
    let mut links = flows.links.clone();
    let mut stored = flows.stored.clone();
    let mut remaining: BTreeMap<NodeId, u64> = BTreeMap::new();

    for (dn, supplied) in &flows.supplied {
        let discarded = flows.discarded.get(dn).copied().unwrap_or(0);
        let Some(left) = supplied.checked_sub(discarded) else {
            return Err(FlowError::Unbalanced {
                node: node_label(network, *dn),
                residual: *supplied as i64 - discarded as i64,
            });
        };
        remaining.insert(*dn, left);
    }

    let mut routes = Vec::new();

    // Direct data -> storage arcs
    for dn in network.data_node_ids() {
        for sn in network.storage_node_ids() {
            let supply = remaining.get(dn).copied().unwrap_or(0);
            let link = links.get(&(*dn, *sn)).copied().unwrap_or(0);
            let sink = stored.get(sn).copied().unwrap_or(0);
            let sent = supply.min(link).min(sink);
            if sent == 0 {
                continue;
            }

            routes.push(FlowRoute {
                path: vec![*dn, *sn],
                packets: sent,
            });
            take(&mut remaining, *dn, sent);
            take(&mut stored, *sn, sent);
            if let Some(flow) = links.get_mut(&(*dn, *sn)) {
                *flow -= sent;
            }
        }
    }

    // Residual supply, breadth-first along the adjacency relation
    let mut queue: VecDeque<(Vec<NodeId>, u64)> = VecDeque::new();
    for dn in network.data_node_ids() {
        if let Some(left) = remaining.get_mut(dn) {
            if *left > 0 {
                queue.push_back((vec![*dn], *left));
                *left = 0;
            }
        }
    }

    while let Some((path, mut packets)) = queue.pop_front() {
        let current = path[path.len() - 1];

        if path.len() > 1 {
            let sink = stored.get(&current).copied().unwrap_or(0);
            let kept = sink.min(packets);
            if kept > 0 {
                take(&mut stored, current, kept);
                packets -= kept;
                routes.push(FlowRoute {
                    path: path.clone(),
                    packets: kept,
                });
            }
        }

        for neighbor in network.neighbors(current) {
            if packets == 0 {
                break;
            }
            let Some(link) = links.get_mut(&(current, neighbor)) else {
                continue;
            };
            let sent = (*link).min(packets);
            if sent == 0 {
                continue;
            }
            *link -= sent;
            packets -= sent;

            let mut next = path.clone();
            next.push(neighbor);
            queue.push_back((next, sent));
        }

        if packets > 0 {
            return Err(FlowError::Unbalanced {
                node: node_label(network, current),
                residual: packets as i64,
            });
        }
    }

    if let Some((sn, left)) = stored.iter().find(|(_, left)| **left > 0) {
        return Err(FlowError::Unbalanced {
            node: node_label(network, *sn),
            residual: -(*left as i64),
        });
    }

    Ok(routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpsim_core::NetworkConfig;

    fn line_network() -> (SensorNetwork, NodeId, NodeId, NodeId) {
        let config = NetworkConfig {
            width: 100.0,
            length: 100.0,
            transmission_range: 15.0,
            packets_per_node: 5,
            capacity_per_node: 5,
            battery_capacity: 1_000_000,
        };
        let mut builder = SensorNetwork::builder(config);
        let dn = builder.data_node(0.0, 0.0, 100);
        let tn = builder.transition_node(10.0, 0.0);
        let sn = builder.storage_node(20.0, 0.0);
        (builder.build().unwrap(), dn, tn, sn)
    }

    #[test]
    fn test_parse_solution() {
        let text = "c solver output\ns -42\n\nf 1 2 3\nf 2 4 3\nx bogus\n";
        let solution = FlowSolution::parse(text).unwrap();
        assert_eq!(solution.objective, Some(-42));
        assert_eq!(
            solution.arcs,
            vec![
                ArcFlow { tail: 1, head: 2, flow: 3 },
                ArcFlow { tail: 2, head: 4, flow: 3 },
            ]
        );
    }

    #[test]
    fn test_parse_rejects_malformed_flow() {
        let err = FlowSolution::parse("s 0\nf 1 2\n").unwrap_err();
        assert_eq!(
            err,
            FlowError::Parse {
                line: 2,
                reason: "missing flow".to_string()
            }
        );
        assert!(matches!(
            FlowSolution::parse("f 1 two 3\n"),
            Err(FlowError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_negative_flow_rejected() {
        let (network, ..) = line_network();
        let index = FlowIndex::for_network(&network);
        let solution = FlowSolution {
            objective: None,
            arcs: vec![ArcFlow { tail: 2, head: 3, flow: -1 }],
        };
        let err = NodeFlows::from_solution(&network, &index, &solution).unwrap_err();
        assert_eq!(
            err,
            FlowError::NegativeFlow {
                from: "DN01".to_string(),
                to: "SN01".to_string(),
                flow: -1
            }
        );
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let (network, ..) = line_network();
        let index = FlowIndex::for_network(&network);
        let solution = FlowSolution {
            objective: None,
            arcs: vec![ArcFlow { tail: 2, head: 9, flow: 1 }],
        };
        assert!(matches!(
            NodeFlows::from_solution(&network, &index, &solution),
            Err(FlowError::UnknownArcEndpoint { tail: 2, head: 9 })
        ));
    }

    #[test]
    fn test_direct_decomposition() {
        let (network, dn, _, sn) = line_network();
        let index = FlowIndex::for_network(&network);
        // source=1, DN01=2, SN01=3, dummy=4, sink=5
        let solution =
            FlowSolution::parse("f 1 2 5\nf 2 3 3\nf 2 4 2\nf 3 5 3\nf 4 5 2\n").unwrap();
        let flows = NodeFlows::from_solution(&network, &index, &solution).unwrap();
        assert_eq!(flows.delivered_from(dn), 3);

        let routes = decompose(&network, &flows).unwrap();
        assert_eq!(
            routes,
            vec![FlowRoute {
                path: vec![dn, sn],
                packets: 3
            }]
        );
    }

    #[test]
    fn test_multi_hop_decomposition() {
        let (network, dn, tn, sn) = line_network();
        let mut flows = NodeFlows::default();
        flows.supplied.insert(dn, 4);
        flows.links.insert((dn, tn), 4);
        flows.links.insert((tn, sn), 4);
        flows.stored.insert(sn, 4);

        let routes = decompose(&network, &flows).unwrap();
        assert_eq!(
            routes,
            vec![FlowRoute {
                path: vec![dn, tn, sn],
                packets: 4
            }]
        );
    }

    #[test]
    fn test_dangling_supply_is_unbalanced() {
        let (network, dn, tn, _) = line_network();
        let mut flows = NodeFlows::default();
        flows.supplied.insert(dn, 2);
        flows.links.insert((dn, tn), 2);

        assert_eq!(
            decompose(&network, &flows).unwrap_err(),
            FlowError::Unbalanced {
                node: "TN01".to_string(),
                residual: 2
            }
        );
    }

    #[test]
    fn test_unmatched_storage_is_unbalanced() {
        let (network, _, _, sn) = line_network();
        let mut flows = NodeFlows::default();
        flows.stored.insert(sn, 1);

        assert!(matches!(
            decompose(&network, &flows),
            Err(FlowError::Unbalanced { residual: -1, .. })
        ));
    }

    #[test]
    fn test_discard_exceeding_supply_is_unbalanced() {
        let (network, dn, _, _) = line_network();
        let mut flows = NodeFlows::default();
        flows.supplied.insert(dn, 1);
        flows.discarded.insert(dn, 2);

        assert!(matches!(
            decompose(&network, &flows),
            Err(FlowError::Unbalanced { residual: -1, .. })
        ));
    }
}
