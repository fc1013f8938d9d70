//! Flat-file network snapshots
//!
//! ```text
//! width length range
//! packets_per_node capacity_per_node
//! node_count battery_capacity
//! d x y value      (one record per node, in id order)
//! s x y
//! t x y
//! ```
//!
//! Blank lines are ignored. Any other deviation is rejected with the
//! 1-based line number of the offending record.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use dpsim_core::{NetworkConfig, NodeKind};
use tracing::info;

use crate::error::{NetworkError, NetworkResult};
use crate::network::{NetworkBuilder, SensorNetwork};

struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    last: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
            last: 0,
        }
    }

    /// Next non-blank line, split into tokens
    fn next_record(&mut self) -> Option<(usize, Vec<&'a str>)> {
        for (index, line) in self.inner.by_ref() {
            self.last = index + 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if !tokens.is_empty() {
                return Some((index + 1, tokens));
            }
        }
        None
    }

    fn expect_record(&mut self, what: &str) -> NetworkResult<(usize, Vec<&'a str>)> {
        self.next_record().ok_or_else(|| NetworkError::Snapshot {
            line: self.last + 1,
            reason: format!("missing {what}"),
        })
    }
}

fn parse<T: FromStr>(line: usize, token: &str, field: &str) -> NetworkResult<T> {
    token.parse().map_err(|_| NetworkError::Snapshot {
        line,
        reason: format!("invalid {field} '{token}'"),
    })
}

/// A coordinate token; must be a finite number
fn coordinate(line: usize, token: &str, field: &str) -> NetworkResult<f64> {
    let value: f64 = parse(line, token, field)?;
    if !value.is_finite() {
        return Err(NetworkError::Snapshot {
            line,
            reason: format!("{field} must be finite, got '{token}'"),
        });
    }
    Ok(value)
}

fn expect_len(line: usize, tokens: &[&str], expected: usize, what: &str) -> NetworkResult<()> {
    if tokens.len() != expected {
        return Err(NetworkError::Snapshot {
            line,
            reason: format!(
                "{what} needs {expected} fields, found {}: '{}'",
                tokens.len(),
                tokens.join(" ")
            ),
        });
    }
    Ok(())
}

impl SensorNetwork {
    /// Parse a snapshot
    pub fn from_snapshot_str(text: &str) -> NetworkResult<SensorNetwork> {
        let mut lines = Lines::new(text);

        let (line, tokens) = lines.expect_record("field header")?;
        expect_len(line, &tokens, 3, "field header")?;
        let width = coordinate(line, tokens[0], "width")?;
        let length = coordinate(line, tokens[1], "length")?;
        let transmission_range = coordinate(line, tokens[2], "transmission range")?;

        let (line, tokens) = lines.expect_record("packet header")?;
        expect_len(line, &tokens, 2, "packet header")?;
        let packets_per_node = parse(line, tokens[0], "packets per node")?;
        let capacity_per_node = parse(line, tokens[1], "capacity per node")?;

        let (line, tokens) = lines.expect_record("node header")?;
        expect_len(line, &tokens, 2, "node header")?;
        let node_count: usize = parse(line, tokens[0], "node count")?;
        let battery_capacity = parse(line, tokens[1], "battery capacity")?;

        let config = NetworkConfig {
            width,
            length,
            transmission_range,
            packets_per_node,
            capacity_per_node,
            battery_capacity,
        };
        let mut builder = NetworkBuilder::new(config);

        for n in 0..node_count {
            let (line, tokens) = lines.expect_record(&format!("node record {}", n + 1))?;
            let kind = NodeKind::from_tag(tokens[0]).ok_or_else(|| NetworkError::Snapshot {
                line,
                reason: format!("unknown node type '{}'", tokens[0]),
            })?;

            match kind {
                NodeKind::Data => {
                    expect_len(line, &tokens, 4, "data node")?;
                    let x = coordinate(line, tokens[1], "x")?;
                    let y = coordinate(line, tokens[2], "y")?;
                    let value = parse(line, tokens[3], "packet value")?;
                    builder.data_node(x, y, value);
                }
                NodeKind::Storage => {
                    expect_len(line, &tokens, 3, "storage node")?;
                    let x = coordinate(line, tokens[1], "x")?;
                    let y = coordinate(line, tokens[2], "y")?;
                    builder.storage_node(x, y);
                }
                NodeKind::Transition => {
                    expect_len(line, &tokens, 3, "transition node")?;
                    let x = coordinate(line, tokens[1], "x")?;
                    let y = coordinate(line, tokens[2], "y")?;
                    builder.transition_node(x, y);
                }
            }
        }

        if let Some((line, tokens)) = lines.next_record() {
            return Err(NetworkError::Snapshot {
                line,
                reason: format!(
                    "unexpected record after {node_count} nodes: '{}'",
                    tokens.join(" ")
                ),
            });
        }

        builder.build()
    }

    /// Render the snapshot text
    pub fn to_snapshot_string(&self) -> String {
        let config = self.config();
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = writeln!(
            out,
            "{:.6} {:.6} {:.6}",
            config.width, config.length, config.transmission_range
        );
        let _ = writeln!(
            out,
            "{} {}",
            config.packets_per_node, config.capacity_per_node
        );
        let _ = writeln!(out, "{} {}", self.node_count(), config.battery_capacity);

        for node in self.nodes() {
            let position = node.position();
            let tag = node.kind().tag();
            let _ = match node.kind() {
                NodeKind::Data => writeln!(
                    out,
                    "{tag} {:.6} {:.6} {}",
                    position.x,
                    position.y,
                    node.packet_value()
                ),
                NodeKind::Storage | NodeKind::Transition => {
                    writeln!(out, "{tag} {:.6} {:.6}", position.x, position.y)
                }
            };
        }
        out
    }

    /// Write the snapshot to any writer
    pub fn write_snapshot<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.to_snapshot_string().as_bytes())
    }

    /// Load a snapshot file
    pub fn load(path: impl AsRef<Path>) -> NetworkResult<SensorNetwork> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let network = Self::from_snapshot_str(&text)?;
        info!(
            path = %path.display(),
            nodes = network.node_count(),
            "Loaded sensor network"
        );
        Ok(network)
    }

    /// Load a snapshot file, replacing its packet and capacity templates
    pub fn load_with(
        path: impl AsRef<Path>,
        packets_per_node: u32,
        capacity_per_node: u32,
    ) -> NetworkResult<SensorNetwork> {
        let mut network = Self::load(path)?;
        network.set_overflow_packets(packets_per_node)?;
        network.set_storage_capacity(capacity_per_node)?;
        Ok(network)
    }

    /// Save the snapshot to a file
    pub fn save(&self, path: impl AsRef<Path>) -> NetworkResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_snapshot_string())?;
        info!(path = %path.display(), "Saved sensor network");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = "\
100.000000 50.000000 20.000000
5 3
4 10000
d 0.000000 0.000000 7

t 10.000000 0.000000
s 20.000000 0.000000
d 30.000000 0.000000 2
";

    #[test]
    fn test_parse_snapshot() {
        let network = SensorNetwork::from_snapshot_str(SNAPSHOT).unwrap();

        assert_eq!(network.width(), 100.0);
        assert_eq!(network.length(), 50.0);
        assert_eq!(network.transmission_range(), 20.0);
        assert_eq!(network.node_count(), 4);
        assert_eq!(network.data_node_count(), 2);
        assert_eq!(network.data_node(2).unwrap().packet_value(), 2);
        assert_eq!(network.data_node(1).unwrap().packets_left(), 5);
        assert_eq!(network.storage_node(1).unwrap().space_left(), 3);
        assert_eq!(network.nodes()[1].label(), "TN01");
        assert!(network.nodes().iter().all(|n| n.energy() == 10_000));
    }

    #[test]
    fn test_render_matches_input() {
        let network = SensorNetwork::from_snapshot_str(SNAPSHOT).unwrap();
        let expected: String = SNAPSHOT
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| format!("{line}\n"))
            .collect();
        assert_eq!(network.to_snapshot_string(), expected);
    }

    #[test]
    fn test_missing_value_rejected() {
        let text = "10 10 5\n1 1\n1 100\nd 1.0 2.0\n";
        let err = SensorNetwork::from_snapshot_str(text).unwrap_err();
        assert!(matches!(err, NetworkError::Snapshot { line: 4, .. }));
    }

    #[test]
    fn test_extra_token_rejected() {
        let text = "10 10 5\n1 1\n1 100\ns 1.0 2.0 9\n";
        let err = SensorNetwork::from_snapshot_str(text).unwrap_err();
        assert!(matches!(err, NetworkError::Snapshot { line: 4, .. }));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let text = "10 10 5\n1 1\n1 100\nx 1.0 2.0\n";
        let err = SensorNetwork::from_snapshot_str(text).unwrap_err();
        assert!(err.to_string().contains("unknown node type 'x'"));
    }

    #[test]
    fn test_too_few_records_rejected() {
        let text = "10 10 5\n1 1\n2 100\ns 1.0 2.0\n";
        let err = SensorNetwork::from_snapshot_str(text).unwrap_err();
        assert!(err.to_string().contains("missing node record 2"));
    }

    #[test]
    fn test_too_many_records_rejected() {
        let text = "10 10 5\n1 1\n1 100\ns 1.0 2.0\nt 3.0 4.0\n";
        let err = SensorNetwork::from_snapshot_str(text).unwrap_err();
        assert!(matches!(err, NetworkError::Snapshot { line: 5, .. }));
    }

    #[test]
    fn test_bad_number_rejected() {
        let text = "10 ten 5\n1 1\n0 100\n";
        let err = SensorNetwork::from_snapshot_str(text).unwrap_err();
        assert!(matches!(err, NetworkError::Snapshot { line: 1, .. }));
    }

    #[test]
    fn test_rejects_non_finite_coordinates() {
        let nan = "100 100 20\n5 3\n2 10000\nd NaN 0 7\ns 10 0\n";
        match SensorNetwork::from_snapshot_str(nan) {
            Err(NetworkError::Snapshot { line, reason }) => {
                assert_eq!(line, 4);
                assert!(reason.contains("x must be finite"), "{reason}");
            }
            other => panic!("expected snapshot error, got {other:?}"),
        }

        let inf = "100 100 20\n5 3\n2 10000\nd 0 0 7\ns 10 -inf\n";
        assert!(matches!(
            SensorNetwork::from_snapshot_str(inf),
            Err(NetworkError::Snapshot { line: 5, .. })
        ));

        let header = "inf 100 20\n5 3\n1 10000\ns 10 0\n";
        assert!(matches!(
            SensorNetwork::from_snapshot_str(header),
            Err(NetworkError::Snapshot { line: 1, .. })
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(
            SensorNetwork::from_snapshot_str(""),
            Err(NetworkError::Snapshot { .. })
        ));
    }
}
