//! Side-by-side comparison of models on one topology

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ModelResult;
use crate::model::Model;

/// Totals of one model run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    pub value: u64,
    pub cost: u64,
    pub profit: i64,
    pub packets: u64,
}

impl ModelSummary {
    /// Summarize a model that has already run
    pub fn of(model: &dyn Model) -> ModelResult<Self> {
        let outcome = model.results()?;
        Ok(Self {
            name: model.name().to_string(),
            value: outcome.total_value,
            cost: outcome.total_cost,
            profit: outcome.total_profit(),
            packets: outcome.total_packets,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub summaries: Vec<ModelSummary>,
}

impl ComparisonReport {
    /// The summary with the highest profit; the earliest one wins ties
    pub fn best_by_profit(&self) -> Option<&ModelSummary> {
        self.summaries
            .iter()
            .rev()
            .max_by_key(|summary| summary.profit)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<18} {:>12} {:>12} {:>12} {:>8}",
            "model", "value", "cost", "profit", "packets"
        )?;
        for s in &self.summaries {
            writeln!(
                f,
                "{:<18} {:>12} {:>12} {:>12} {:>8}",
                s.name, s.value, s.cost, s.profit, s.packets
            )?;
        }
        Ok(())
    }
}

/// Run every model once and collect their totals, in order
///
/// Each model owns its own copy of the network, so the runs do not affect
/// one another.
pub fn compare(models: &mut [Box<dyn Model>]) -> ModelResult<ComparisonReport> {
    let mut report = ComparisonReport::default();
    for model in models.iter_mut() {
        model.run()?;
        let summary = ModelSummary::of(model.as_ref())?;
        info!(model = %summary.name, profit = summary.profit, "Compared model");
        report.summaries.push(summary);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PriorityGreedyModel, ProfitGreedyModel};
    use dpsim_core::NetworkConfig;
    use dpsim_network::SensorNetwork;

    fn network() -> SensorNetwork {
        let mut builder = SensorNetwork::builder(NetworkConfig {
            width: 100.0,
            length: 100.0,
            transmission_range: 15.0,
            packets_per_node: 4,
            capacity_per_node: 4,
            battery_capacity: 1_000_000,
        });
        builder.data_node(0.0, 0.0, 500);
        builder.data_node(20.0, 0.0, 5000);
        builder.storage_node(10.0, 0.0);
        builder.storage_node(30.0, 0.0);
        builder.build().unwrap()
    }

    #[test]
    fn test_compare_greedy_models() {
        let network = network();
        let mut models: Vec<Box<dyn Model>> = vec![
            Box::new(PriorityGreedyModel::new(network.clone())),
            Box::new(ProfitGreedyModel::new(network)),
        ];
        let report = compare(&mut models).unwrap();

        assert_eq!(report.summaries.len(), 2);
        assert_eq!(report.summaries[0].name, "priority-greedy");
        assert_eq!(report.summaries[1].name, "profit-greedy");
        // Priority stores the cheap packets at a loss, profit greedy drops them
        assert_eq!(report.summaries[0].packets, 8);
        assert_eq!(report.summaries[1].packets, 4);
        assert!(report.summaries[1].profit > report.summaries[0].profit);
        assert_eq!(report.best_by_profit().unwrap().name, "profit-greedy");
    }

    #[test]
    fn test_report_table_and_json() {
        let report = ComparisonReport {
            summaries: vec![ModelSummary {
                name: "priority-greedy".to_string(),
                value: 300,
                cost: 2016,
                profit: -1716,
                packets: 3,
            }],
        };
        let table = report.to_string();
        assert!(table.starts_with("model"));
        assert!(table.contains("priority-greedy"));
        assert!(table.contains("-1716"));

        let parsed: ComparisonReport = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_best_by_profit_prefers_first_on_tie() {
        let summary = |name: &str| ModelSummary {
            name: name.to_string(),
            value: 0,
            cost: 0,
            profit: 7,
            packets: 0,
        };
        let report = ComparisonReport {
            summaries: vec![summary("a"), summary("b")],
        };
        assert_eq!(report.best_by_profit().unwrap().name, "a");
    }
}
