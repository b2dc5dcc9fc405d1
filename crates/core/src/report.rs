//! Rendering of experiment results.

use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};

use crate::experiment::ExperimentReport;

const NOT_CONVERGED: &str = "did not converge";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Connectivity summary followed by a results table.
    #[default]
    Text,
    /// The full report as a JSON document.
    Json,
}

pub fn render(report: &ExperimentReport, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => serde_json::to_string_pretty(report),
    }
}

fn render_text(report: &ExperimentReport) -> String {
    let mut out = format!(
        "Graph generated ({} nodes, {} edges, seed {}), connectivity from node #0...\n{}",
        report.nodes, report.edges, report.seed, report.connectivity
    );

    out.push_str("\nSIM RESULTS\n");
    out.push_str("A datum was gossiped across the network, starting from node #0, using...\n");

    let mut table = Table::new();
    if report.trials == 1 {
        table.add_row(Row::new(vec![
            Cell::new("Policy"),
            Cell::new("Rounds"),
            Cell::new("Failed attempts"),
        ]));
        for summary in &report.policies {
            let rounds = if summary.converged() {
                summary.min_rounds.to_string()
            } else {
                NOT_CONVERGED.to_string()
            };
            table.add_row(Row::new(vec![
                Cell::new(&summary.policy.to_string()),
                Cell::new(&rounds),
                Cell::new(&summary.failed_attempts.to_string()),
            ]));
        }
    } else {
        table.add_row(Row::new(vec![
            Cell::new("Policy"),
            Cell::new("Mean rounds"),
            Cell::new("Min"),
            Cell::new("Max"),
            Cell::new("Failed attempts"),
            Cell::new("Non-convergent"),
        ]));
        for summary in &report.policies {
            let (mean, min, max) = if summary.converged() {
                (
                    format!("{:.2}", summary.mean_rounds),
                    summary.min_rounds.to_string(),
                    summary.max_rounds.to_string(),
                )
            } else {
                ("-".to_string(), "-".to_string(), "-".to_string())
            };
            table.add_row(Row::new(vec![
                Cell::new(&summary.policy.to_string()),
                Cell::new(&mean),
                Cell::new(&min),
                Cell::new(&max),
                Cell::new(&summary.failed_attempts.to_string()),
                Cell::new(&summary.non_convergent.to_string()),
            ]));
        }
    }
    out.push_str(&table.to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, experiment::Experiment, simulation::SimulationRng};

    fn report(trials: usize) -> ExperimentReport {
        capped_report(trials, 0)
    }

    fn capped_report(trials: usize, round_cap: usize) -> ExperimentReport {
        let config = Config {
            nodes: 20,
            edges: 40,
            trials,
            round_cap,
            ..Default::default()
        };
        Experiment::new(config, SimulationRng::new(3)).run().unwrap()
    }

    #[test]
    fn text_lists_every_policy() {
        let text = render(&report(1), OutputFormat::Text).unwrap();
        assert!(text.contains("SIM RESULTS"));
        assert!(text.contains("0 hops: 1"));
        assert!(text.contains("Random selection from nodes' edges"));
        assert!(text.contains("Popularity and failure weighted selection from all nodes"));
        assert!(!text.contains("Mean rounds"));

        let text = render(&report(3), OutputFormat::Text).unwrap();
        assert!(text.contains("Mean rounds"));
    }

    #[test]
    fn json_is_machine_readable() {
        let json = render(&report(2), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"], 20);
        assert_eq!(value["ledger_mode"], "shared");
        assert_eq!(value["policies"][0]["policy"], "random-node");
        assert_eq!(value["policies"][0]["rounds"].as_array().unwrap().len(), 2);
        assert_eq!(value["policies"][0]["non_convergent"], 0);
    }

    #[test]
    fn non_convergent_runs_are_shown() {
        // 20 nodes cannot all hear the datum within 2 rounds
        let text = render(&capped_report(1, 2), OutputFormat::Text).unwrap();
        assert_eq!(text.matches(NOT_CONVERGED).count(), 4);

        let text = render(&capped_report(2, 2), OutputFormat::Text).unwrap();
        assert!(text.contains("Non-convergent"));

        let json = render(&capped_report(2, 2), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for summary in value["policies"].as_array().unwrap() {
            assert_eq!(summary["non_convergent"], 2);
            assert!(summary["rounds"].as_array().unwrap().is_empty());
        }
    }
}
