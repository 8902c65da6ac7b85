//! Text and JSON reports for a finished run.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::plan::RunPlan;
use super::sample::{Sample, SeriesSet};
use super::series::{end_to_end_series, processing_series, ChartSeries};
use crate::models::DeploymentScope;

/// Complete run report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub plan: RunPlan,
    pub series: SeriesSet,
    pub processing: ChartSeries,
    pub end_to_end: ChartSeries,
}

impl RunReport {
    pub fn new(plan: RunPlan, series: SeriesSet) -> Self {
        let processing = processing_series(&series, plan.trials);
        let end_to_end = end_to_end_series(&series, plan.trials);
        Self {
            plan,
            series,
            processing,
            end_to_end,
        }
    }

    /// Number of samples collected for a scope
    pub fn sample_count(&self, scope: DeploymentScope) -> usize {
        self.series.scope(scope).iter().flatten().count()
    }

    /// Render the per-trial ASCII table
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out);
        let _ = writeln!(out, "╔═════════════════════════════════════════════════════════════════════════════════════╗");
        let _ = writeln!(out, "║                           EDGE DATA LATENCY RESULTS                                 ║");
        let _ = writeln!(out, "╚═════════════════════════════════════════════════════════════════════════════════════╝");
        let _ = writeln!(
            out,
            "Backend: {}  Queries per call: {}  Trials: {}",
            self.plan.backend, self.plan.query_count, self.plan.trials
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "┌───────┬──────────────────────────────────────┬──────────────────────────────────────┐");
        let _ = writeln!(out, "│       │                global                │               regional               │");
        let _ = writeln!(out, "│ Trial │ query(ms) │  e2e(ms) │ cold │  region  │ query(ms) │  e2e(ms) │ cold │  region  │");
        let _ = writeln!(out, "├───────┼───────────┼──────────┼──────┼──────────┼───────────┼──────────┼──────┼──────────┤");

        for trial in 0..self.series.len() {
            let _ = writeln!(
                out,
                "│ {:>5} │ {} │ {} │",
                format!("#{}", trial + 1),
                format_cells(self.series.get(DeploymentScope::Global, trial)),
                format_cells(self.series.get(DeploymentScope::Regional, trial)),
            );
        }

        let _ = writeln!(out, "└───────┴───────────┴──────────┴──────┴──────────┴───────────┴──────────┴──────┴──────────┘");
        let _ = writeln!(
            out,
            "Samples: global {}/{}  regional {}/{}",
            self.sample_count(DeploymentScope::Global),
            self.plan.trials,
            self.sample_count(DeploymentScope::Regional),
            self.plan.trials
        );
        out
    }

    /// Print the report as an ASCII table
    pub fn print_table(&self) {
        println!("{}", self.render_table());
    }

    /// Export the report as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

fn format_cells(sample: Option<&Sample>) -> String {
    match sample {
        Some(s) => format!(
            "{:>9} │ {:>8} │ {:^4} │ {:^8}",
            s.server_query_duration_ms,
            s.end_to_end_ms,
            if s.is_cold_start { "*" } else { "" },
            s.region.as_deref().unwrap_or("-"),
        ),
        None => format!("{:>9} │ {:>8} │ {:^4} │ {:^8}", "-", "-", "", "-"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        let mut series = SeriesSet::new();
        series.push_trial(
            Some(Sample {
                server_query_duration_ms: 12,
                end_to_end_ms: 140,
                is_cold_start: true,
                region: Some("iad1".to_string()),
            }),
            None,
        );
        series.push_trial(
            Some(Sample {
                server_query_duration_ms: 3,
                end_to_end_ms: 41,
                is_cold_start: false,
                region: Some("iad1".to_string()),
            }),
            None,
        );
        let plan = RunPlan {
            scopes: vec![DeploymentScope::Global],
            trials: 2,
            ..Default::default()
        };
        RunReport::new(plan, series)
    }

    #[test]
    fn test_render_table_rows() {
        let table = report().render_table();
        let rows: Vec<&str> = table.lines().filter(|l| l.contains("│    #")).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("140"));
        assert!(rows[0].contains('*'));
        assert!(rows[0].contains("iad1"));
        assert!(!rows[1].contains('*'));
        assert!(table.contains("Samples: global 2/2  regional 0/2"));
    }

    #[test]
    fn test_json_export() {
        let json: serde_json::Value = serde_json::from_str(&report().to_json()).unwrap();
        assert_eq!(json["plan"]["backend"], "sqlite");
        assert_eq!(json["series"]["global"][0]["endToEndMs"], 140);
        assert!(json["series"]["regional"][1].is_null());
        assert_eq!(json["processing"]["points"][1]["attempt"], "#2");
        assert_eq!(json["endToEnd"]["points"][0]["global"], 140);
    }

    #[test]
    fn test_sample_count() {
        let report = report();
        assert_eq!(report.sample_count(DeploymentScope::Global), 2);
        assert_eq!(report.sample_count(DeploymentScope::Regional), 0);
    }
}
