//! Chart-ready views over a [`SeriesSet`].

use serde::{Deserialize, Serialize};

use super::sample::{Sample, SeriesSet};
use crate::models::DeploymentScope;

/// One x-axis position: both scopes' values for a trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Label, `#1` for the first trial
    pub attempt: String,
    pub global: Option<u64>,
    pub regional: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub title: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// Values for one scope, `None` where no sample exists
    pub fn values(&self, scope: DeploymentScope) -> impl Iterator<Item = Option<u64>> + '_ {
        self.points.iter().map(move |p| match scope {
            DeploymentScope::Global => p.global,
            DeploymentScope::Regional => p.regional,
        })
    }

    /// Largest value across both scopes
    pub fn max_value(&self) -> Option<u64> {
        self.points
            .iter()
            .flat_map(|p| [p.global, p.regional])
            .flatten()
            .max()
    }
}

/// Server-reported query time per trial
pub fn processing_series(series: &SeriesSet, trials: usize) -> ChartSeries {
    build_series("Processing time", series, trials, |s| {
        s.server_query_duration_ms
    })
}

/// Caller-measured round trip per trial
pub fn end_to_end_series(series: &SeriesSet, trials: usize) -> ChartSeries {
    build_series("End-to-end latency", series, trials, |s| s.end_to_end_ms)
}

// Padded to `trials` so a partial run renders with trailing gaps
fn build_series(
    title: &str,
    series: &SeriesSet,
    trials: usize,
    metric: impl Fn(&Sample) -> u64,
) -> ChartSeries {
    let trials = trials.max(series.len());
    let points = (0..trials)
        .map(|i| ChartPoint {
            attempt: format!("#{}", i + 1),
            global: series.get(DeploymentScope::Global, i).map(&metric),
            regional: series.get(DeploymentScope::Regional, i).map(&metric),
        })
        .collect();

    ChartSeries {
        title: title.to_string(),
        points,
    }
}
