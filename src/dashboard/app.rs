use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::HarnessError;
use crate::harness::{end_to_end_series, processing_series, ChartSeries, RunPlan, SeriesSet};
use crate::models::{BackendId, DeploymentScope};

/// Query counts offered by the form
pub const QUERY_COUNT_CHOICES: [u32; 3] = [1, 2, 5];

/// Log entry for dashboard display
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: tracing::Level,
    pub message: String,
}

/// Dashboard application state
pub struct DashboardApp {
    /// Backends the probe server reported
    pub backends: Vec<BackendId>,
    pub backend_index: usize,
    pub global_enabled: bool,
    pub regional_enabled: bool,
    pub query_count: u32,
    pub trials: usize,
    /// Latest published snapshot
    pub series: SeriesSet,
    pub running: bool,
    pub status: String,
    /// Log buffer for display
    pub log_buffer: Arc<Mutex<VecDeque<LogEntry>>>,
    /// Log scroll position
    pub log_scroll: usize,
    /// Should quit flag
    pub should_quit: bool,
}

impl DashboardApp {
    /// Create the form, preselecting the values of `defaults`
    pub fn new(
        backends: Vec<BackendId>,
        defaults: &RunPlan,
        log_buffer: Arc<Mutex<VecDeque<LogEntry>>>,
    ) -> Self {
        let mut backends = backends;
        if !backends.contains(&defaults.backend) {
            backends.insert(0, defaults.backend.clone());
        }
        let backend_index = backends
            .iter()
            .position(|b| *b == defaults.backend)
            .unwrap_or(0);

        Self {
            backends,
            backend_index,
            global_enabled: defaults.is_enabled(DeploymentScope::Global),
            regional_enabled: defaults.is_enabled(DeploymentScope::Regional),
            query_count: defaults.query_count,
            trials: defaults.trials,
            series: SeriesSet::new(),
            running: false,
            status: "Idle".to_string(),
            log_buffer,
            log_scroll: 0,
            should_quit: false,
        }
    }

    pub fn selected_backend(&self) -> Option<&BackendId> {
        self.backends.get(self.backend_index)
    }

    pub fn next_backend(&mut self) {
        if !self.backends.is_empty() {
            self.backend_index = (self.backend_index + 1) % self.backends.len();
        }
    }

    pub fn previous_backend(&mut self) {
        if !self.backends.is_empty() {
            self.backend_index =
                (self.backend_index + self.backends.len() - 1) % self.backends.len();
        }
    }

    /// Step to the next offered query count, wrapping around
    pub fn cycle_query_count(&mut self) {
        self.query_count = QUERY_COUNT_CHOICES
            .iter()
            .copied()
            .find(|&c| c > self.query_count)
            .unwrap_or(QUERY_COUNT_CHOICES[0]);
    }

    pub fn toggle_scope(&mut self, scope: DeploymentScope) {
        match scope {
            DeploymentScope::Global => self.global_enabled = !self.global_enabled,
            DeploymentScope::Regional => self.regional_enabled = !self.regional_enabled,
        }
    }

    pub fn is_enabled(&self, scope: DeploymentScope) -> bool {
        match scope {
            DeploymentScope::Global => self.global_enabled,
            DeploymentScope::Regional => self.regional_enabled,
        }
    }

    /// Plan for the current form values; `None` if nothing can be run
    pub fn plan(&self) -> Option<RunPlan> {
        let backend = self.selected_backend()?.clone();
        let scopes: Vec<DeploymentScope> = DeploymentScope::ALL
            .into_iter()
            .filter(|&s| self.is_enabled(s))
            .collect();
        if scopes.is_empty() {
            return None;
        }

        Some(RunPlan {
            backend,
            scopes,
            query_count: self.query_count,
            trials: self.trials,
        })
    }

    pub fn start_run(&mut self, plan: &RunPlan) {
        self.running = true;
        self.series = SeriesSet::new();
        self.status = format!("Running {} ({} trials)", plan.backend, plan.trials);
    }

    pub fn apply_snapshot(&mut self, series: SeriesSet) {
        if self.running {
            self.status = format!("Running: trial {}/{}", series.len(), self.trials);
        }
        self.series = series;
    }

    pub fn finish_run(&mut self, outcome: Result<SeriesSet, HarnessError>) {
        self.running = false;
        match outcome {
            Ok(series) => {
                self.status = format!("Done: {} trials", series.len());
                self.series = series;
            }
            Err(e) => self.status = format!("Not started: {}", e),
        }
    }

    pub fn processing_chart(&self) -> ChartSeries {
        processing_series(&self.series, self.trials)
    }

    pub fn end_to_end_chart(&self) -> ChartSeries {
        end_to_end_series(&self.series, self.trials)
    }
}
