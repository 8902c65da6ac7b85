//! Samples and the per-scope series they accumulate into.

use serde::{Deserialize, Serialize};

use crate::models::{BackendId, DeploymentScope, ProbeResponse};

/// Which probe endpoint a sampler call targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub backend: BackendId,
    pub scope: DeploymentScope,
    pub query_count: u32,
}

impl ProbeTarget {
    pub fn new(backend: BackendId, scope: DeploymentScope, query_count: u32) -> Self {
        Self {
            backend,
            scope,
            query_count,
        }
    }

    /// Path and query, e.g. `/api/turso-global?count=2`
    pub fn path(&self) -> String {
        format!(
            "/api/{}-{}?count={}",
            self.backend, self.scope, self.query_count
        )
    }
}

/// Timing result of one successful probe call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Time the endpoint spent on its reads, as it reported
    pub server_query_duration_ms: u64,
    /// Round trip measured by the caller
    pub end_to_end_ms: u64,
    pub is_cold_start: bool,
    pub region: Option<String>,
}

impl Sample {
    /// Merge an endpoint response with the caller-side elapsed time
    pub fn from_response(response: ProbeResponse, end_to_end_ms: u64) -> Self {
        Self {
            server_query_duration_ms: response.query_duration,
            end_to_end_ms,
            is_cold_start: response.invocation_is_cold,
            region: response.invocation_region,
        }
    }
}

/// Per-scope sample sequences indexed by trial number
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSet {
    pub global: Vec<Option<Sample>>,
    pub regional: Vec<Option<Sample>>,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self, scope: DeploymentScope) -> &[Option<Sample>] {
        match scope {
            DeploymentScope::Global => &self.global,
            DeploymentScope::Regional => &self.regional,
        }
    }

    /// Append one trial's results; both sequences grow together
    pub fn push_trial(&mut self, global: Option<Sample>, regional: Option<Sample>) {
        self.global.push(global);
        self.regional.push(regional);
    }

    /// Number of completed trials
    pub fn len(&self) -> usize {
        self.global.len().max(self.regional.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample for a trial, if the trial ran and the scope produced one
    pub fn get(&self, scope: DeploymentScope, trial: usize) -> Option<&Sample> {
        self.scope(scope).get(trial).and_then(Option::as_ref)
    }
}
