//! Operator-chosen settings for one run, frozen once the run starts.

use serde::{Deserialize, Serialize};

use crate::config::HarnessConfig;
use crate::models::{BackendId, DeploymentScope};

/// Configuration for a single orchestrated run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPlan {
    /// Backend every probe call targets
    pub backend: BackendId,
    /// Enabled scopes, in sampling order
    pub scopes: Vec<DeploymentScope>,
    /// Sequential queries per probe call
    pub query_count: u32,
    /// Number of trials; at least one
    pub trials: usize,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            backend: BackendId::new("sqlite"),
            scopes: DeploymentScope::ALL.to_vec(),
            query_count: 1,
            trials: 10,
        }
    }
}

impl RunPlan {
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            backend: config.backend.clone(),
            scopes: config.scopes.clone(),
            query_count: config.query_count,
            trials: config.trials,
        }
    }

    pub fn is_enabled(&self, scope: DeploymentScope) -> bool {
        self.scopes.contains(&scope)
    }
}
