//! Identifiers that select which probe endpoint a request targets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key selecting a database driver (e.g. "sqlite", "turso")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendId(String);

impl BackendId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BackendId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Placement of a probe endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentScope {
    /// Dispatched by the platform to whichever location is closest
    Global,
    /// Pinned near a fixed region
    Regional,
}

impl DeploymentScope {
    /// Default sampling order
    pub const ALL: [DeploymentScope; 2] = [DeploymentScope::Global, DeploymentScope::Regional];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentScope::Global => "global",
            DeploymentScope::Regional => "regional",
        }
    }
}

impl fmt::Display for DeploymentScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeploymentScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(DeploymentScope::Global),
            "regional" => Ok(DeploymentScope::Regional),
            _ => Err(format!("Unknown deployment scope: {}", s)),
        }
    }
}

/// A (backend, scope) pair, rendered on the wire as `{backend}-{scope}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeKey {
    pub backend: BackendId,
    pub scope: DeploymentScope,
}

impl ProbeKey {
    pub fn new(backend: BackendId, scope: DeploymentScope) -> Self {
        Self { backend, scope }
    }

    /// Parse a route segment such as `turso-global`.
    ///
    /// The scope is always the last dash-separated part, so backend ids
    /// may themselves contain dashes.
    pub fn parse(segment: &str) -> Option<Self> {
        let (backend, scope) = segment.rsplit_once('-')?;
        if backend.is_empty() {
            return None;
        }
        let scope = scope.parse().ok()?;
        Some(Self::new(BackendId::new(backend), scope))
    }
}

impl fmt::Display for ProbeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.backend, self.scope)
    }
}
