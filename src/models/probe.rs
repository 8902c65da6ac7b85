use serde::{Deserialize, Serialize};

// ==================================================================================================
// Models for GET /api/{backend}-{scope}
// ==================================================================================================

/// Response header mirroring `invocationIsCold` ("1" or "0")
pub const COLD_START_HEADER: &str = "x-edge-is-cold";

/// Body returned by every probe endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResponse {
    /// Result of the last read performed, or null when no read ran
    pub data: serde_json::Value,
    /// Wall-clock milliseconds spent in the read loop
    pub query_duration: u64,
    pub invocation_is_cold: bool,
    pub invocation_region: Option<String>,
}

/// Query parameters accepted by a probe endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeParams {
    /// Raw repeat count; coerced by the endpoint, never rejected
    pub count: Option<String>,
}

impl ProbeParams {
    /// Build from decoded query pairs.
    ///
    /// A repeated `count` key keeps its first value; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let count = pairs
            .into_iter()
            .find(|(key, _)| key == "count")
            .map(|(_, value)| value);
        Self { count }
    }
}
