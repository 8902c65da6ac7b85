use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware;
use crate::models::probe::{ProbeParams, COLD_START_HEADER};
use crate::models::{DeploymentScope, ProbeKey, ProbeResponse};
use crate::probe::{parse_region, ProbeRegistry, ProcessStart, RepeatPolicy};

/// Application version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub probes: Arc<ProbeRegistry>,
    pub repeat_policy: RepeatPolicy,
    pub region_header: HeaderName,
    pub process_start: ProcessStart,
}

/// Health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
}

/// Probe endpoint routes
pub fn probe_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/backends", get(list_backends_handler))
        .route("/api/:probe", get(probe_handler))
        .with_state(state)
}

/// Build the application with all routes and middleware
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(probe_routes(state))
        // Middleware stack: CORS → request logging
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(middleware::cors_layer())
}

/// GET / - Simple health check
async fn root_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Edge data latency probes are running",
        "version": VERSION
    }))
}

/// GET /health - Detailed health check
async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": VERSION
    }))
}

/// GET /api/backends - Registered backends and accepted parameters
async fn list_backends_handler(State(state): State<AppState>) -> Json<Value> {
    let backends: Vec<String> = state
        .probes
        .drivers()
        .backends()
        .into_iter()
        .map(|b| b.to_string())
        .collect();

    Json(json!({
        "backends": backends,
        "scopes": DeploymentScope::ALL,
        "count": {
            "min": state.repeat_policy.min,
            "max": state.repeat_policy.max,
            "fallback": state.repeat_policy.fallback.to_string(),
        },
        "processStartedAt": state.process_start.started_at().to_rfc3339(),
    }))
}

/// GET /api/{backend}-{scope}?count=N - Run N sequential reads
///
/// `count` is clamped to the configured range and never rejected; the query
/// is taken as raw pairs so repeated or odd keys cannot fail extraction. The
/// region comes from the routing header; the cold flag is mirrored in the
/// `x-edge-is-cold` response header.
async fn probe_handler(
    State(state): State<AppState>,
    Path(probe): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let params = ProbeParams::from_pairs(pairs);
    let key = ProbeKey::parse(&probe).ok_or_else(|| ApiError::UnknownProbe(probe.clone()))?;
    let endpoint = state
        .probes
        .get(&key)
        .ok_or_else(|| ApiError::UnknownProbe(probe.clone()))?;

    let repeat = state.repeat_policy.resolve(params.count.as_deref());
    let region = parse_region(
        headers
            .get(&state.region_header)
            .and_then(|v| v.to_str().ok()),
    );

    tracing::info!(probe = %key, repeat, region = ?region, "Probe request");

    let outcome = endpoint
        .invoke(repeat)
        .await
        .map_err(|source| ApiError::Backend {
            backend: key.backend.to_string(),
            source,
        })?;

    let body = ProbeResponse {
        data: outcome.data,
        query_duration: outcome.query_duration_ms,
        invocation_is_cold: outcome.is_cold,
        invocation_region: region,
    };
    let cold = HeaderValue::from_static(if outcome.is_cold { "1" } else { "0" });

    Ok(([(HeaderName::from_static(COLD_START_HEADER), cold)], Json(body)).into_response())
}
