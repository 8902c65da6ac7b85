// Integration tests for Edge Data Latency
//
// These tests drive the full HTTP stack (routing, middleware, drivers,
// response formatting) and a complete orchestrated run against a live
// in-process server.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use edge_data_latency::{
    config::{HarnessConfig, ServerConfig},
    drivers::{DriverRegistry, SqliteDriver, SupabaseDriver, TursoDriver},
    harness::{self, HttpSampler, RunPlan, TrialOrchestrator},
    models::{BackendId, DeploymentScope},
    routes,
    server::{self, RunningServer},
};

// ==================================================================================================
// Test Helpers
// ==================================================================================================

/// Port with nothing listening on it
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// sqlite (in-memory) plus a turso driver whose server is unreachable
fn create_test_drivers() -> DriverRegistry {
    let mut drivers = DriverRegistry::new();
    drivers.register(Arc::new(SqliteDriver::in_memory()));
    drivers.register(Arc::new(TursoDriver::new(
        &format!("http://127.0.0.1:{}", closed_port()),
        None,
        Duration::from_secs(2),
    )));
    drivers
}

fn build_test_app() -> Router {
    let state = server::build_state(&ServerConfig::standalone(), create_test_drivers()).unwrap();
    routes::build_app(state)
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Helper to parse JSON response body
async fn parse_json_body(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn harness_config(base_url: String, backend: &str, scopes: Vec<DeploymentScope>) -> HarnessConfig {
    HarnessConfig {
        base_url,
        backend: BackendId::new(backend),
        scopes,
        query_count: 2,
        trials: 3,
        timeout: Duration::from_secs(5),
        json: false,
        standalone: false,
    }
}

// ==================================================================================================
// Health Check Tests
// ==================================================================================================

#[tokio::test]
async fn test_root_endpoint() {
    let app = build_test_app();
    let response = get(&app, "/").await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_json_body(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_app();
    let response = get(&app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_json_body(response.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_cors_headers_present() {
    let app = build_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/sqlite-global")
                .header("origin", "https://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}

// ==================================================================================================
// Probe Endpoint Tests
// ==================================================================================================

#[tokio::test]
async fn test_probe_returns_employees_and_cold_flag() {
    let app = build_test_app();

    let first = get(&app, "/api/sqlite-global?count=2").await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers().get("x-edge-is-cold").unwrap(), "1");

    let body = parse_json_body(first.into_body()).await;
    assert_eq!(body["invocationIsCold"], true);
    assert!(body["queryDuration"].is_u64());
    assert!(body["invocationRegion"].is_null());
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 10);
    assert!(rows[0]["emp_no"].is_i64());
    assert!(rows[0]["first_name"].is_string());

    let second = get(&app, "/api/sqlite-global?count=2").await;
    assert_eq!(second.headers().get("x-edge-is-cold").unwrap(), "0");
    let body = parse_json_body(second.into_body()).await;
    assert_eq!(body["invocationIsCold"], false);
}

#[tokio::test]
async fn test_cold_start_is_tracked_per_endpoint() {
    let app = build_test_app();

    let global = get(&app, "/api/sqlite-global").await;
    assert_eq!(global.headers().get("x-edge-is-cold").unwrap(), "1");

    // The regional endpoint has its own first invocation
    let regional = get(&app, "/api/sqlite-regional").await;
    assert_eq!(regional.headers().get("x-edge-is-cold").unwrap(), "1");
}

#[tokio::test]
async fn test_probe_region_from_routing_header() {
    let app = build_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/sqlite-regional")
                .header("x-vercel-id", "abc123:iad1::xyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = parse_json_body(response.into_body()).await;
    assert_eq!(body["invocationRegion"], "iad1");
}

#[tokio::test]
async fn test_probe_out_of_range_count_is_clamped() {
    let app = build_test_app();

    for uri in [
        "/api/sqlite-global?count=999",
        "/api/sqlite-global?count=0",
        "/api/sqlite-global?count=abc",
        "/api/sqlite-global",
    ] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        let body = parse_json_body(response.into_body()).await;
        assert!(body["data"].is_array(), "{}", uri);
    }
}

#[tokio::test]
async fn test_unknown_probe_is_not_found() {
    let app = build_test_app();

    for uri in ["/api/mongo-global", "/api/sqlite-moon", "/api/sqlite"] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        let body = parse_json_body(response.into_body()).await;
        assert_eq!(body["error"]["type"], "not_found");
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_bad_gateway() {
    let app = build_test_app();
    let response = get(&app, "/api/turso-global").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = parse_json_body(response.into_body()).await;
    assert_eq!(body["error"]["type"], "backend_error");
}

#[tokio::test]
async fn test_list_backends() {
    let app = build_test_app();
    let response = get(&app, "/api/backends").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_json_body(response.into_body()).await;
    assert_eq!(body["backends"], serde_json::json!(["sqlite", "turso"]));
    assert_eq!(body["count"]["min"], 1);
    assert_eq!(body["count"]["max"], 5);
    assert!(body["processStartedAt"].is_string());
}

#[tokio::test]
async fn test_wrong_method() {
    let app = build_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sqlite-global")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ==================================================================================================
// Orchestrated Run Tests
// ==================================================================================================

#[tokio::test]
async fn test_single_scope_run_against_live_server() {
    let server = RunningServer::start(&ServerConfig::standalone()).await.unwrap();
    let config = harness_config(server.url(), "sqlite", vec![DeploymentScope::Global]);

    let sampler = HttpSampler::new(server.url(), config.timeout).unwrap();
    let orchestrator = TrialOrchestrator::new(sampler);
    let series = orchestrator.run(&RunPlan::from_config(&config)).await.unwrap();

    assert_eq!(series.global.len(), 3);
    assert_eq!(series.regional, vec![None, None, None]);
    for (i, sample) in series.global.iter().enumerate() {
        let sample = sample.as_ref().unwrap();
        assert!(sample.end_to_end_ms >= sample.server_query_duration_ms);
        assert_eq!(sample.is_cold_start, i == 0);
    }
}

#[tokio::test]
async fn test_failing_backend_run_completes_with_gaps() {
    let drivers = create_test_drivers();
    let server = RunningServer::start_with_drivers(&ServerConfig::standalone(), drivers)
        .await
        .unwrap();
    let config = harness_config(server.url(), "turso", DeploymentScope::ALL.to_vec());

    let report = harness::run_session(&config).await.unwrap();

    assert_eq!(report.series.global, vec![None, None, None]);
    assert_eq!(report.series.regional, vec![None, None, None]);
    assert_eq!(report.processing.points.len(), 3);
    assert!(report.to_json().contains("\"endToEnd\""));
}

#[tokio::test]
async fn test_run_session_standalone() {
    let mut config = harness_config(String::new(), "sqlite", DeploymentScope::ALL.to_vec());
    config.standalone = true;

    let report = harness::run_session(&config).await.unwrap();

    assert_eq!(report.series.len(), 3);
    assert!(report.series.global.iter().all(Option::is_some));
    assert!(report.series.regional.iter().all(Option::is_some));
    assert!(report.render_table().contains("Samples: global 3/3  regional 3/3"));
}

#[tokio::test]
async fn test_supabase_probe_through_live_server() {
    let mut upstream = mockito::Server::new_async().await;
    let mock = upstream
        .mock("GET", "/rest/v1/employees")
        .match_query(mockito::Matcher::Any)
        .match_header("apikey", "anon-key")
        .with_status(200)
        .with_body(r#"[{"emp_no":10001,"first_name":"Georgi","last_name":"Facello"}]"#)
        .expect(2)
        .create_async()
        .await;

    let mut drivers = DriverRegistry::new();
    drivers.register(Arc::new(SupabaseDriver::new(
        &upstream.url(),
        "anon-key".to_string(),
        Duration::from_secs(5),
    )));
    let server = RunningServer::start_with_drivers(&ServerConfig::standalone(), drivers)
        .await
        .unwrap();

    let body: Value = reqwest::get(format!("{}/api/supabase-regional?count=2", server.url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["data"][0]["first_name"], "Georgi");
    assert_eq!(body["invocationIsCold"], true);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_repeated_count_key_runs_first_value() {
    let mut upstream = mockito::Server::new_async().await;
    let mock = upstream
        .mock("GET", "/rest/v1/employees")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"[{"emp_no":10001,"first_name":"Georgi","last_name":"Facello"}]"#)
        .expect(2)
        .create_async()
        .await;

    let mut drivers = DriverRegistry::new();
    drivers.register(Arc::new(SupabaseDriver::new(
        &upstream.url(),
        "anon-key".to_string(),
        Duration::from_secs(5),
    )));
    let state = server::build_state(&ServerConfig::standalone(), drivers).unwrap();
    let app = routes::build_app(state);

    let response = get(&app, "/api/supabase-global?count=2&count=3").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_json_body(response.into_body()).await;
    assert!(body["data"].is_array());
    mock.assert_async().await;
}
