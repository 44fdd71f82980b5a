//! Integration tests for the agent API endpoints

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use capacity_agent::{api::{create_router, AppState}, refresh::refresh_once};
use capacity_lib::{
    health::{components, HealthRegistry},
    observability::{CapacityMetrics, StructuredLogger},
    EngineConfig, FileSource,
};
use tempfile::TempDir;
use tower::ServiceExt;

const TENANTS: &str = r#"{
    "updatedAt": "2025-03-01T12:00:00Z",
    "tenants": [
        {
            "id": "acme",
            "name": "Acme",
            "endpoints": 12000,
            "cnappAccounts": 40,
            "metrics": {
                "vcpuTotal": 1000, "vcpuUsedPctPeak": 0.5,
                "ramGiBTotal": 4000, "ramUsedPctPeak": 0.5,
                "kafkaLagMessages": 600, "drainMsgsPerSec": 2,
                "pnodeCpuPct": 0.9
            }
        },
        {
            "id": "globex",
            "name": "Globex",
            "endpoints": 3000,
            "metrics": {
                "vcpuTotal": 200, "vcpuUsedPctPeak": 0.2,
                "ramGiBTotal": 800, "ramUsedPctPeak": 0.3
            }
        }
    ],
    "bbcloud": {
        "suDefinition": {"nginx": 2, "pnode": 4, "dnode": 2, "spark": 1, "ruleengine": 1},
        "currentSUs": 3
    }
}"#;

const STORAGE: &str = r#"{
    "hdfs": {"state": "active", "safeMode": true, "datanodesLive": 10, "datanodesExpected": 10}
}"#;

fn snapshot_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("tenants.json"), TENANTS).unwrap();
    std::fs::write(dir.path().join("hdfs.json"), STORAGE).unwrap();
    dir
}

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register_sources().await;

    let state = Arc::new(AppState::new(
        health_registry,
        CapacityMetrics::new(),
        StructuredLogger::new("test"),
        EngineConfig::default(),
    ));
    let router = create_router(state.clone());

    (router, state)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_test_app().await;

    let (status, health) = get_json(app, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["tenants"].is_object());
    assert!(health["components"]["integrations"].is_object());
    assert!(health["components"]["storage"].is_object());
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let (app, state) = setup_test_app().await;
    state
        .health_registry
        .set_degraded(components::STORAGE, "hdfs.json missing")
        .await;

    let (status, health) = get_json(app, "/healthz").await;

    // Degraded still serves defaults
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn test_healthz_returns_503_when_every_source_fails() {
    let (app, state) = setup_test_app().await;
    let empty = TempDir::new().unwrap();
    refresh_once(&state, &FileSource::new(empty.path())).await;

    let (status, health) = get_json(app.clone(), "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
    assert!(health["components"]["tenants"]["message"]
        .as_str()
        .unwrap()
        .contains("tenants.json"));

    let (status, readiness) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_broken_tenants_snapshot_serves_last_good_data() {
    let (app, state) = setup_test_app().await;
    let dir = snapshot_dir();
    let source = FileSource::new(dir.path());
    refresh_once(&state, &source).await;

    std::fs::write(dir.path().join("tenants.json"), "{\"tenants\": [").unwrap();
    refresh_once(&state, &source).await;

    let (status, tenants) = get_json(app.clone(), "/api/tenants.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tenants["tenants"].as_array().unwrap().len(), 2);

    let (_, report) = get_json(app.clone(), "/api/v1/report").await;
    assert_eq!(report["fleet"]["totals"]["endpoints"], 15000);
    let sources = report["sources"].as_array().unwrap();
    let tenants_source = sources.iter().find(|s| s["name"] == "tenants").unwrap();
    assert!(tenants_source["fetched_at"].is_string());
    assert!(tenants_source["error"]
        .as_str()
        .unwrap()
        .contains("failed to parse tenants snapshot"));

    let (status, health) = get_json(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["components"]["tenants"]["status"], "degraded");
}

#[tokio::test]
async fn test_readyz_returns_503_before_first_refresh() {
    let (app, _state) = setup_test_app().await;

    let (status, readiness) = get_json(app, "/readyz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_readyz_returns_ok_after_refresh_with_partial_sources() {
    let (app, state) = setup_test_app().await;
    let dir = snapshot_dir();
    refresh_once(&state, &FileSource::new(dir.path())).await;

    let (status, readiness) = get_json(app, "/readyz").await;

    // integrations.json is missing but the other sources loaded
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_raw_snapshots_default_when_absent() {
    let (app, state) = setup_test_app().await;
    let dir = snapshot_dir();
    refresh_once(&state, &FileSource::new(dir.path())).await;

    let (status, tenants) = get_json(app.clone(), "/api/tenants.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tenants["tenants"].as_array().unwrap().len(), 2);
    assert_eq!(tenants["bbcloud"]["currentSUs"], 3);

    let (status, integrations) = get_json(app, "/api/integrations.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(integrations.as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_report_endpoint() {
    let (app, state) = setup_test_app().await;
    let dir = snapshot_dir();
    refresh_once(&state, &FileSource::new(dir.path())).await;

    let (status, report) = get_json(app, "/api/v1/report").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["fleet"]["totals"]["endpoints"], 15000);
    assert_eq!(report["storage"]["status"], "red");
    assert_eq!(report["overall_status"], "red");

    let tenants = report["tenants"].as_array().unwrap();
    let acme = tenants.iter().find(|t| t["id"] == "acme").unwrap();
    // 5.0 minutes of lag stays yellow, but pnode CPU 0.9 is red
    assert_eq!(acme["signals"]["lag_min"], 5.0);
    assert_eq!(acme["status"], "red");

    let sources = report["sources"].as_array().unwrap();
    let integrations = sources.iter().find(|s| s["name"] == "integrations").unwrap();
    assert!(integrations["error"].is_string());
}

#[tokio::test]
async fn test_tenant_endpoint() {
    let (app, state) = setup_test_app().await;
    let dir = snapshot_dir();
    refresh_once(&state, &FileSource::new(dir.path())).await;

    let (status, tenant) = get_json(app.clone(), "/api/v1/tenants/globex").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tenant["status"], "green");
    assert_eq!(tenant["sus_in_use"], 1);

    let (status, body) = get_json(app, "/api/v1/tenants/initech").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("initech"));
}

#[tokio::test]
async fn test_what_if_endpoint() {
    let (app, state) = setup_test_app().await;
    let dir = snapshot_dir();
    refresh_once(&state, &FileSource::new(dir.path())).await;

    let (status, projection) = get_json(app, "/api/v1/what-if?endpoints=15000").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(projection["sus_needed"], 3);
    assert_eq!(projection["current_sus"], 3);
    assert_eq!(projection["node_plan"]["pnode"], 12);
    assert_eq!(projection["required"]["add_vcpu"], 636);
    assert_eq!(projection["within_capacity"], false);
    assert_eq!(projection["ram_deficit"], 372);
}

#[tokio::test]
async fn test_what_if_rejects_missing_endpoints() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/what-if")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, state) = setup_test_app().await;
    let dir = snapshot_dir();
    refresh_once(&state, &FileSource::new(dir.path())).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("capacity_safe_headroom_endpoints"));
    assert!(metrics_text.contains("capacity_storage_status"));
    assert!(metrics_text.contains("capacity_evaluation_latency_seconds_bucket"));
    assert!(metrics_text.contains("capacity_source_load_errors_total"));
    assert!(metrics_text.contains("capacity_source_age_seconds{source=\"tenants\"}"));
}
