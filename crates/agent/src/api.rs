//! HTTP API: health probes, Prometheus metrics, raw snapshots and evaluated reports

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use capacity_lib::{
    health::{ComponentStatus, HealthRegistry},
    observability::{CapacityMetrics, StructuredLogger},
    CapacityReport, EngineConfig, SnapshotSet,
};
use chrono::Utc;
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: CapacityMetrics,
    pub logger: StructuredLogger,
    pub engine: EngineConfig,
    pub snapshots: Arc<RwLock<SnapshotSet>>,
    pub last_report: Arc<RwLock<Option<CapacityReport>>>,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: CapacityMetrics,
        logger: StructuredLogger,
        engine: EngineConfig,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            logger,
            engine,
            snapshots: Arc::new(RwLock::new(SnapshotSet::default())),
            last_report: Arc::new(RwLock::new(None)),
        }
    }

    /// Evaluate the current snapshots at the current time
    pub async fn report(&self) -> CapacityReport {
        let snapshots = self.snapshots.read().await;
        CapacityReport::build(&snapshots, &self.engine, Utc::now())
    }
}

#[derive(Debug, Deserialize)]
pub struct WhatIfQuery {
    pub endpoints: u64,
}

/// Returns 200 while every source is at least degraded, 503 otherwise
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %err, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn tenants_snapshot(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.snapshots.read().await.tenants.data.clone())
}

async fn integrations_snapshot(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.snapshots.read().await.integrations.data.clone())
}

async fn storage_snapshot(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.snapshots.read().await.storage.data.clone())
}

async fn report(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.report().await)
}

async fn tenant(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let report = state.report().await;
    match report.tenant(&id) {
        Some(row) => Json(row.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("tenant {id} not found") })),
        )
            .into_response(),
    }
}

async fn what_if(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WhatIfQuery>,
) -> impl IntoResponse {
    let report = state.report().await;
    Json(report.what_if(query.endpoints, &state.engine))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/tenants.json", get(tenants_snapshot))
        .route("/api/integrations.json", get(integrations_snapshot))
        .route("/api/hdfs.json", get(storage_snapshot))
        .route("/api/v1/report", get(report))
        .route("/api/v1/tenants/:id", get(tenant))
        .route("/api/v1/what-if", get(what_if))
        .with_state(state)
}

pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
