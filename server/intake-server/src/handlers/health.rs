use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::server::IntakeServer;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: BTreeMap<String, String>,
}

/// Version information response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
    /// Version tag written into every schema document
    pub schema_version: u32,
    pub features: Vec<String>,
}

/// Health check handler. Answers 503 while storage is unreachable.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Storage is unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(server): State<IntakeServer>) -> (StatusCode, Json<HealthResponse>) {
    let store_healthy = server.store.is_healthy().await;

    let mut checks = BTreeMap::new();
    checks.insert(
        "storage".to_string(),
        if store_healthy { "healthy" } else { "unreachable" }.to_string(),
    );

    let status = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if store_healthy { "healthy" } else { "degraded" }.to_string(),
        timestamp: server.clock.now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: server.uptime().as_secs(),
        checks,
    };

    (status, Json(response))
}

/// Version information handler
#[utoipa::path(
    get,
    path = "/version",
    responses(
        (status = 200, description = "Build information", body = VersionResponse)
    ),
    tag = "health"
)]
pub async fn version_info() -> Json<VersionResponse> {
    let features = vec![
        "form-builder".to_string(),
        "conditional-fields".to_string(),
        "step-groups".to_string(),
        "submission-dashboard".to_string(),
    ];

    Json(VersionResponse {
        name: "Intake Forms Engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: form_engine::schema::SCHEMA_VERSION,
        features,
    })
}
