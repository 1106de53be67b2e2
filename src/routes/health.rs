//! Health check endpoints
//!
//! - /health-check, /health - liveness; 200 whenever the process is serving
//! - /version - build information

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::json_response;
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub timestamp: String,
    pub uptime_secs: i64,
    /// Whether an ingestion run is in flight
    pub ingesting: bool,
    pub database: String,
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub git_commit: &'static str,
    pub build_timestamp: &'static str,
}

/// Handle liveness probe (/health-check, /health)
pub fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    let now = chrono::Utc::now();
    let response = HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: now.to_rfc3339(),
        uptime_secs: (now - state.started_at).num_seconds(),
        ingesting: state.is_running(),
        database: state.args.mongodb_db.clone(),
    };

    let body = serde_json::to_value(&response)
        .unwrap_or_else(|_| serde_json::json!({ "healthy": true, "error": "Serialization failed" }));

    json_response(StatusCode::OK, &body)
}

/// Handle /version
pub fn version_info() -> Response<Full<Bytes>> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        git_commit: env!("GIT_COMMIT_SHORT"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
    };

    let body = serde_json::to_value(&response)
        .unwrap_or_else(|_| serde_json::json!({ "version": env!("CARGO_PKG_VERSION") }));

    json_response(StatusCode::OK, &body)
}
