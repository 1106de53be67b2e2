//! Ingestion endpoints
//!
//! ```text
//! POST /prarthana_script/v1/deities     -> one kind
//! POST /prarthana_script/v1/shloks
//! POST /prarthana_script/v1/stotras
//! POST /prarthana_script/v1/prarthanas
//! POST /prarthana_script/v1/all         -> every kind in dependency order
//! ```
//!
//! Runs are serialized by the run lock; a request arriving mid-run gets 409.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use std::sync::Arc;
use tracing::warn;

use super::{error_response, json_response};
use crate::ingest::Kind;
use crate::server::AppState;
use crate::types::{IngestError, Result};

fn to_json<T: serde::Serialize>(report: &T) -> Result<serde_json::Value> {
    serde_json::to_value(report)
        .map_err(|e| IngestError::Internal(format!("Failed to serialize report: {}", e)))
}

/// Handle POST /prarthana_script/v1/{segment}
pub async fn handle_ingest_request(state: Arc<AppState>, segment: &str) -> Response<Full<Bytes>> {
    let target = match segment {
        "all" => None,
        other => match Kind::from_collection(other) {
            Some(kind) => Some(kind),
            None => {
                return error_response(&IngestError::NotFound(format!(
                    "unknown collection '{}'",
                    other
                )))
            }
        },
    };

    let Some(_run) = state.try_begin_run() else {
        warn!(segment, "Rejecting ingestion request: run in progress");
        return error_response(&IngestError::Busy);
    };

    let result = match target {
        Some(kind) => state.pipeline.ingest(kind).await.and_then(|r| to_json(&r)),
        None => state.pipeline.ingest_all().await.and_then(|r| to_json(&r)),
    };

    match result {
        Ok(report) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "status": "success", "report": report }),
        ),
        Err(err) => error_response(&err),
    }
}
