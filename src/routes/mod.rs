//! HTTP routes

pub mod health;
pub mod ingest;

pub use health::{health_check, version_info};
pub use ingest::handle_ingest_request;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};

use crate::types::IngestError;

/// JSON response with the given status
pub fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Error response carrying kind, stage and record failures
pub fn error_response(err: &IngestError) -> Response<Full<Bytes>> {
    json_response(err.status_code(), &err.to_json())
}
