//! Error types for the ingestion pipeline
//!
//! One `thiserror` enum with an HTTP status mapping, plus a serializable
//! per-record failure list.

use hyper::StatusCode;
use serde::Serialize;
use std::fmt;

use crate::ingest::Kind;

/// Stage of a kind's pass in which a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Load,
    Fetch,
    Decode,
    Register,
    Resolve,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Fetch => "fetch",
            Stage::Decode => "decode",
            Stage::Register => "register",
            Stage::Resolve => "resolve",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// A failure attributable to one row or record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordFailure {
    /// Malformed row; `row` is the 1-based data row index (header excluded)
    Decode {
        row: usize,
        field: String,
        message: String,
    },
    /// Two rows of the same kind share a TmpId
    DuplicateTmpId { tmp_id: String, rows: Vec<usize> },
    /// A reference names a TmpId absent from the target kind's registry
    UnresolvedReference {
        tmp_id: String,
        role: String,
        target_kind: Kind,
        target_tmp_id: String,
    },
    /// The store rejected (or never attempted) this record
    Write { tmp_id: String, message: String },
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode { row, field, message } => {
                write!(f, "row {}: field '{}': {}", row, field, message)
            }
            Self::DuplicateTmpId { tmp_id, rows } => {
                write!(f, "duplicate TmpId '{}' on rows {:?}", tmp_id, rows)
            }
            Self::UnresolvedReference {
                tmp_id,
                role,
                target_kind,
                target_tmp_id,
            } => write!(
                f,
                "'{}' references unknown {} '{}' as {}",
                tmp_id, target_kind, target_tmp_id, role
            ),
            Self::Write { tmp_id, message } => write!(f, "'{}': {}", tmp_id, message),
        }
    }
}

/// Main error type for ingestion operations
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{kind} {stage} failed: {} record failure(s)", .failures.len())]
    Pass {
        kind: Kind,
        stage: Stage,
        failures: Vec<RecordFailure>,
    },

    #[error("{kind} write partially failed: {written} written, {} failed", .failures.len())]
    PartialWrite {
        kind: Kind,
        written: usize,
        failures: Vec<RecordFailure>,
    },

    /// A transport or configuration error raised during a kind's pass
    #[error("{kind} {stage} failed: {source}")]
    AtStage {
        kind: Kind,
        stage: Stage,
        source: Box<IngestError>,
    },

    #[error("Sheet schema error for {kind}: {message}")]
    Schema { kind: Kind, message: String },

    #[error("Row source error: {0}")]
    Source(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("An ingestion run is already in progress")]
    Busy,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IngestError {
    /// Tag an error with the pass it came from, unless it already names one
    pub fn at_stage(self, kind: Kind, stage: Stage) -> Self {
        if self.kind().is_some() {
            return self;
        }
        Self::AtStage {
            kind,
            stage,
            source: Box::new(self),
        }
    }

    /// The error beneath any stage tag
    pub fn root(&self) -> &IngestError {
        match self {
            Self::AtStage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AtStage { source, .. } => source.status_code(),
            Self::Pass { .. } | Self::Schema { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PartialWrite { .. } => StatusCode::BAD_GATEWAY,
            Self::Source(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Busy => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Kind whose pass failed, if the error is tied to one
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Self::Pass { kind, .. }
            | Self::PartialWrite { kind, .. }
            | Self::Schema { kind, .. }
            | Self::AtStage { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Stage of the pass that failed, if the error is tied to one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Pass { stage, .. } | Self::AtStage { stage, .. } => Some(*stage),
            Self::PartialWrite { .. } => Some(Stage::Write),
            Self::Schema { .. } => Some(Stage::Decode),
            _ => None,
        }
    }

    /// Per-record failures carried by this error
    pub fn failures(&self) -> &[RecordFailure] {
        match self {
            Self::Pass { failures, .. } | Self::PartialWrite { failures, .. } => failures.as_slice(),
            Self::AtStage { source, .. } => source.failures(),
            _ => &[],
        }
    }

    /// JSON body for HTTP error responses
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "stage": self.stage(),
            "failures": self.failures(),
        })
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for IngestError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        Self::Source(err.to_string())
    }
}

impl From<mongodb::error::Error> for IngestError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for IngestError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Internal(format!("BSON serialization failed: {}", err))
    }
}

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;
