//! Common metadata for all documents
//!
//! Records when and by which run a document was written, and its position in
//! that run's batch. Insert-only: set once by the batch writer.

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Common metadata for all documents
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    /// When the document was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    /// Ingestion run that wrote the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// Zero-based position in the run's batch for this collection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

impl Metadata {
    /// Stamp metadata for a document about to be inserted
    pub fn stamp(run_id: &str, position: usize) -> Self {
        Self {
            created_at: Some(DateTime::now()),
            run_id: Some(run_id.to_string()),
            position: Some(position as i64),
        }
    }
}
