//! Store traits the pipeline reads and writes through
//!
//! Documents cross this boundary as untyped BSON so one implementation
//! serves all four collections.

use bson::Document;

use crate::ingest::Kind;
use crate::types::Result;

/// One rejected document in an ordered bulk insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertFailure {
    /// Position of the document in the submitted batch
    pub index: usize,
    pub message: String,
}

/// Result of an ordered bulk insert
///
/// With ordered inserts the store stops at the first rejected document, so
/// every index after the first failure was never attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    pub inserted: usize,
    pub failures: Vec<InsertFailure>,
}

impl InsertOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Read side used by `IdRegistry::load_existing`
#[async_trait::async_trait]
pub trait StoreReader: Send + Sync {
    /// All documents of `kind`, projected to `fields`
    async fn find_all(&self, kind: Kind, fields: &[&str]) -> Result<Vec<Document>>;
}

/// Write side used by the batch writer; insert-only
#[async_trait::async_trait]
pub trait StoreWriter: Send + Sync {
    /// Ordered bulk insert. Transport failures are `Err`; per-document
    /// rejections are reported in the outcome.
    async fn insert_many(&self, kind: Kind, documents: Vec<Document>) -> Result<InsertOutcome>;
}
