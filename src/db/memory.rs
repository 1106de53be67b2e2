//! In-memory store (for testing and dry runs)
//!
//! Mirrors the MongoDB behaviour the pipeline relies on: ordered inserts
//! that stop at the first rejected document, and uniqueness of `_id` and
//! `TmpId` within a collection.

use bson::{Bson, Document};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::db::schemas::TMP_ID_FIELD;
use crate::db::store::{InsertFailure, InsertOutcome, StoreReader, StoreWriter};
use crate::ingest::Kind;
use crate::types::{IngestError, Result};

/// Simple in-memory document store
#[derive(Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<Kind, Vec<Document>>>>,
    unreachable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert documents directly, bypassing uniqueness checks
    pub async fn seed(&self, kind: Kind, documents: Vec<Document>) {
        self.collections
            .write()
            .await
            .entry(kind)
            .or_default()
            .extend(documents);
    }

    /// Snapshot of a collection in insertion order
    pub async fn documents(&self, kind: Kind) -> Vec<Document> {
        self.collections
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn count(&self, kind: Kind) -> usize {
        self.collections
            .read()
            .await
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Make every subsequent call fail as if the server were down
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(IngestError::Database(
                "server selection timeout: store unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

fn same_value(existing: &Document, candidate: &Document, field: &str) -> bool {
    match (existing.get(field), candidate.get(field)) {
        (Some(a), Some(b)) => a == b && *b != Bson::Null,
        _ => false,
    }
}

#[async_trait::async_trait]
impl StoreReader for InMemoryStore {
    async fn find_all(&self, kind: Kind, fields: &[&str]) -> Result<Vec<Document>> {
        self.check_reachable()?;

        let collections = self.collections.read().await;
        let projected = collections
            .get(&kind)
            .map(|docs| {
                docs.iter()
                    .map(|doc| {
                        let mut out = Document::new();
                        for field in fields {
                            if let Some(value) = doc.get(*field) {
                                out.insert(*field, value.clone());
                            }
                        }
                        out
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(projected)
    }
}

#[async_trait::async_trait]
impl StoreWriter for InMemoryStore {
    async fn insert_many(&self, kind: Kind, documents: Vec<Document>) -> Result<InsertOutcome> {
        self.check_reachable()?;

        let mut collections = self.collections.write().await;
        let collection = collections.entry(kind).or_default();
        let mut outcome = InsertOutcome::default();

        for (index, doc) in documents.into_iter().enumerate() {
            let duplicate = [("_id", "duplicate key _id"), (TMP_ID_FIELD, "duplicate key TmpId")]
                .into_iter()
                .find(|(field, _)| collection.iter().any(|e| same_value(e, &doc, field)));

            if let Some((_, message)) = duplicate {
                outcome.failures.push(InsertFailure {
                    index,
                    message: format!("E11000 {} in {}", message, kind.collection()),
                });
                break;
            }

            collection.push(doc);
            outcome.inserted += 1;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[tokio::test]
    async fn test_insert_stops_at_first_duplicate() {
        let store = InMemoryStore::new();
        store
            .seed(Kind::Deity, vec![doc! { "_id": "a", "TmpId": "D1" }])
            .await;

        let outcome = store
            .insert_many(
                Kind::Deity,
                vec![
                    doc! { "_id": "b", "TmpId": "D2" },
                    doc! { "_id": "c", "TmpId": "D1" },
                    doc! { "_id": "d", "TmpId": "D3" },
                ],
            )
            .await
            .unwrap();

        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].index, 1);
        assert!(outcome.failures[0].message.contains("TmpId"));
        assert_eq!(store.count(Kind::Deity).await, 2);
    }

    #[tokio::test]
    async fn test_find_all_projects_fields() {
        let store = InMemoryStore::new();
        store
            .seed(
                Kind::Stotra,
                vec![doc! { "_id": "s1", "TmpId": "S1", "title": { "en": "Aarti" } }],
            )
            .await;

        let docs = store.find_all(Kind::Stotra, &["_id", "TmpId"]).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get_str("TmpId").unwrap(), "S1");
        assert!(docs[0].get("title").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_store_fails() {
        let store = InMemoryStore::new();
        store.set_unreachable(true);

        let err = store.find_all(Kind::Deity, &["_id"]).await.unwrap_err();
        assert!(matches!(err, IngestError::Database(_)));
    }
}
