//! Id Registry - TmpId to permanent id, per kind
//!
//! Owned by a single ingestion run. Entries come from two places: documents
//! already persisted (`load_existing`) and ids allocated for new drafts
//! (`assign`). Permanent ids are UUID v4 strings and never collide with any
//! id loaded or issued in the run, across all kinds.

use bson::{Bson, Document};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::schemas::TMP_ID_FIELD;
use crate::db::StoreReader;
use crate::ingest::Kind;
use crate::types::Result;

/// Where a registry entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Read back from the store
    Persisted,
    /// Allocated during this run
    Allocated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub permanent_id: String,
    pub origin: Origin,
}

/// Per-kind TmpId -> permanent id mapping
#[derive(Debug, Default)]
pub struct IdRegistry {
    entries: HashMap<Kind, HashMap<String, RegistryEntry>>,
    loaded: HashSet<Kind>,
    issued: HashSet<String>,
}

/// `_id` as stored: a string, or an ObjectId from documents written elsewhere
fn permanent_id(doc: &Document) -> Option<String> {
    match doc.get("_id")? {
        Bson::String(id) if !id.is_empty() => Some(id.clone()),
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        _ => None,
    }
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every persisted document of `kind` that carries a TmpId.
    /// Returns the number of entries loaded.
    pub async fn load_existing(&mut self, kind: Kind, store: &dyn StoreReader) -> Result<usize> {
        let documents = store.find_all(kind, &["_id", TMP_ID_FIELD]).await?;

        let entries = self.entries.entry(kind).or_default();
        let mut skipped = 0;

        for doc in &documents {
            let tmp_id = match doc.get_str(TMP_ID_FIELD) {
                Ok(tmp_id) if !tmp_id.is_empty() => tmp_id,
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            let Some(id) = permanent_id(doc) else {
                warn!(kind = %kind, tmp_id, "Persisted document has no usable _id");
                skipped += 1;
                continue;
            };

            self.issued.insert(id.clone());
            let previous = entries.insert(
                tmp_id.to_string(),
                RegistryEntry {
                    permanent_id: id.clone(),
                    origin: Origin::Persisted,
                },
            );
            if let Some(previous) = previous {
                warn!(
                    kind = %kind,
                    tmp_id,
                    replaced = %previous.permanent_id,
                    kept = %id,
                    "TmpId is persisted more than once; linking to the later document"
                );
            }
        }

        self.loaded.insert(kind);
        let loaded = documents.len() - skipped;
        debug!(kind = %kind, loaded, skipped, "Loaded existing ids");
        Ok(loaded)
    }

    /// Permanent id for `tmp_id`, allocating a fresh one if unregistered
    pub fn assign(&mut self, kind: Kind, tmp_id: &str) -> String {
        self.assign_with(kind, tmp_id, || Uuid::new_v4().to_string())
    }

    fn assign_with(&mut self, kind: Kind, tmp_id: &str, mut generate: impl FnMut() -> String) -> String {
        if let Some(id) = self.lookup(kind, tmp_id) {
            return id.to_string();
        }

        let id = loop {
            let candidate = generate();
            if !self.issued.contains(&candidate) {
                break candidate;
            }
        };

        self.issued.insert(id.clone());
        self.entries.entry(kind).or_default().insert(
            tmp_id.to_string(),
            RegistryEntry {
                permanent_id: id.clone(),
                origin: Origin::Allocated,
            },
        );
        id
    }

    /// Registered permanent id, never a generated fallback
    pub fn lookup(&self, kind: Kind, tmp_id: &str) -> Option<&str> {
        self.entry(kind, tmp_id).map(|e| e.permanent_id.as_str())
    }

    pub fn entry(&self, kind: Kind, tmp_id: &str) -> Option<&RegistryEntry> {
        self.entries.get(&kind).and_then(|m| m.get(tmp_id))
    }

    pub fn is_persisted(&self, kind: Kind, tmp_id: &str) -> bool {
        matches!(self.entry(kind, tmp_id), Some(e) if e.origin == Origin::Persisted)
    }

    /// Remove an id allocated this run whose record will not be written.
    /// Persisted entries are never withdrawn. The id stays reserved.
    pub fn withdraw(&mut self, kind: Kind, tmp_id: &str) -> bool {
        let Some(entries) = self.entries.get_mut(&kind) else {
            return false;
        };
        match entries.get(tmp_id) {
            Some(e) if e.origin == Origin::Allocated => entries.remove(tmp_id).is_some(),
            _ => false,
        }
    }

    /// Whether `load_existing` has run for `kind`
    pub fn is_loaded(&self, kind: Kind) -> bool {
        self.loaded.contains(&kind)
    }

    pub fn len(&self, kind: Kind) -> usize {
        self.entries.get(&kind).map(HashMap::len).unwrap_or(0)
    }

    pub fn is_empty(&self, kind: Kind) -> bool {
        self.len(kind) == 0
    }
}
