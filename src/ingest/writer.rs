//! Batch Writer - ordered, insert-only bulk writes per kind

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::schemas::Metadata;
use crate::db::StoreWriter;
use crate::ingest::model::Resolved;
use crate::ingest::Kind;
use crate::types::{IngestError, RecordFailure, Result};

/// Outcome of a fully successful batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub written: usize,
    /// Permanent ids in insertion order
    pub ids: Vec<String>,
}

pub struct BatchWriter {
    store: Arc<dyn StoreWriter>,
}

impl BatchWriter {
    pub fn new(store: Arc<dyn StoreWriter>) -> Self {
        Self { store }
    }

    /// Write `records` in order as one bulk insert. Any rejected record makes
    /// the batch a partial write naming every record that did not land.
    pub async fn write(&self, kind: Kind, run_id: &str, mut records: Vec<Resolved>) -> Result<WriteReport> {
        if records.is_empty() {
            return Ok(WriteReport::default());
        }

        let mut documents = Vec::with_capacity(records.len());
        for (position, record) in records.iter_mut().enumerate() {
            record.stamp(Metadata::stamp(run_id, position));
            documents.push(record.to_document()?);
        }

        let total = records.len();
        let outcome = self.store.insert_many(kind, documents).await?;

        if outcome.is_complete() && outcome.inserted == total {
            let ids: Vec<String> = records.iter().map(|r| r.id().to_string()).collect();
            info!(kind = %kind, written = total, "Batch written");
            return Ok(WriteReport { written: total, ids });
        }

        let rejected: HashMap<usize, &str> = outcome
            .failures
            .iter()
            .map(|f| (f.index, f.message.as_str()))
            .collect();
        let stop = outcome
            .failures
            .iter()
            .map(|f| f.index)
            .min()
            .unwrap_or(outcome.inserted)
            .min(total);
        let stopped_at = records.get(stop).map(Resolved::tmp_id).unwrap_or_default();

        let failures: Vec<RecordFailure> = records[stop..]
            .iter()
            .enumerate()
            .map(|(offset, record)| {
                let message = match rejected.get(&(stop + offset)) {
                    Some(message) => message.to_string(),
                    None => format!("not attempted: ordered insert stopped at '{}'", stopped_at),
                };
                RecordFailure::Write {
                    tmp_id: record.tmp_id().to_string(),
                    message,
                }
            })
            .collect();

        warn!(
            kind = %kind,
            written = outcome.inserted,
            failed = failures.len(),
            "Batch partially written"
        );

        Err(IngestError::PartialWrite {
            kind,
            written: outcome.inserted,
            failures,
        })
    }
}
