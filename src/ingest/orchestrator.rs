//! Ingestion Orchestrator
//!
//! Runs one pass per kind in dependency order:
//!
//! ```text
//! Deities -> Shloks -> Stotras -> Prarthanas -> Done
//! ```
//!
//! Each pass: load existing ids -> fetch rows -> decode -> check duplicate
//! TmpIds -> assign ids for new drafts -> resolve -> write. The first
//! unrecoverable error ends the run; nothing after it is attempted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::{StoreReader, StoreWriter};
use crate::ingest::decoder::{decode_sheet, DEFAULT_LIST_DELIMITER};
use crate::ingest::kind::{Kind, Phase};
use crate::ingest::model::Draft;
use crate::ingest::registry::IdRegistry;
use crate::ingest::resolver::Resolver;
use crate::ingest::writer::BatchWriter;
use crate::source::RowSource;
use crate::types::{IngestError, RecordFailure, Result, Stage};

/// What to do with a record holding an unresolved reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePolicy {
    /// Abort the pass on the first unresolved reference
    #[default]
    Strict,
    /// Exclude the record, write the rest, report the exclusion
    Lenient,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub policy: ReferencePolicy,
    pub list_delimiter: char,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            policy: ReferencePolicy::Strict,
            list_delimiter: DEFAULT_LIST_DELIMITER,
        }
    }
}

/// Run-scoped state handed to every stage; discarded when the run ends
#[derive(Debug)]
pub struct IngestionRun {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub registry: IdRegistry,
    pub phase: Phase,
}

impl IngestionRun {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            registry: IdRegistry::new(),
            phase: Phase::Deities,
        }
    }
}

impl Default for IngestionRun {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one kind's pass
#[derive(Debug, Clone, Serialize)]
pub struct KindReport {
    pub kind: Kind,
    pub fetched_rows: usize,
    pub decoded: usize,
    pub written: usize,
    /// Permanent ids written, in row order
    pub inserted_ids: Vec<String>,
    /// TmpIds already persisted by an earlier run, left untouched
    pub skipped_existing: Vec<String>,
    /// Records left out under the lenient reference policy
    pub excluded: Vec<RecordFailure>,
}

/// Outcome of a full run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub phase: Phase,
    pub kinds: Vec<KindReport>,
}

impl RunReport {
    pub fn written(&self) -> usize {
        self.kinds.iter().map(|k| k.written).sum()
    }
}

/// Log a stage failure and tag the error with its kind and stage
fn at_stage<T>(kind: Kind, stage: Stage, result: Result<T>) -> Result<T> {
    result.map_err(|err| {
        error!(kind = %kind, stage = %stage, error = %err, "Ingestion pass failed");
        err.at_stage(kind, stage)
    })
}

/// Group drafts by TmpId; every TmpId on more than one row is a failure
fn duplicate_tmp_ids(drafts: &[Draft]) -> Vec<RecordFailure> {
    let mut order: Vec<&str> = Vec::new();
    let mut rows: HashMap<&str, Vec<usize>> = HashMap::new();
    for draft in drafts {
        let tmp_id = draft.tmp_id();
        let seen = rows.entry(tmp_id).or_default();
        if seen.is_empty() {
            order.push(tmp_id);
        }
        seen.push(draft.row());
    }

    order
        .into_iter()
        .filter_map(|tmp_id| {
            let rows = rows.remove(tmp_id)?;
            (rows.len() > 1).then(|| RecordFailure::DuplicateTmpId {
                tmp_id: tmp_id.to_string(),
                rows,
            })
        })
        .collect()
}

/// Wires a row source and a store into the ingestion passes
pub struct Pipeline {
    source: Arc<dyn RowSource>,
    reader: Arc<dyn StoreReader>,
    writer: BatchWriter,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn RowSource>,
        reader: Arc<dyn StoreReader>,
        writer: Arc<dyn StoreWriter>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            reader,
            writer: BatchWriter::new(writer),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ingest a single kind. Dependency registries are loaded from the
    /// store first, so the kinds it references must already be persisted.
    pub async fn ingest(&self, kind: Kind) -> Result<KindReport> {
        let mut run = IngestionRun::new();
        info!(run_id = %run.run_id, kind = %kind, source = %self.source.describe(), "Starting ingestion");

        for dep in kind.dependencies() {
            at_stage(
                kind,
                Stage::Load,
                run.registry.load_existing(*dep, self.reader.as_ref()).await,
            )?;
        }

        self.run_kind(&mut run, kind).await
    }

    /// Run every kind in dependency order, stopping at the first failure
    pub async fn ingest_all(&self) -> Result<RunReport> {
        let mut run = IngestionRun::new();
        info!(run_id = %run.run_id, source = %self.source.describe(), "Starting full ingestion run");

        let mut kinds = Vec::with_capacity(Kind::ORDER.len());
        while let Some(kind) = run.phase.kind() {
            let report = self.run_kind(&mut run, kind).await?;
            kinds.push(report);
            run.phase = run.phase.next();
        }

        let report = RunReport {
            run_id: run.run_id.clone(),
            started_at: run.started_at,
            finished_at: Utc::now(),
            phase: run.phase,
            kinds,
        };
        info!(run_id = %report.run_id, written = report.written(), "Ingestion run complete");
        Ok(report)
    }

    /// One kind's pass within `run`
    pub async fn run_kind(&self, run: &mut IngestionRun, kind: Kind) -> Result<KindReport> {
        if let Some(dep) = kind
            .dependencies()
            .iter()
            .find(|dep| !run.registry.is_loaded(**dep))
        {
            return Err(IngestError::Config(format!(
                "cannot ingest {}: {} ids are not loaded",
                kind.collection(),
                dep.collection()
            )));
        }

        let mut report = KindReport {
            kind,
            fetched_rows: 0,
            decoded: 0,
            written: 0,
            inserted_ids: Vec::new(),
            skipped_existing: Vec::new(),
            excluded: Vec::new(),
        };

        at_stage(
            kind,
            Stage::Load,
            run.registry.load_existing(kind, self.reader.as_ref()).await,
        )?;

        let sheet = at_stage(kind, Stage::Fetch, self.source.fetch_rows(kind).await)?;
        report.fetched_rows = sheet.rows.len();
        info!(kind = %kind, rows = sheet.rows.len(), "Fetched rows");

        let drafts = at_stage(
            kind,
            Stage::Decode,
            decode_sheet(kind, &sheet, self.config.list_delimiter),
        )?;
        report.decoded = drafts.len();

        let duplicates = duplicate_tmp_ids(&drafts);
        if !duplicates.is_empty() {
            return at_stage(
                kind,
                Stage::Register,
                Err(IngestError::Pass {
                    kind,
                    stage: Stage::Register,
                    failures: duplicates,
                }),
            );
        }

        let mut pending = Vec::with_capacity(drafts.len());
        for draft in drafts {
            if run.registry.is_persisted(kind, draft.tmp_id()) {
                report.skipped_existing.push(draft.tmp_id().to_string());
                continue;
            }
            run.registry.assign(kind, draft.tmp_id());
            pending.push(draft);
        }
        if !report.skipped_existing.is_empty() {
            info!(
                kind = %kind,
                skipped = report.skipped_existing.len(),
                "Skipping records persisted by an earlier run"
            );
        }

        let mut resolved = Vec::with_capacity(pending.len());
        {
            let resolver = Resolver::new(&run.registry);
            for draft in &pending {
                match resolver.resolve(draft) {
                    Ok(record) => resolved.push(record),
                    Err(failure) => match self.config.policy {
                        ReferencePolicy::Strict => {
                            return at_stage(
                                kind,
                                Stage::Resolve,
                                Err(IngestError::Pass {
                                    kind,
                                    stage: Stage::Resolve,
                                    failures: vec![failure],
                                }),
                            );
                        }
                        ReferencePolicy::Lenient => {
                            warn!(kind = %kind, row = draft.row(), %failure, "Excluding record");
                            report.excluded.push(failure);
                        }
                    },
                }
            }
        }

        // Excluded records are never written, so nothing may link to them
        for failure in &report.excluded {
            if let RecordFailure::UnresolvedReference { tmp_id, .. } = failure {
                run.registry.withdraw(kind, tmp_id);
            }
        }

        let written = at_stage(
            kind,
            Stage::Write,
            self.writer.write(kind, &run.run_id, resolved).await,
        )?;
        report.written = written.written;
        report.inserted_ids = written.ids;

        info!(
            kind = %kind,
            written = report.written,
            skipped = report.skipped_existing.len(),
            excluded = report.excluded.len(),
            "Pass complete"
        );
        Ok(report)
    }
}
