//! Local JSON exports: `<dir>/<collection>.json` holding `{header, rows}`

use std::path::{Path, PathBuf};
use tracing::debug;

use super::{RowSource, Sheet};
use crate::ingest::Kind;
use crate::types::{IngestError, Result};

pub struct FileRowSource {
    dir: PathBuf,
}

impl FileRowSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, kind: Kind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.collection()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl RowSource for FileRowSource {
    async fn fetch_rows(&self, kind: Kind) -> Result<Sheet> {
        let path = self.path_for(kind);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| IngestError::Source(format!("Failed to read {}: {}", path.display(), e)))?;

        let sheet: Sheet = serde_json::from_slice(&bytes)
            .map_err(|e| IngestError::Source(format!("Invalid sheet in {}: {}", path.display(), e)))?;

        debug!(kind = %kind, path = %path.display(), rows = sheet.rows.len(), "Read sheet file");
        Ok(sheet)
    }

    fn describe(&self) -> String {
        format!("files in {}", self.dir.display())
    }
}
