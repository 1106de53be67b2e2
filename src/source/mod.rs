//! Row sources
//!
//! A row source returns one worksheet per kind as a header plus rows of
//! string cells. The pipeline only sees the `RowSource` trait.
//!
//! - `SheetRowSource` reads the spreadsheet provider's records API
//! - `FileRowSource` reads `<dir>/<collection>.json`
//! - `InMemoryRowSource` serves fixed sheets for tests and dry runs

mod file;
mod sheet;

pub use file::FileRowSource;
pub use sheet::{SheetConfig, SheetRowSource};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::ingest::Kind;
use crate::types::{IngestError, Result};

/// One worksheet: header row plus data rows, all cells as strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub header: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(header: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }
}

/// Source of raw rows for one kind
#[async_trait::async_trait]
pub trait RowSource: Send + Sync {
    /// Fetch the worksheet holding `kind`. Transport or auth failures are
    /// `IngestError::Source`.
    async fn fetch_rows(&self, kind: Kind) -> Result<Sheet>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Fixed in-memory sheets
#[derive(Default)]
pub struct InMemoryRowSource {
    sheets: RwLock<HashMap<Kind, Sheet>>,
}

impl InMemoryRowSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, kind: Kind, sheet: Sheet) -> Self {
        self.sheets.get_mut().insert(kind, sheet);
        self
    }

    pub async fn set_sheet(&self, kind: Kind, sheet: Sheet) {
        self.sheets.write().await.insert(kind, sheet);
    }
}

#[async_trait::async_trait]
impl RowSource for InMemoryRowSource {
    async fn fetch_rows(&self, kind: Kind) -> Result<Sheet> {
        self.sheets
            .read()
            .await
            .get(&kind)
            .cloned()
            .ok_or_else(|| IngestError::Source(format!("no sheet for {}", kind.collection())))
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_source() {
        let source = InMemoryRowSource::new();
        source
            .set_sheet(Kind::Deity, Sheet::new(&["TmpId", "title_en"], &[&["D1", "Shiva"]]))
            .await;

        let sheet = source.fetch_rows(Kind::Deity).await.unwrap();
        assert_eq!(sheet.header, vec!["TmpId", "title_en"]);
        assert_eq!(sheet.rows[0][1], "Shiva");

        let err = source.fetch_rows(Kind::Stotra).await.unwrap_err();
        assert!(matches!(err, IngestError::Source(_)));
    }
}
