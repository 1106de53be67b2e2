//! Spreadsheet provider client
//!
//! Fetches a worksheet's records as JSON:
//!
//! ```text
//! GET {base_url}/{workbook}?method=worksheet.records.fetch&worksheet_name={name}
//! Authorization: Zoho-oauthtoken {access_token}
//!
//! {"status": "success", "records": [{"row_index": 2, "TmpId": "D1", ...}]}
//! ```
//!
//! The access token is issued out of band; no token exchange happens here.

use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::{RowSource, Sheet};
use crate::ingest::Kind;
use crate::types::{IngestError, Result};

/// Record keys added by the provider, not part of the sheet
const PROVIDER_KEYS: &[&str] = &["row_index"];

/// Connection settings for the spreadsheet provider
#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub base_url: String,
    pub workbook: String,
    pub access_token: String,
    /// Worksheet name per kind; defaults to the collection name
    pub worksheets: HashMap<Kind, String>,
    pub timeout: Duration,
}

impl SheetConfig {
    pub fn worksheet(&self, kind: Kind) -> &str {
        self.worksheets
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.collection())
    }
}

pub struct SheetRowSource {
    config: SheetConfig,
    http_client: reqwest::Client,
}

impl SheetRowSource {
    pub fn new(config: SheetConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("prarthana-ingest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IngestError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

/// Cell text for a JSON record value
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Build a sheet from provider records. Columns appear in the order keys are
/// first seen; missing keys read as empty cells.
pub fn sheet_from_records(body: &Value) -> Result<Sheet> {
    if let Some(status) = body.get("status").and_then(Value::as_str) {
        if status != "success" {
            let message = body
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or(status);
            return Err(IngestError::Source(format!("Sheet API error: {}", message)));
        }
    }

    let records = body
        .get("records")
        .and_then(Value::as_array)
        .ok_or_else(|| IngestError::Source("Sheet API response has no records".to_string()))?;

    let mut header: Vec<String> = Vec::new();
    for record in records {
        let Some(fields) = record.as_object() else {
            return Err(IngestError::Source("Sheet API record is not an object".to_string()));
        };
        for key in fields.keys() {
            if !PROVIDER_KEYS.contains(&key.as_str()) && !header.contains(key) {
                header.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(Value::as_object)
        .map(|fields| {
            header
                .iter()
                .map(|column| fields.get(column).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(Sheet { header, rows })
}

#[async_trait::async_trait]
impl RowSource for SheetRowSource {
    async fn fetch_rows(&self, kind: Kind) -> Result<Sheet> {
        let worksheet = self.config.worksheet(kind);
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.workbook
        );
        debug!(kind = %kind, worksheet, "Fetching worksheet records");

        let response = self
            .http_client
            .get(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Zoho-oauthtoken {}", self.config.access_token),
            )
            .query(&[
                ("method", "worksheet.records.fetch"),
                ("worksheet_name", worksheet),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(kind = %kind, status = %status, "Sheet API request failed");
            return Err(IngestError::Source(format!(
                "Sheet API returned {} for worksheet '{}'",
                status, worksheet
            )));
        }

        let body: Value = response.json().await?;
        let sheet = sheet_from_records(&body)?;
        debug!(kind = %kind, rows = sheet.rows.len(), columns = sheet.header.len(), "Fetched worksheet");
        Ok(sheet)
    }

    fn describe(&self) -> String {
        format!("sheet {} at {}", self.config.workbook, self.config.base_url)
    }
}
