//! Configuration for the ingestion service
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::ingest::{Kind, PipelineConfig, ReferencePolicy};
use crate::source::SheetConfig;

/// Prarthana ingest - spreadsheet content into MongoDB
#[derive(Parser, Debug, Clone)]
#[command(name = "prarthana-ingest")]
#[command(about = "Ingest deities, shloks, stotras and prarthanas from spreadsheets into MongoDB")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "prarthana")]
    pub mongodb_db: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Exclude records with unresolved references instead of failing the pass
    #[arg(long, env = "LENIENT_REFERENCES", default_value = "false")]
    pub lenient_references: bool,

    /// Delimiter for list-valued cells
    #[arg(long, env = "LIST_DELIMITER", default_value = ",")]
    pub list_delimiter: char,

    /// Run every kind once and exit instead of serving HTTP
    #[arg(long, env = "RUN_ONCE", default_value = "false")]
    pub run_once: bool,

    /// Row source configuration
    #[command(flatten)]
    pub sheet: SheetArgs,
}

/// Where rows come from: the spreadsheet API or a directory of JSON exports
#[derive(Parser, Debug, Clone)]
pub struct SheetArgs {
    /// Spreadsheet API base URL
    #[arg(long, env = "SHEET_API_URL", default_value = "https://sheet.zoho.com/api/v2")]
    pub sheet_api_url: String,

    /// Workbook (resource) id
    #[arg(long, env = "SHEET_WORKBOOK_ID")]
    pub sheet_workbook_id: Option<String>,

    /// OAuth access token for the spreadsheet API
    #[arg(long, env = "SHEET_ACCESS_TOKEN")]
    pub sheet_access_token: Option<String>,

    /// Worksheet holding deities
    #[arg(long, env = "SHEET_DEITIES", default_value = "deities")]
    pub sheet_deities: String,

    /// Worksheet holding shloks
    #[arg(long, env = "SHEET_SHLOKS", default_value = "shloks")]
    pub sheet_shloks: String,

    /// Worksheet holding stotras
    #[arg(long, env = "SHEET_STOTRAS", default_value = "stotras")]
    pub sheet_stotras: String,

    /// Worksheet holding prarthanas
    #[arg(long, env = "SHEET_PRARTHANAS", default_value = "prarthanas")]
    pub sheet_prarthanas: String,

    /// Spreadsheet API request timeout in milliseconds
    #[arg(long, env = "SHEET_TIMEOUT_MS", default_value = "30000")]
    pub sheet_timeout_ms: u64,

    /// Read `<dir>/<collection>.json` instead of the spreadsheet API
    #[arg(long, env = "ROWS_DIR")]
    pub rows_dir: Option<PathBuf>,
}

impl SheetArgs {
    fn has_api(&self) -> bool {
        self.sheet_workbook_id.is_some() || self.sheet_access_token.is_some()
    }

    /// Spreadsheet API settings, if a workbook and token are configured
    pub fn sheet_config(&self) -> Option<SheetConfig> {
        let workbook = self.sheet_workbook_id.clone()?;
        let access_token = self.sheet_access_token.clone()?;

        let worksheets: HashMap<Kind, String> = [
            (Kind::Deity, &self.sheet_deities),
            (Kind::Shlok, &self.sheet_shloks),
            (Kind::Stotra, &self.sheet_stotras),
            (Kind::Prarthana, &self.sheet_prarthanas),
        ]
        .into_iter()
        .map(|(kind, name)| (kind, name.clone()))
        .collect();

        Some(SheetConfig {
            base_url: self.sheet_api_url.clone(),
            workbook,
            access_token,
            worksheets,
            timeout: Duration::from_millis(self.sheet_timeout_ms),
        })
    }
}

impl Args {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            policy: if self.lenient_references {
                ReferencePolicy::Lenient
            } else {
                ReferencePolicy::Strict
            },
            list_delimiter: self.list_delimiter,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        match (&self.sheet.rows_dir, self.sheet.has_api()) {
            (Some(_), true) => {
                return Err("Set either ROWS_DIR or the sheet API settings, not both".to_string())
            }
            (None, false) => {
                return Err(
                    "No row source: set SHEET_WORKBOOK_ID and SHEET_ACCESS_TOKEN, or ROWS_DIR"
                        .to_string(),
                )
            }
            (None, true) if self.sheet.sheet_config().is_none() => {
                return Err(
                    "SHEET_WORKBOOK_ID and SHEET_ACCESS_TOKEN must be set together".to_string(),
                )
            }
            _ => {}
        }

        if self.list_delimiter.is_whitespace() {
            return Err("LIST_DELIMITER must not be whitespace".to_string());
        }

        if self.sheet.sheet_timeout_ms == 0 {
            return Err("SHEET_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }
}
