//! Prarthana ingest
//!
//! Loads devotional content authored in spreadsheets into MongoDB as four
//! linked collections: deities, shloks, stotras and prarthanas. Rows are keyed
//! by human-assigned TmpIds; the pipeline allocates permanent ids and rewrites
//! every cross-record reference to them, preserving authored order.

pub mod config;
pub mod db;
pub mod ingest;
pub mod routes;
pub mod server;
pub mod source;
pub mod types;

pub use config::Args;
pub use ingest::{Kind, Pipeline, PipelineConfig, ReferencePolicy};
pub use server::{run, AppState};
pub use types::{IngestError, Result};
