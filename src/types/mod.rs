//! Shared types

pub mod error;

pub use error::{IngestError, RecordFailure, Result, Stage};
