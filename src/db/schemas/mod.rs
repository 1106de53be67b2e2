//! Database schemas
//!
//! MongoDB document structures for the four content collections.

mod common;
mod deity;
mod metadata;
mod prarthana;
mod shlok;
mod stotra;

pub use common::{AudioInfo, Localized, TMP_ID_FIELD};
pub use deity::{DeityDoc, DeityUiInfo, DEITY_COLLECTION};
pub use metadata::Metadata;
pub use prarthana::{
    Chapter, KeyValue, PrarthanaDoc, PrarthanaUiInfo, Variant, PRARTHANA_COLLECTION,
};
pub use shlok::{ShlokDoc, SHLOK_COLLECTION};
pub use stotra::{StotraDoc, STOTRA_COLLECTION};
