//! Field types shared by several collections

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Language code -> text
pub type Localized = BTreeMap<String, String>;

/// Field name under which the spreadsheet TmpId is retained
pub const TMP_ID_FIELD: &str = "TmpId";

/// Audio availability for a shlok, stotra or prarthana
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AudioInfo {
    pub is_audio_available: bool,
    pub audio_url: String,
    pub is_studio_recorded: bool,
}

/// Unique sparse index on `TmpId`, carried by every collection
pub fn tmp_id_index(collection: &str) -> (Document, Option<IndexOptions>) {
    (
        doc! { "TmpId": 1 },
        Some(
            IndexOptions::builder()
                .unique(true)
                .sparse(true)
                .name(format!("{}_tmp_id_unique", collection))
                .build(),
        ),
    )
}
