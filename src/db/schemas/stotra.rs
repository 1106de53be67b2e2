//! Stotra (hymn) document schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::common::{tmp_id_index, AudioInfo, Localized};
use crate::db::schemas::Metadata;

/// Collection name for stotras
pub const STOTRA_COLLECTION: &str = "stotras";

/// Stotra document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct StotraDoc {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "TmpId")]
    pub tmp_id: String,

    pub title: Localized,

    #[serde(default)]
    pub description: Localized,

    /// Permanent shlok ids in recitation order
    #[serde(default)]
    pub shlok_ids: Vec<String>,

    #[serde(default)]
    pub audio_info: AudioInfo,

    #[serde(default)]
    pub metadata: Metadata,
}

impl IntoIndexes for StotraDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            tmp_id_index(STOTRA_COLLECTION),
            // Reverse lookup: which stotras recite a shlok
            (
                doc! { "shlok_ids": 1 },
                Some(
                    IndexOptions::builder()
                        .name("shlok_ids_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for StotraDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
