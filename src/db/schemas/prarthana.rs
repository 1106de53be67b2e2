//! Prarthana (prayer) document schema
//!
//! A prarthana links to its deities and, through the chapters of each
//! variant, to an ordered list of stotras. Chapter order is playback order.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::common::{tmp_id_index, AudioInfo, Localized};
use crate::db::schemas::Metadata;

/// Collection name for prarthanas
pub const PRARTHANA_COLLECTION: &str = "prarthanas";

/// One playback segment of a variant
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Chapter {
    /// 1-based position within the variant
    pub order: i32,
    /// Start offset within the variant's audio (`HH:MM:SS`)
    pub timestamp: String,
    /// Duration as authored (`HH:MM:SS`)
    pub duration: String,
    pub duration_in_sec: i64,
    pub title: Localized,
    /// Permanent stotra ids in playback order
    pub stotra_ids: Vec<String>,
}

/// One playback configuration of a prarthana
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Variant {
    pub duration: String,
    pub duration_in_sec: i64,
    pub chapters: Vec<Chapter>,
    pub is_default: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct PrarthanaUiInfo {
    pub album_art: String,
    pub default_image_url: String,
    pub template_number: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Prarthana document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PrarthanaDoc {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "TmpId")]
    pub tmp_id: String,

    pub title: Localized,

    #[serde(default)]
    pub festival_ids: Vec<String>,

    #[serde(default)]
    pub audio_info: AudioInfo,

    /// Applicable weekdays, 0 = Sunday
    #[serde(default)]
    pub days: Vec<i32>,

    #[serde(default)]
    pub description: Localized,

    #[serde(default)]
    pub importance: Localized,

    #[serde(default)]
    pub variants: Vec<Variant>,

    #[serde(default)]
    pub instruction: Localized,

    /// Language code -> items needed for the prayer
    #[serde(default)]
    pub items_required: BTreeMap<String, Vec<String>>,

    /// Permanent deity ids
    #[serde(default)]
    pub deity_ids: Vec<String>,

    #[serde(default)]
    pub ui_info: PrarthanaUiInfo,

    #[serde(default)]
    pub available_languages: Vec<KeyValue>,

    #[serde(default)]
    pub metadata: Metadata,
}

impl PrarthanaDoc {
    /// All stotra ids across variants and chapters, in document order
    pub fn stotra_ids(&self) -> impl Iterator<Item = &str> {
        self.variants
            .iter()
            .flat_map(|v| v.chapters.iter())
            .flat_map(|c| c.stotra_ids.iter().map(String::as_str))
    }
}

impl IntoIndexes for PrarthanaDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            tmp_id_index(PRARTHANA_COLLECTION),
            (
                doc! { "deity_ids": 1 },
                Some(
                    IndexOptions::builder()
                        .name("deity_ids_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "days": 1 },
                Some(IndexOptions::builder().name("days_index".to_string()).build()),
            ),
        ]
    }
}

impl MutMetadata for PrarthanaDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
