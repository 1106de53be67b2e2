//! Shlok (verse) document schema

use bson::Document;
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::common::{tmp_id_index, AudioInfo, Localized};
use crate::db::schemas::Metadata;

/// Collection name for shloks
pub const SHLOK_COLLECTION: &str = "shloks";

/// Shlok document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ShlokDoc {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "TmpId")]
    pub tmp_id: String,

    pub title: Localized,

    /// Verse text per language
    #[serde(default)]
    pub text: Localized,

    /// Translation / meaning per language
    #[serde(default)]
    pub meaning: Localized,

    #[serde(default)]
    pub audio_info: AudioInfo,

    #[serde(default)]
    pub metadata: Metadata,
}

impl IntoIndexes for ShlokDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![tmp_id_index(SHLOK_COLLECTION)]
    }
}

impl MutMetadata for ShlokDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
