//! Deity document schema

use bson::Document;
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::common::{tmp_id_index, Localized};
use crate::db::schemas::Metadata;

/// Collection name for deities
pub const DEITY_COLLECTION: &str = "deities";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DeityUiInfo {
    pub default_image_url: String,
}

/// Deity document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DeityDoc {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "TmpId")]
    pub tmp_id: String,

    pub title: Localized,

    #[serde(default)]
    pub description: Localized,

    #[serde(default)]
    pub festival_ids: Vec<String>,

    #[serde(default)]
    pub ui_info: DeityUiInfo,

    #[serde(default)]
    pub metadata: Metadata,
}

impl IntoIndexes for DeityDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![tmp_id_index(DEITY_COLLECTION)]
    }
}

impl MutMetadata for DeityDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
