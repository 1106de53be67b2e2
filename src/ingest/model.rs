//! Draft and resolved records
//!
//! A draft is one decoded spreadsheet row whose cross-record references still
//! hold TmpIds. Resolution turns it into the typed document that is written.

use bson::Document;
use std::collections::BTreeMap;

use crate::db::mongo::MutMetadata;
use crate::db::schemas::{
    AudioInfo, DeityDoc, Localized, Metadata, PrarthanaDoc, PrarthanaUiInfo, ShlokDoc, StotraDoc,
};
use crate::ingest::Kind;
use crate::types::Result;

/// A cross-record reference still expressed as a TmpId
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Where the reference sits, e.g. `deity` or `variant[1].chapter[2].stotra`
    pub role: String,
    pub target: Kind,
    pub tmp_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeityDraft {
    pub row: usize,
    pub tmp_id: String,
    pub title: Localized,
    pub description: Localized,
    pub festival_ids: Vec<String>,
    pub default_image_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShlokDraft {
    pub row: usize,
    pub tmp_id: String,
    pub title: Localized,
    pub text: Localized,
    pub meaning: Localized,
    pub audio_info: AudioInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StotraDraft {
    pub row: usize,
    pub tmp_id: String,
    pub title: Localized,
    pub description: Localized,
    /// Shlok TmpIds in recitation order
    pub shlok_refs: Vec<String>,
    pub audio_info: AudioInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterDraft {
    pub order: i32,
    pub timestamp: String,
    pub duration: String,
    pub duration_in_sec: i64,
    pub title: Localized,
    /// Stotra TmpIds in playback order
    pub stotra_refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantDraft {
    pub duration: String,
    pub duration_in_sec: i64,
    pub is_default: bool,
    pub chapters: Vec<ChapterDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrarthanaDraft {
    pub row: usize,
    pub tmp_id: String,
    pub title: Localized,
    pub description: Localized,
    pub importance: Localized,
    pub instruction: Localized,
    pub festival_ids: Vec<String>,
    pub days: Vec<i32>,
    pub audio_info: AudioInfo,
    pub ui_info: PrarthanaUiInfo,
    pub items_required: BTreeMap<String, Vec<String>>,
    /// Deity TmpIds
    pub deity_refs: Vec<String>,
    pub variants: Vec<VariantDraft>,
}

/// One decoded row, tagged by kind
#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    Deity(DeityDraft),
    Shlok(ShlokDraft),
    Stotra(StotraDraft),
    Prarthana(PrarthanaDraft),
}

impl Draft {
    pub fn kind(&self) -> Kind {
        match self {
            Draft::Deity(_) => Kind::Deity,
            Draft::Shlok(_) => Kind::Shlok,
            Draft::Stotra(_) => Kind::Stotra,
            Draft::Prarthana(_) => Kind::Prarthana,
        }
    }

    pub fn tmp_id(&self) -> &str {
        match self {
            Draft::Deity(d) => &d.tmp_id,
            Draft::Shlok(d) => &d.tmp_id,
            Draft::Stotra(d) => &d.tmp_id,
            Draft::Prarthana(d) => &d.tmp_id,
        }
    }

    /// 1-based data row the draft was decoded from
    pub fn row(&self) -> usize {
        match self {
            Draft::Deity(d) => d.row,
            Draft::Shlok(d) => d.row,
            Draft::Stotra(d) => d.row,
            Draft::Prarthana(d) => d.row,
        }
    }

    /// Every outbound reference in declared order: top-level references
    /// first, then nested ones in array order.
    pub fn references(&self) -> Vec<Reference> {
        match self {
            Draft::Deity(_) | Draft::Shlok(_) => Vec::new(),
            Draft::Stotra(d) => d
                .shlok_refs
                .iter()
                .map(|tmp_id| Reference {
                    role: "shlok".to_string(),
                    target: Kind::Shlok,
                    tmp_id: tmp_id.clone(),
                })
                .collect(),
            Draft::Prarthana(d) => {
                let mut refs: Vec<Reference> = d
                    .deity_refs
                    .iter()
                    .map(|tmp_id| Reference {
                        role: "deity".to_string(),
                        target: Kind::Deity,
                        tmp_id: tmp_id.clone(),
                    })
                    .collect();
                for (v, variant) in d.variants.iter().enumerate() {
                    for chapter in &variant.chapters {
                        for tmp_id in &chapter.stotra_refs {
                            refs.push(Reference {
                                role: format!("variant[{}].chapter[{}].stotra", v + 1, chapter.order),
                                target: Kind::Stotra,
                                tmp_id: tmp_id.clone(),
                            });
                        }
                    }
                }
                refs
            }
        }
    }
}

/// A draft whose references all hold permanent ids
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Deity(DeityDoc),
    Shlok(ShlokDoc),
    Stotra(StotraDoc),
    Prarthana(PrarthanaDoc),
}

impl Resolved {
    pub fn kind(&self) -> Kind {
        match self {
            Resolved::Deity(_) => Kind::Deity,
            Resolved::Shlok(_) => Kind::Shlok,
            Resolved::Stotra(_) => Kind::Stotra,
            Resolved::Prarthana(_) => Kind::Prarthana,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Resolved::Deity(d) => &d.id,
            Resolved::Shlok(d) => &d.id,
            Resolved::Stotra(d) => &d.id,
            Resolved::Prarthana(d) => &d.id,
        }
    }

    pub fn tmp_id(&self) -> &str {
        match self {
            Resolved::Deity(d) => &d.tmp_id,
            Resolved::Shlok(d) => &d.tmp_id,
            Resolved::Stotra(d) => &d.tmp_id,
            Resolved::Prarthana(d) => &d.tmp_id,
        }
    }

    /// Set the store metadata written alongside the document
    pub fn stamp(&mut self, metadata: Metadata) {
        let slot = match self {
            Resolved::Deity(d) => d.mut_metadata(),
            Resolved::Shlok(d) => d.mut_metadata(),
            Resolved::Stotra(d) => d.mut_metadata(),
            Resolved::Prarthana(d) => d.mut_metadata(),
        };
        *slot = metadata;
    }

    pub fn to_document(&self) -> Result<Document> {
        let doc = match self {
            Resolved::Deity(d) => bson::to_document(d)?,
            Resolved::Shlok(d) => bson::to_document(d)?,
            Resolved::Stotra(d) => bson::to_document(d)?,
            Resolved::Prarthana(d) => bson::to_document(d)?,
        };
        Ok(doc)
    }
}
