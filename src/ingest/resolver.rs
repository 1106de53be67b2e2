//! Reference Resolver - drafts to resolved documents
//!
//! Every TmpId reference is rewritten through the registry. References are
//! walked in declared order and the first unresolved one fails the record;
//! nothing partially resolved escapes. Lists keep their authored order,
//! duplicates included.

use crate::db::schemas::{
    Chapter, DeityDoc, DeityUiInfo, KeyValue, Localized, Metadata, PrarthanaDoc, ShlokDoc,
    StotraDoc, Variant,
};
use crate::ingest::model::{Draft, Resolved};
use crate::ingest::registry::IdRegistry;
use crate::ingest::Kind;
use crate::types::RecordFailure;

/// Display names for the language codes used in title columns
const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("as", "Assamese"),
    ("bn", "Bengali"),
    ("en", "English"),
    ("gu", "Gujarati"),
    ("hi", "Hindi"),
    ("kn", "Kannada"),
    ("ml", "Malayalam"),
    ("mr", "Marathi"),
    ("ne", "Nepali"),
    ("or", "Odia"),
    ("pa", "Punjabi"),
    ("sa", "Sanskrit"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
];

fn language_name(code: &str) -> &str {
    let base = code.split('-').next().unwrap_or(code);
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == base)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// Languages a prarthana is offered in, in code order
fn available_languages(title: &Localized) -> Vec<KeyValue> {
    title
        .keys()
        .map(|code| KeyValue {
            key: code.clone(),
            value: language_name(code).to_string(),
        })
        .collect()
}

fn take(ids: &mut std::vec::IntoIter<String>, n: usize) -> Vec<String> {
    ids.by_ref().take(n).collect()
}

/// Resolves drafts of any kind against one registry
pub struct Resolver<'a> {
    registry: &'a IdRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a IdRegistry) -> Self {
        Self { registry }
    }

    fn resolve_one(
        &self,
        source: &str,
        role: &str,
        target: Kind,
        tmp_id: &str,
    ) -> Result<String, RecordFailure> {
        self.registry
            .lookup(target, tmp_id)
            .map(str::to_string)
            .ok_or_else(|| RecordFailure::UnresolvedReference {
                tmp_id: source.to_string(),
                role: role.to_string(),
                target_kind: target,
                target_tmp_id: tmp_id.to_string(),
            })
    }

    /// Resolve one draft. The draft's own id must already be assigned.
    pub fn resolve(&self, draft: &Draft) -> Result<Resolved, RecordFailure> {
        let source = draft.tmp_id();
        let id = self.resolve_one(source, "self", draft.kind(), source)?;

        let resolved_refs = draft
            .references()
            .iter()
            .map(|r| self.resolve_one(source, &r.role, r.target, &r.tmp_id))
            .collect::<Result<Vec<_>, _>>()?;
        // Consumed in the same order references() produced them
        let mut ids = resolved_refs.into_iter();

        let resolved = match draft {
            Draft::Deity(d) => Resolved::Deity(DeityDoc {
                id,
                tmp_id: d.tmp_id.clone(),
                title: d.title.clone(),
                description: d.description.clone(),
                festival_ids: d.festival_ids.clone(),
                ui_info: DeityUiInfo {
                    default_image_url: d.default_image_url.clone(),
                },
                metadata: Metadata::default(),
            }),
            Draft::Shlok(d) => Resolved::Shlok(ShlokDoc {
                id,
                tmp_id: d.tmp_id.clone(),
                title: d.title.clone(),
                text: d.text.clone(),
                meaning: d.meaning.clone(),
                audio_info: d.audio_info.clone(),
                metadata: Metadata::default(),
            }),
            Draft::Stotra(d) => Resolved::Stotra(StotraDoc {
                id,
                tmp_id: d.tmp_id.clone(),
                title: d.title.clone(),
                description: d.description.clone(),
                shlok_ids: take(&mut ids, d.shlok_refs.len()),
                audio_info: d.audio_info.clone(),
                metadata: Metadata::default(),
            }),
            Draft::Prarthana(d) => {
                let deity_ids = take(&mut ids, d.deity_refs.len());

                let mut variants = Vec::with_capacity(d.variants.len());
                for variant in &d.variants {
                    let mut chapters = Vec::with_capacity(variant.chapters.len());
                    for chapter in &variant.chapters {
                        chapters.push(Chapter {
                            order: chapter.order,
                            timestamp: chapter.timestamp.clone(),
                            duration: chapter.duration.clone(),
                            duration_in_sec: chapter.duration_in_sec,
                            title: chapter.title.clone(),
                            stotra_ids: take(&mut ids, chapter.stotra_refs.len()),
                        });
                    }
                    variants.push(Variant {
                        duration: variant.duration.clone(),
                        duration_in_sec: variant.duration_in_sec,
                        chapters,
                        is_default: variant.is_default,
                    });
                }

                Resolved::Prarthana(PrarthanaDoc {
                    id,
                    tmp_id: d.tmp_id.clone(),
                    title: d.title.clone(),
                    festival_ids: d.festival_ids.clone(),
                    audio_info: d.audio_info.clone(),
                    days: d.days.clone(),
                    description: d.description.clone(),
                    importance: d.importance.clone(),
                    variants,
                    instruction: d.instruction.clone(),
                    items_required: d.items_required.clone(),
                    deity_ids,
                    ui_info: d.ui_info.clone(),
                    available_languages: available_languages(&d.title),
                    metadata: Metadata::default(),
                })
            }
        };

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{AudioInfo, PrarthanaUiInfo};
    use crate::ingest::model::{ChapterDraft, PrarthanaDraft, StotraDraft, VariantDraft};

    fn localized(pairs: &[(&str, &str)]) -> Localized {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn refs(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn chapter(order: i32, stotras: &[&str]) -> ChapterDraft {
        ChapterDraft {
            order,
            timestamp: "00:00:00".into(),
            duration: "00:05:00".into(),
            duration_in_sec: 300,
            title: localized(&[("en", "Ch")]),
            stotra_refs: refs(stotras),
        }
    }

    fn prarthana(deities: &[&str], chapters: Vec<ChapterDraft>) -> Draft {
        Draft::Prarthana(PrarthanaDraft {
            row: 1,
            tmp_id: "P1".into(),
            title: localized(&[("hi", "संध्या"), ("en", "Evening Prayer")]),
            description: Localized::new(),
            importance: Localized::new(),
            instruction: Localized::new(),
            festival_ids: Vec::new(),
            days: vec![1],
            audio_info: AudioInfo::default(),
            ui_info: PrarthanaUiInfo::default(),
            items_required: Default::default(),
            deity_refs: refs(deities),
            variants: vec![VariantDraft {
                duration: "00:05:00".into(),
                duration_in_sec: 300,
                is_default: true,
                chapters,
            }],
        })
    }

    #[test]
    fn test_preserves_chapter_order() {
        let mut registry = IdRegistry::new();
        let h: Vec<String> = ["H1", "H2", "H3"]
            .iter()
            .map(|t| registry.assign(Kind::Stotra, t))
            .collect();
        let d1 = registry.assign(Kind::Deity, "D1");
        let p1 = registry.assign(Kind::Prarthana, "P1");

        let draft = prarthana(&["D1"], vec![chapter(1, &["H1", "H2", "H3"]), chapter(2, &["H3", "H1"])]);
        let Resolved::Prarthana(doc) = Resolver::new(&registry).resolve(&draft).unwrap() else {
            panic!("expected prarthana")
        };

        assert_eq!(doc.id, p1);
        assert_eq!(doc.deity_ids, vec![d1]);
        assert_eq!(doc.variants[0].chapters[0].stotra_ids, h);
        assert_eq!(
            doc.variants[0].chapters[1].stotra_ids,
            vec![h[2].clone(), h[0].clone()]
        );
        assert_eq!(doc.stotra_ids().count(), 5);
    }

    #[test]
    fn test_missing_deity_fails_before_stotras() {
        let mut registry = IdRegistry::new();
        registry.assign(Kind::Prarthana, "P1");

        let draft = prarthana(&["D9"], vec![chapter(1, &["S404"])]);
        let err = Resolver::new(&registry).resolve(&draft).unwrap_err();

        assert_eq!(
            err,
            RecordFailure::UnresolvedReference {
                tmp_id: "P1".into(),
                role: "deity".into(),
                target_kind: Kind::Deity,
                target_tmp_id: "D9".into(),
            }
        );
    }

    #[test]
    fn test_missing_stotra_names_chapter() {
        let mut registry = IdRegistry::new();
        registry.assign(Kind::Prarthana, "P1");
        registry.assign(Kind::Deity, "D1");
        registry.assign(Kind::Stotra, "S1");

        let draft = prarthana(&["D1"], vec![chapter(1, &["S1"]), chapter(2, &["S1", "S2"])]);
        let err = Resolver::new(&registry).resolve(&draft).unwrap_err();

        let RecordFailure::UnresolvedReference { role, target_tmp_id, .. } = err else {
            panic!("expected unresolved reference")
        };
        assert_eq!(role, "variant[1].chapter[2].stotra");
        assert_eq!(target_tmp_id, "S2");
    }

    #[test]
    fn test_stotra_keeps_duplicate_shloks() {
        let mut registry = IdRegistry::new();
        let sh1 = registry.assign(Kind::Shlok, "SH1");
        let sh2 = registry.assign(Kind::Shlok, "SH2");
        registry.assign(Kind::Stotra, "S1");

        let draft = Draft::Stotra(StotraDraft {
            row: 1,
            tmp_id: "S1".into(),
            title: localized(&[("en", "Aarti")]),
            description: Localized::new(),
            shlok_refs: refs(&["SH2", "SH1", "SH2"]),
            audio_info: AudioInfo::default(),
        });

        let Resolved::Stotra(doc) = Resolver::new(&registry).resolve(&draft).unwrap() else {
            panic!("expected stotra")
        };
        assert_eq!(doc.shlok_ids, vec![sh2.clone(), sh1, sh2]);
    }

    #[test]
    fn test_available_languages_from_title() {
        let langs = available_languages(&localized(&[("hi", "x"), ("en", "y"), ("xx", "z")]));
        let pairs: Vec<(&str, &str)> = langs
            .iter()
            .map(|kv| (kv.key.as_str(), kv.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("en", "English"), ("hi", "Hindi"), ("xx", "xx")]);
    }
}
