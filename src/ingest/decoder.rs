//! Row Decoder - spreadsheet rows to typed drafts
//!
//! ## Sheet layout
//!
//! The first row is a header; column names are matched case-insensitively.
//!
//! - `TmpId` identifies the row within its kind.
//! - Multi-language fields use one column per language: `title_en`,
//!   `title_hi`, `description_en`, ...
//! - List cells (`festival_ids`, `deity_ids`, `shlok_ids`, `items_required_<lang>`,
//!   chapter `stotra_ids`) are split on the list delimiter and trimmed.
//! - Prarthana variants and chapters repeat a fixed block of columns:
//!
//! ```text
//! variant_<v>_duration   variant_<v>_is_default
//! variant_<v>_chapter_<c>_title_<lang>   variant_<v>_chapter_<c>_duration
//! variant_<v>_chapter_<c>_stotra_ids     variant_<v>_chapter_<c>_timestamp
//! ```
//!
//! A chapter slot with neither title nor duration is absent. Absent slots at
//! the end are dropped; an absent slot followed by a present one is an error.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::db::schemas::{AudioInfo, Localized, PrarthanaUiInfo};
use crate::ingest::duration::{format_duration, parse_duration};
use crate::ingest::model::{
    ChapterDraft, DeityDraft, Draft, PrarthanaDraft, ShlokDraft, StotraDraft, VariantDraft,
};
use crate::ingest::Kind;
use crate::source::Sheet;
use crate::types::{IngestError, RecordFailure, Result, Stage};

/// Delimiter for list-valued cells unless configured otherwise
pub const DEFAULT_LIST_DELIMITER: char = ',';

const TMP_ID_COLUMN: &str = "tmpid";

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace(' ', "_")
}

/// `en`, `hi`, `mar`, `en-in`
fn is_language_code(s: &str) -> bool {
    let (lang, region) = match s.split_once('-') {
        Some((lang, region)) => (lang, Some(region)),
        None => (s, None),
    };
    let lang_ok = (2..=3).contains(&lang.len()) && lang.bytes().all(|b| b.is_ascii_lowercase());
    let region_ok = region
        .map(|r| (2..=4).contains(&r.len()) && r.bytes().all(|b| b.is_ascii_alphanumeric()))
        .unwrap_or(true);
    lang_ok && region_ok
}

/// `variant_3_duration` with prefix `variant_` -> `(3, "duration")`
fn split_slot<'a>(name: &'a str, prefix: &str) -> Option<(usize, &'a str)> {
    let rest = name.strip_prefix(prefix)?;
    let (num, tail) = rest.split_once('_')?;
    let n: usize = num.parse().ok()?;
    (n > 0).then_some((n, tail))
}

/// Header-derived lookup from column name to cell position
#[derive(Debug, Clone)]
pub struct ColumnMap {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl ColumnMap {
    pub fn new(header: &[String]) -> Self {
        let names: Vec<String> = header.iter().map(|h| normalize(h)).collect();
        let mut index = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            if !name.is_empty() {
                index.entry(name.clone()).or_insert(i);
            }
        }
        Self { names, index }
    }

    /// First column name that appears more than once
    pub fn duplicate(&self) -> Option<&str> {
        self.names
            .iter()
            .enumerate()
            .find(|(i, name)| !name.is_empty() && self.index.get(*name) != Some(i))
            .map(|(_, name)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str).filter(|n| !n.is_empty())
    }

    /// Trimmed cell value, empty when the column or cell is missing
    pub fn cell<'r>(&self, row: &'r [String], name: &str) -> &'r str {
        self.index
            .get(name)
            .and_then(|&i| row.get(i))
            .map(|c| c.trim())
            .unwrap_or("")
    }

    /// Language-suffixed columns of `field`, sorted by language code
    pub fn languages(&self, field: &str) -> Vec<(String, usize)> {
        let prefix = format!("{}_", field);
        let mut langs: Vec<(String, usize)> = self
            .index
            .iter()
            .filter_map(|(name, &i)| {
                name.strip_prefix(&prefix)
                    .filter(|lang| is_language_code(lang))
                    .map(|lang| (lang.to_string(), i))
            })
            .collect();
        langs.sort();
        langs
    }

    /// Collect every non-empty language cell of `field`
    pub fn localized(&self, row: &[String], field: &str) -> Localized {
        self.languages(field)
            .into_iter()
            .filter_map(|(lang, i)| {
                let value = row.get(i).map(|c| c.trim()).unwrap_or("");
                (!value.is_empty()).then(|| (lang, value.to_string()))
            })
            .collect()
    }
}

/// Plain columns each kind understands, besides `TmpId`
fn plain_columns(kind: Kind) -> &'static [&'static str] {
    match kind {
        Kind::Deity => &["festival_ids", "default_image_url"],
        Kind::Shlok | Kind::Stotra => &[
            "shlok_ids",
            "audio_url",
            "is_audio_available",
            "is_studio_recorded",
        ],
        Kind::Prarthana => &[
            "festival_ids",
            "days",
            "deity_ids",
            "audio_url",
            "is_audio_available",
            "is_studio_recorded",
            "album_art",
            "default_image_url",
            "template_number",
        ],
    }
}

/// Multi-language fields each kind understands
fn localized_fields(kind: Kind) -> &'static [&'static str] {
    match kind {
        Kind::Deity | Kind::Stotra => &["title", "description"],
        Kind::Shlok => &["title", "text", "meaning"],
        Kind::Prarthana => &[
            "title",
            "description",
            "importance",
            "instruction",
            "items_required",
        ],
    }
}

fn is_variant_column(name: &str) -> bool {
    let Some((_, rest)) = split_slot(name, "variant_") else {
        return false;
    };
    match rest {
        "duration" | "is_default" => true,
        _ => match split_slot(rest, "chapter_") {
            Some((_, "duration" | "stotra_ids" | "timestamp")) => true,
            Some((_, field)) => field
                .strip_prefix("title_")
                .map(is_language_code)
                .unwrap_or(false),
            None => false,
        },
    }
}

fn is_known_column(kind: Kind, name: &str) -> bool {
    if name == TMP_ID_COLUMN || plain_columns(kind).contains(&name) {
        return true;
    }
    let localized = localized_fields(kind).iter().any(|field| {
        name.strip_prefix(field)
            .and_then(|rest| rest.strip_prefix('_'))
            .map(is_language_code)
            .unwrap_or(false)
    });
    localized || (kind == Kind::Prarthana && is_variant_column(name))
}

fn fail(row: usize, field: impl Into<String>, message: impl Into<String>) -> RecordFailure {
    RecordFailure::Decode {
        row,
        field: field.into(),
        message: message.into(),
    }
}

/// Empty cell -> `None`
fn parse_flag(value: &str) -> std::result::Result<Option<bool>, String> {
    match value.to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" | "yes" | "y" | "1" => Ok(Some(true)),
        "false" | "no" | "n" | "0" => Ok(Some(false)),
        other => Err(format!("expected yes/no, got '{}'", other)),
    }
}

/// Weekday numbers (0 = Sunday) from numbers or names; `daily` means all
fn parse_days(items: &[String]) -> std::result::Result<Vec<i32>, String> {
    const NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

    let mut days = Vec::new();
    for item in items {
        let lower = item.to_ascii_lowercase();
        if matches!(lower.as_str(), "all" | "daily" | "everyday") {
            return Ok((0..7).collect());
        }
        let day = match lower.parse::<i32>() {
            Ok(n) if (0..7).contains(&n) => n,
            Ok(n) => return Err(format!("day {} is outside 0-6", n)),
            Err(_) if lower.len() >= 3 && lower.bytes().all(|b| b.is_ascii_alphabetic()) => NAMES
                .iter()
                .position(|name| lower.starts_with(name))
                .map(|p| p as i32)
                .ok_or_else(|| format!("unknown day '{}'", item))?,
            Err(_) => return Err(format!("unknown day '{}'", item)),
        };
        if !days.contains(&day) {
            days.push(day);
        }
    }
    Ok(days)
}

/// Decodes the rows of one sheet into drafts of a single kind
#[derive(Debug, Clone)]
pub struct RowDecoder {
    kind: Kind,
    columns: ColumnMap,
    delimiter: char,
    /// Variant slot -> number of chapter slots
    slots: BTreeMap<usize, usize>,
}

impl RowDecoder {
    /// Validate the header against the kind's column schema
    pub fn new(kind: Kind, header: &[String], delimiter: char) -> Result<Self> {
        let columns = ColumnMap::new(header);

        if let Some(name) = columns.duplicate() {
            return Err(IngestError::Schema {
                kind,
                message: format!("column '{}' appears more than once", name),
            });
        }
        if !columns.contains(TMP_ID_COLUMN) {
            return Err(IngestError::Schema {
                kind,
                message: "missing TmpId column".to_string(),
            });
        }
        if columns.languages("title").is_empty() {
            return Err(IngestError::Schema {
                kind,
                message: "no title_<lang> column".to_string(),
            });
        }

        for name in columns.names() {
            if !is_known_column(kind, name) {
                warn!(kind = %kind, column = name, "Ignoring unknown column");
            }
        }

        let mut slots: BTreeMap<usize, usize> = BTreeMap::new();
        if kind == Kind::Prarthana {
            for name in columns.names().filter(|n| is_variant_column(n)) {
                if let Some((v, rest)) = split_slot(name, "variant_") {
                    let chapter = split_slot(rest, "chapter_").map(|(c, _)| c).unwrap_or(0);
                    let entry = slots.entry(v).or_insert(0);
                    *entry = (*entry).max(chapter);
                }
            }
        }

        Ok(Self {
            kind,
            columns,
            delimiter,
            slots,
        })
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    fn list(&self, value: &str) -> Vec<String> {
        value
            .split(self.delimiter)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn flag(&self, row_index: usize, row: &[String], column: &str) -> std::result::Result<Option<bool>, RecordFailure> {
        parse_flag(self.columns.cell(row, column)).map_err(|m| fail(row_index, column, m))
    }

    fn audio_info(&self, row_index: usize, row: &[String]) -> std::result::Result<AudioInfo, RecordFailure> {
        let audio_url = self.columns.cell(row, "audio_url").to_string();
        let is_audio_available = self
            .flag(row_index, row, "is_audio_available")?
            .unwrap_or(!audio_url.is_empty());
        let is_studio_recorded = self
            .flag(row_index, row, "is_studio_recorded")?
            .unwrap_or(false);
        Ok(AudioInfo {
            is_audio_available,
            audio_url,
            is_studio_recorded,
        })
    }

    /// Decode one data row; `row_index` is 1-based, header excluded
    pub fn decode(&self, row_index: usize, row: &[String]) -> std::result::Result<Draft, RecordFailure> {
        let tmp_id = self.columns.cell(row, TMP_ID_COLUMN).to_string();
        if tmp_id.is_empty() {
            return Err(fail(row_index, "TmpId", "TmpId is required"));
        }

        let title = self.columns.localized(row, "title");
        if title.is_empty() {
            return Err(fail(row_index, "title", "title is required in at least one language"));
        }

        let cols = &self.columns;
        let draft = match self.kind {
            Kind::Deity => Draft::Deity(DeityDraft {
                row: row_index,
                tmp_id,
                title,
                description: cols.localized(row, "description"),
                festival_ids: self.list(cols.cell(row, "festival_ids")),
                default_image_url: cols.cell(row, "default_image_url").to_string(),
            }),
            Kind::Shlok => Draft::Shlok(ShlokDraft {
                row: row_index,
                tmp_id,
                title,
                text: cols.localized(row, "text"),
                meaning: cols.localized(row, "meaning"),
                audio_info: self.audio_info(row_index, row)?,
            }),
            Kind::Stotra => Draft::Stotra(StotraDraft {
                row: row_index,
                tmp_id,
                title,
                description: cols.localized(row, "description"),
                shlok_refs: self.list(cols.cell(row, "shlok_ids")),
                audio_info: self.audio_info(row_index, row)?,
            }),
            Kind::Prarthana => {
                let days = parse_days(&self.list(cols.cell(row, "days")))
                    .map_err(|m| fail(row_index, "days", m))?;
                let items_required = cols
                    .languages("items_required")
                    .into_iter()
                    .map(|(lang, i)| {
                        let cell = row.get(i).map(String::as_str).unwrap_or("");
                        (lang, self.list(cell))
                    })
                    .filter(|(_, items)| !items.is_empty())
                    .collect();

                Draft::Prarthana(PrarthanaDraft {
                    row: row_index,
                    tmp_id,
                    title,
                    description: cols.localized(row, "description"),
                    importance: cols.localized(row, "importance"),
                    instruction: cols.localized(row, "instruction"),
                    festival_ids: self.list(cols.cell(row, "festival_ids")),
                    days,
                    audio_info: self.audio_info(row_index, row)?,
                    ui_info: PrarthanaUiInfo {
                        album_art: cols.cell(row, "album_art").to_string(),
                        default_image_url: cols.cell(row, "default_image_url").to_string(),
                        template_number: cols.cell(row, "template_number").to_string(),
                    },
                    items_required,
                    deity_refs: self.list(cols.cell(row, "deity_ids")),
                    variants: self.decode_variants(row_index, row)?,
                })
            }
        };

        Ok(draft)
    }

    fn decode_variants(&self, row_index: usize, row: &[String]) -> std::result::Result<Vec<VariantDraft>, RecordFailure> {
        let max_variant = self.slots.keys().next_back().copied().unwrap_or(0);
        let mut slots: Vec<Option<VariantDraft>> = Vec::with_capacity(max_variant);

        for v in 1..=max_variant {
            let chapter_slots = self.slots.get(&v).copied().unwrap_or(0);
            let chapters = self.decode_chapters(row_index, row, v, chapter_slots)?;

            let duration_col = format!("variant_{}_duration", v);
            let default_col = format!("variant_{}_is_default", v);
            let duration = self.columns.cell(row, &duration_col);
            let is_default = self.flag(row_index, row, &default_col)?;

            if chapters.is_empty() && duration.is_empty() && is_default.is_none() {
                slots.push(None);
                continue;
            }
            if chapters.is_empty() {
                return Err(fail(
                    row_index,
                    format!("variant_{}_chapter_1", v),
                    "variant has no chapters",
                ));
            }

            let duration_in_sec = if duration.is_empty() {
                chapters
                    .iter()
                    .try_fold(0i64, |acc, c| acc.checked_add(c.duration_in_sec))
                    .ok_or_else(|| fail(row_index, &duration_col, "total chapter duration is out of range"))?
            } else {
                parse_duration(duration).map_err(|m| fail(row_index, &duration_col, m))?
            };

            slots.push(Some(VariantDraft {
                duration: format_duration(duration_in_sec),
                duration_in_sec,
                is_default: is_default.unwrap_or(false),
                chapters,
            }));
        }

        let mut variants = contiguous(slots, |gap, last| {
            fail(
                row_index,
                format!("variant_{}", gap),
                format!("empty variant slot before variant {}", last),
            )
        })?;

        match variants.iter().filter(|v| v.is_default).count() {
            0 => {
                if let Some(first) = variants.first_mut() {
                    first.is_default = true;
                }
            }
            1 => {}
            _ => {
                return Err(fail(
                    row_index,
                    "is_default",
                    "more than one variant is marked default",
                ))
            }
        }

        Ok(variants)
    }

    fn decode_chapters(
        &self,
        row_index: usize,
        row: &[String],
        variant: usize,
        chapter_slots: usize,
    ) -> std::result::Result<Vec<ChapterDraft>, RecordFailure> {
        let mut slots: Vec<Option<ChapterDraft>> = Vec::with_capacity(chapter_slots);

        for c in 1..=chapter_slots {
            let base = format!("variant_{}_chapter_{}", variant, c);
            let title = self.columns.localized(row, &format!("{}_title", base));
            let duration_col = format!("{}_duration", base);
            let duration = self.columns.cell(row, &duration_col);
            let stotra_refs = self.list(self.columns.cell(row, &format!("{}_stotra_ids", base)));

            if title.is_empty() && duration.is_empty() {
                if !stotra_refs.is_empty() {
                    return Err(fail(
                        row_index,
                        format!("{}_title", base),
                        "chapter lists stotras but has neither title nor duration",
                    ));
                }
                slots.push(None);
                continue;
            }
            if duration.is_empty() {
                return Err(fail(row_index, duration_col, "duration is required"));
            }

            let duration_in_sec =
                parse_duration(duration).map_err(|m| fail(row_index, &duration_col, m))?;

            let timestamp_col = format!("{}_timestamp", base);
            let timestamp = match self.columns.cell(row, &timestamp_col) {
                "" => None,
                given => Some(
                    parse_duration(given)
                        .map(format_duration)
                        .map_err(|m| fail(row_index, &timestamp_col, m))?,
                ),
            };

            slots.push(Some(ChapterDraft {
                order: c as i32,
                // Filled with the cumulative offset below when not authored
                timestamp: timestamp.unwrap_or_default(),
                duration: format_duration(duration_in_sec),
                duration_in_sec,
                title,
                stotra_refs,
            }));
        }

        let mut chapters = contiguous(slots, |gap, last| {
            fail(
                row_index,
                format!("variant_{}_chapter_{}", variant, gap),
                format!("empty chapter slot before chapter {}", last),
            )
        })?;

        let mut offset: i64 = 0;
        for chapter in &mut chapters {
            if chapter.timestamp.is_empty() {
                chapter.timestamp = format_duration(offset);
            }
            offset = offset.checked_add(chapter.duration_in_sec).ok_or_else(|| {
                fail(
                    row_index,
                    format!("variant_{}_chapter_{}_duration", variant, chapter.order),
                    "cumulative chapter offset is out of range",
                )
            })?;
        }

        Ok(chapters)
    }
}

/// Drop trailing absent slots; an absent slot before a present one is an
/// error reported as `(gap, last)` with 1-based slot numbers.
fn contiguous<T>(
    slots: Vec<Option<T>>,
    gap_error: impl Fn(usize, usize) -> RecordFailure,
) -> std::result::Result<Vec<T>, RecordFailure> {
    let Some(last) = slots.iter().rposition(Option::is_some) else {
        return Ok(Vec::new());
    };
    if let Some(gap) = slots[..last].iter().position(Option::is_none) {
        return Err(gap_error(gap + 1, last + 1));
    }
    Ok(slots.into_iter().take(last + 1).flatten().collect())
}

/// Decode every data row of a sheet. Fully blank rows are skipped; any
/// malformed row fails the whole sheet with every row failure collected.
pub fn decode_sheet(kind: Kind, sheet: &Sheet, delimiter: char) -> Result<Vec<Draft>> {
    let decoder = RowDecoder::new(kind, &sheet.header, delimiter)?;

    let mut drafts = Vec::with_capacity(sheet.rows.len());
    let mut failures = Vec::new();

    for (i, row) in sheet.rows.iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        match decoder.decode(i + 1, row) {
            Ok(draft) => drafts.push(draft),
            Err(failure) => failures.push(failure),
        }
    }

    if !failures.is_empty() {
        warn!(kind = %kind, failed = failures.len(), "Rows failed to decode");
        return Err(IngestError::Pass {
            kind,
            stage: Stage::Decode,
            failures,
        });
    }

    debug!(kind = %kind, drafts = drafts.len(), "Decoded sheet");
    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn decoder(kind: Kind, header: &[&str]) -> RowDecoder {
        RowDecoder::new(kind, &strings(header), DEFAULT_LIST_DELIMITER).unwrap()
    }

    fn decode_field_error(result: std::result::Result<Draft, RecordFailure>) -> (usize, String, String) {
        match result {
            Err(RecordFailure::Decode { row, field, message }) => (row, field, message),
            other => panic!("expected decode failure, got {:?}", other),
        }
    }

    #[test]
    fn test_collects_languages() {
        let d = decoder(Kind::Deity, &["TmpId", "title_en", "title_hi", "description_en", "description_hi"]);
        let draft = d.decode(1, &strings(&["D1", "Shiva", "शिव", "", "महादेव"])).unwrap();

        let Draft::Deity(deity) = draft else { panic!("expected deity") };
        assert_eq!(deity.tmp_id, "D1");
        assert_eq!(deity.title.get("en").map(String::as_str), Some("Shiva"));
        assert_eq!(deity.title.get("hi").map(String::as_str), Some("शिव"));
        assert_eq!(deity.description.len(), 1);
        assert!(deity.description.contains_key("hi"));
    }

    #[test]
    fn test_missing_title_is_error() {
        let d = decoder(Kind::Shlok, &["TmpId", "title_en", "text_en"]);
        let (row, field, _) = decode_field_error(d.decode(7, &strings(&["SH1", " ", "om"])));
        assert_eq!(row, 7);
        assert_eq!(field, "title");
    }

    #[test]
    fn test_missing_tmp_id_is_error() {
        let d = decoder(Kind::Shlok, &["TmpId", "title_en"]);
        let (_, field, _) = decode_field_error(d.decode(2, &strings(&["", "Verse"])));
        assert_eq!(field, "TmpId");
    }

    #[test]
    fn test_header_schema_errors() {
        let err = RowDecoder::new(Kind::Deity, &strings(&["title_en"]), ',').unwrap_err();
        assert!(matches!(err, IngestError::Schema { kind: Kind::Deity, .. }));

        let err = RowDecoder::new(Kind::Deity, &strings(&["TmpId", "name"]), ',').unwrap_err();
        assert!(err.to_string().contains("title_<lang>"));

        let err = RowDecoder::new(Kind::Deity, &strings(&["TmpId", "title_en", "Title_EN"]), ',')
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_lists_split_and_trim() {
        let d = decoder(Kind::Stotra, &["TmpId", "title_en", "shlok_ids"]);

        let Draft::Stotra(s) = d.decode(1, &strings(&["S1", "Aarti", " SH1, SH2 ,,SH3 "])).unwrap() else {
            panic!("expected stotra")
        };
        assert_eq!(s.shlok_refs, vec!["SH1", "SH2", "SH3"]);

        let Draft::Stotra(s) = d.decode(2, &strings(&["S2", "Chalisa", ""])).unwrap() else {
            panic!("expected stotra")
        };
        assert!(s.shlok_refs.is_empty());
    }

    #[test]
    fn test_short_row_reads_missing_cells_as_empty() {
        let d = decoder(Kind::Stotra, &["TmpId", "title_en", "shlok_ids", "audio_url"]);
        let Draft::Stotra(s) = d.decode(1, &strings(&["S1", "Aarti"])).unwrap() else {
            panic!("expected stotra")
        };
        assert!(s.shlok_refs.is_empty());
        assert!(!s.audio_info.is_audio_available);
    }

    const PRARTHANA_HEADER: &[&str] = &[
        "TmpId",
        "title_en",
        "deity_ids",
        "days",
        "items_required_en",
        "variant_1_is_default",
        "variant_1_chapter_1_title_en",
        "variant_1_chapter_1_duration",
        "variant_1_chapter_1_stotra_ids",
        "variant_1_chapter_2_title_en",
        "variant_1_chapter_2_duration",
        "variant_1_chapter_2_stotra_ids",
        "variant_1_chapter_3_title_en",
        "variant_1_chapter_3_duration",
        "variant_1_chapter_3_stotra_ids",
    ];

    fn prarthana(cells: &[&str]) -> std::result::Result<Draft, RecordFailure> {
        let mut row = strings(cells);
        row.resize(PRARTHANA_HEADER.len(), String::new());
        decoder(Kind::Prarthana, PRARTHANA_HEADER).decode(3, &row)
    }

    #[test]
    fn test_chapters_decode_in_order_and_drop_trailing() {
        let draft = prarthana(&[
            "P1", "Evening Prayer", "D1", "Mon, sunday", "Diya, Flowers", "",
            "Ch1", "00:05:00", "S1, S2",
            "Ch2", "02:30", "S3",
        ])
        .unwrap();

        let Draft::Prarthana(p) = draft else { panic!("expected prarthana") };
        assert_eq!(p.deity_refs, vec!["D1"]);
        assert_eq!(p.days, vec![1, 0]);
        assert_eq!(p.items_required.get("en").unwrap(), &vec!["Diya".to_string(), "Flowers".to_string()]);
        assert_eq!(p.variants.len(), 1);

        let variant = &p.variants[0];
        assert!(variant.is_default);
        assert_eq!(variant.duration_in_sec, 450);
        assert_eq!(variant.duration, "00:07:30");
        assert_eq!(variant.chapters.len(), 2);

        let ch1 = &variant.chapters[0];
        assert_eq!(ch1.order, 1);
        assert_eq!(ch1.duration_in_sec, 300);
        assert_eq!(ch1.timestamp, "00:00:00");
        assert_eq!(ch1.stotra_refs, vec!["S1", "S2"]);

        let ch2 = &variant.chapters[1];
        assert_eq!(ch2.order, 2);
        assert_eq!(ch2.timestamp, "00:05:00");
        assert_eq!(ch2.duration, "00:02:30");
    }

    #[test]
    fn test_interior_gap_is_error() {
        let (row, field, message) = decode_field_error(prarthana(&[
            "P1", "Evening Prayer", "D1", "", "", "",
            "Ch1", "00:05:00", "S1",
            "", "", "",
            "Ch3", "00:01:00", "S3",
        ]));
        assert_eq!(row, 3);
        assert_eq!(field, "variant_1_chapter_2");
        assert!(message.contains("before chapter 3"));
    }

    #[test]
    fn test_invalid_duration_names_value() {
        let (_, field, message) = decode_field_error(prarthana(&[
            "P1", "Evening Prayer", "D1", "", "", "",
            "Ch1", "5 mins", "S1",
        ]));
        assert_eq!(field, "variant_1_chapter_1_duration");
        assert!(message.contains("5 mins"));
    }

    #[test]
    fn test_oversized_duration_is_decode_error() {
        let (row, field, message) = decode_field_error(prarthana(&[
            "P1", "Evening Prayer", "D1", "", "", "",
            "Ch1", "9999999999999999:00:00", "S1",
        ]));
        assert_eq!(row, 3);
        assert_eq!(field, "variant_1_chapter_1_duration");
        assert!(message.contains("out of range"));
        assert!(message.contains("9999999999999999:00:00"));
    }

    #[test]
    fn test_chapter_total_overflow_is_decode_error() {
        let max = i64::MAX.to_string();
        let (_, field, message) = decode_field_error(prarthana(&[
            "P1", "Evening Prayer", "D1", "", "", "",
            "Ch1", max.as_str(), "S1",
            "Ch2", max.as_str(), "S2",
        ]));
        assert!(field.starts_with("variant_1"));
        assert!(message.contains("out of range"));
    }

    #[test]
    fn test_interior_variant_gap_is_error() {
        let header = &[
            "TmpId",
            "title_en",
            "variant_1_chapter_1_duration",
            "variant_2_chapter_1_duration",
            "variant_3_chapter_1_duration",
        ];
        let d = decoder(Kind::Prarthana, header);

        let (row, field, message) = decode_field_error(
            d.decode(5, &strings(&["P1", "Morning", "00:10:00", "", "00:01:00"])),
        );
        assert_eq!(row, 5);
        assert_eq!(field, "variant_2");
        assert!(message.contains("before variant 3"));
    }

    #[test]
    fn test_stotras_without_title_or_duration_is_error() {
        let (_, field, _) = decode_field_error(prarthana(&[
            "P1", "Evening Prayer", "D1", "", "", "",
            "", "", "S1",
        ]));
        assert_eq!(field, "variant_1_chapter_1_title");
    }

    #[test]
    fn test_bad_day_is_error() {
        let (_, field, message) = decode_field_error(prarthana(&["P1", "Evening Prayer", "D1", "9"]));
        assert_eq!(field, "days");
        assert!(message.contains("0-6"));
    }

    #[test]
    fn test_prarthana_without_variants() {
        let Draft::Prarthana(p) = prarthana(&["P1", "Morning", "", "daily"]).unwrap() else {
            panic!("expected prarthana")
        };
        assert!(p.variants.is_empty());
        assert!(p.deity_refs.is_empty());
        assert_eq!(p.days, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_multiple_variants_and_defaults() {
        let header = &[
            "TmpId",
            "title_en",
            "variant_1_chapter_1_duration",
            "variant_2_is_default",
            "variant_2_chapter_1_duration",
            "variant_3_is_default",
            "variant_3_chapter_1_duration",
        ];
        let d = decoder(Kind::Prarthana, header);

        let Draft::Prarthana(p) = d
            .decode(1, &strings(&["P1", "Morning", "00:10:00", "yes", "00:05:00", "", ""]))
            .unwrap()
        else {
            panic!("expected prarthana")
        };
        assert_eq!(p.variants.len(), 2);
        assert!(!p.variants[0].is_default);
        assert!(p.variants[1].is_default);

        let (_, field, _) = decode_field_error(
            d.decode(2, &strings(&["P2", "Noon", "00:10:00", "yes", "00:05:00", "yes", "00:01:00"])),
        );
        assert_eq!(field, "is_default");
    }

    #[test]
    fn test_audio_flags() {
        let d = decoder(Kind::Shlok, &["TmpId", "title_en", "audio_url", "is_studio_recorded"]);
        let Draft::Shlok(s) = d
            .decode(1, &strings(&["SH1", "Verse", "https://cdn/a.mp3", "Yes"]))
            .unwrap()
        else {
            panic!("expected shlok")
        };
        assert!(s.audio_info.is_audio_available);
        assert!(s.audio_info.is_studio_recorded);

        let (_, field, _) =
            decode_field_error(d.decode(2, &strings(&["SH2", "Verse", "", "maybe"])));
        assert_eq!(field, "is_studio_recorded");
    }

    #[test]
    fn test_decode_sheet_collects_all_failures_and_skips_blank_rows() {
        let sheet = Sheet {
            header: strings(&["TmpId", "title_en"]),
            rows: vec![
                strings(&["D1", "Shiva"]),
                strings(&["", ""]),
                strings(&["D2", ""]),
                strings(&["", "Nameless"]),
            ],
        };

        let err = decode_sheet(Kind::Deity, &sheet, ',').unwrap_err();
        let IngestError::Pass { kind, stage, failures } = err else {
            panic!("expected pass error")
        };
        assert_eq!(kind, Kind::Deity);
        assert_eq!(stage, Stage::Decode);
        assert_eq!(failures.len(), 2);
        assert!(matches!(&failures[0], RecordFailure::Decode { row: 3, .. }));
        assert!(matches!(&failures[1], RecordFailure::Decode { row: 4, .. }));
    }

    #[test]
    fn test_language_code_shape() {
        assert!(is_language_code("en"));
        assert!(is_language_code("mar"));
        assert!(is_language_code("en-in"));
        assert!(!is_language_code("english"));
        assert!(!is_language_code("e"));
        assert!(!is_language_code("EN"));
    }
}
