//! End-to-end ingestion runs against in-memory doubles

use std::sync::Arc;

use prarthana_ingest::db::InMemoryStore;
use prarthana_ingest::ingest::{Kind, Pipeline, PipelineConfig, ReferencePolicy};
use prarthana_ingest::source::{InMemoryRowSource, Sheet};
use prarthana_ingest::types::{IngestError, RecordFailure, Stage};

const PRARTHANA_HEADER: &[&str] = &[
    "TmpId",
    "title_en",
    "deity_ids",
    "variant_1_chapter_1_title_en",
    "variant_1_chapter_1_duration",
    "variant_1_chapter_1_stotra_ids",
];

fn deities() -> Sheet {
    Sheet::new(&["TmpId", "title_en"], &[&["D1", "Shiva"]])
}

fn shloks() -> Sheet {
    Sheet::new(&["TmpId", "title_en", "text_sa"], &[])
}

fn stotras(rows: &[&[&str]]) -> Sheet {
    Sheet::new(&["TmpId", "title_en", "shlok_ids"], rows)
}

fn prarthanas(rows: &[&[&str]]) -> Sheet {
    Sheet::new(PRARTHANA_HEADER, rows)
}

fn source(stotra_rows: &[&[&str]], prarthana_rows: &[&[&str]]) -> InMemoryRowSource {
    InMemoryRowSource::new()
        .with_sheet(Kind::Deity, deities())
        .with_sheet(Kind::Shlok, shloks())
        .with_sheet(Kind::Stotra, stotras(stotra_rows))
        .with_sheet(Kind::Prarthana, prarthanas(prarthana_rows))
}

fn pipeline(source: InMemoryRowSource, store: &Arc<InMemoryStore>, policy: ReferencePolicy) -> Pipeline {
    Pipeline::new(
        Arc::new(source),
        store.clone(),
        store.clone(),
        PipelineConfig {
            policy,
            ..Default::default()
        },
    )
}

async fn id_of(store: &InMemoryStore, kind: Kind, tmp_id: &str) -> String {
    store
        .documents(kind)
        .await
        .into_iter()
        .find(|d| d.get_str("TmpId").ok() == Some(tmp_id))
        .and_then(|d| d.get_str("_id").ok().map(str::to_string))
        .unwrap_or_else(|| panic!("{} {} not written", kind, tmp_id))
}

#[tokio::test]
async fn test_full_run_links_prayer_to_deity_and_stotra() {
    let store = Arc::new(InMemoryStore::new());
    let pipeline = pipeline(
        source(
            &[&["S1", "Aarti", ""]],
            &[&["P1", "Evening Prayer", "D1", "Ch1", "00:05:00", "S1"]],
        ),
        &store,
        ReferencePolicy::Strict,
    );

    let report = pipeline.ingest_all().await.unwrap();
    assert_eq!(report.written(), 3);
    assert_eq!(report.kinds.len(), 4);

    let d1 = id_of(&store, Kind::Deity, "D1").await;
    let s1 = id_of(&store, Kind::Stotra, "S1").await;

    let prayers = store.documents(Kind::Prarthana).await;
    assert_eq!(prayers.len(), 1);
    let p1 = &prayers[0];

    let deity_ids = p1.get_array("deity_ids").unwrap();
    assert_eq!(deity_ids.len(), 1);
    assert_eq!(deity_ids[0].as_str(), Some(d1.as_str()));

    let variants = p1.get_array("variants").unwrap();
    let variant = variants[0].as_document().unwrap();
    assert!(variant.get_bool("is_default").unwrap());

    let chapter = variant.get_array("chapters").unwrap()[0].as_document().unwrap().clone();
    assert_eq!(chapter.get_i64("duration_in_sec").unwrap(), 300);
    assert_eq!(chapter.get_str("duration").unwrap(), "00:05:00");
    assert_eq!(chapter.get_i32("order").unwrap(), 1);

    let stotra_ids = chapter.get_array("stotra_ids").unwrap();
    assert_eq!(stotra_ids.len(), 1);
    assert_eq!(stotra_ids[0].as_str(), Some(s1.as_str()));

    let stotra = &store.documents(Kind::Stotra).await[0];
    assert!(stotra.get_array("shlok_ids").unwrap().is_empty());
}

#[tokio::test]
async fn test_rerun_writes_no_duplicates() {
    let store = Arc::new(InMemoryStore::new());
    let make = || {
        pipeline(
            source(
                &[&["S1", "Aarti", ""]],
                &[&["P1", "Evening Prayer", "D1", "Ch1", "00:05:00", "S1"]],
            ),
            &store,
            ReferencePolicy::Strict,
        )
    };

    make().ingest_all().await.unwrap();
    let d1 = id_of(&store, Kind::Deity, "D1").await;

    let report = make().ingest_all().await.unwrap();
    assert_eq!(report.written(), 0);
    assert_eq!(report.kinds[0].skipped_existing, vec!["D1"]);

    for kind in [Kind::Deity, Kind::Stotra, Kind::Prarthana] {
        assert_eq!(store.count(kind).await, 1, "{} duplicated", kind);
    }
    assert_eq!(id_of(&store, Kind::Deity, "D1").await, d1);
}

#[tokio::test]
async fn test_new_rows_on_rerun_link_to_persisted_ids() {
    let store = Arc::new(InMemoryStore::new());
    pipeline(source(&[&["S1", "Aarti", ""]], &[]), &store, ReferencePolicy::Strict)
        .ingest_all()
        .await
        .unwrap();
    let d1 = id_of(&store, Kind::Deity, "D1").await;
    let s1 = id_of(&store, Kind::Stotra, "S1").await;

    // Prarthanas alone; deities and stotras come from the store
    let report = pipeline(
        source(
            &[&["S1", "Aarti", ""]],
            &[&["P1", "Evening Prayer", "D1", "Ch1", "00:05:00", "S1"]],
        ),
        &store,
        ReferencePolicy::Strict,
    )
    .ingest(Kind::Prarthana)
    .await
    .unwrap();
    assert_eq!(report.written, 1);

    let p1 = &store.documents(Kind::Prarthana).await[0];
    assert_eq!(p1.get_array("deity_ids").unwrap()[0].as_str(), Some(d1.as_str()));
    let chapter = p1.get_array("variants").unwrap()[0]
        .as_document()
        .unwrap()
        .get_array("chapters")
        .unwrap()[0]
        .as_document()
        .unwrap()
        .clone();
    assert_eq!(chapter.get_array("stotra_ids").unwrap()[0].as_str(), Some(s1.as_str()));
}

#[tokio::test]
async fn test_chapter_stotra_order_survives_full_run() {
    let store = Arc::new(InMemoryStore::new());
    let pipeline = pipeline(
        source(
            &[&["H3", "Third", ""], &["H1", "First", ""], &["H2", "Second", ""]],
            &[&["P1", "Evening Prayer", "D1", "Ch1", "10:00", "H1, H2, H3"]],
        ),
        &store,
        ReferencePolicy::Strict,
    );
    pipeline.ingest_all().await.unwrap();

    let expected = vec![
        id_of(&store, Kind::Stotra, "H1").await,
        id_of(&store, Kind::Stotra, "H2").await,
        id_of(&store, Kind::Stotra, "H3").await,
    ];

    let p1 = &store.documents(Kind::Prarthana).await[0];
    let chapter = p1.get_array("variants").unwrap()[0]
        .as_document()
        .unwrap()
        .get_array("chapters")
        .unwrap()[0]
        .as_document()
        .unwrap()
        .clone();
    let actual: Vec<String> = chapter
        .get_array("stotra_ids")
        .unwrap()
        .iter()
        .filter_map(|b| b.as_str().map(str::to_string))
        .collect();
    assert_eq!(actual, expected);

    // Stotras keep sheet row order too
    let stotras: Vec<String> = store
        .documents(Kind::Stotra)
        .await
        .iter()
        .map(|d| d.get_str("TmpId").unwrap().to_string())
        .collect();
    assert_eq!(stotras, vec!["H3", "H1", "H2"]);
}

#[tokio::test]
async fn test_missing_deity_fails_fast() {
    let store = Arc::new(InMemoryStore::new());
    let pipeline = pipeline(
        source(
            &[&["S1", "Aarti", ""]],
            &[
                &["P1", "Evening Prayer", "D1", "Ch1", "00:05:00", "S1"],
                &["P2", "Night Prayer", "D9", "Ch1", "00:05:00", "S1"],
            ],
        ),
        &store,
        ReferencePolicy::Strict,
    );

    let err = pipeline.ingest_all().await.unwrap_err();
    let IngestError::Pass { kind, stage, failures } = &err else {
        panic!("expected pass error, got {:?}", err)
    };
    assert_eq!(*kind, Kind::Prarthana);
    assert_eq!(*stage, Stage::Resolve);
    assert_eq!(
        failures[0],
        RecordFailure::UnresolvedReference {
            tmp_id: "P2".into(),
            role: "deity".into(),
            target_kind: Kind::Deity,
            target_tmp_id: "D9".into(),
        }
    );

    // Earlier kinds stay written; the failed pass writes nothing
    assert_eq!(store.count(Kind::Deity).await, 1);
    assert_eq!(store.count(Kind::Prarthana).await, 0);
}

#[tokio::test]
async fn test_lenient_mode_excludes_only_broken_records() {
    let store = Arc::new(InMemoryStore::new());
    let pipeline = pipeline(
        source(
            &[&["S1", "Aarti", ""], &["S2", "Broken", "SH404"]],
            &[
                &["P1", "Evening Prayer", "D1", "Ch1", "00:05:00", "S1"],
                &["P2", "Night Prayer", "D1", "Ch1", "00:05:00", "S2"],
            ],
        ),
        &store,
        ReferencePolicy::Lenient,
    );

    let report = pipeline.ingest_all().await.unwrap();
    let stotra_report = &report.kinds[2];
    let prarthana_report = &report.kinds[3];

    assert_eq!(stotra_report.written, 1);
    assert_eq!(stotra_report.excluded.len(), 1);

    // S2 was never written, so P2 cannot link to it
    assert_eq!(prarthana_report.written, 1);
    let RecordFailure::UnresolvedReference { tmp_id, target_tmp_id, .. } = &prarthana_report.excluded[0] else {
        panic!("expected unresolved reference")
    };
    assert_eq!(tmp_id, "P2");
    assert_eq!(target_tmp_id, "S2");

    assert_eq!(store.count(Kind::Stotra).await, 1);
    assert_eq!(store.count(Kind::Prarthana).await, 1);
}

#[tokio::test]
async fn test_duplicate_tmp_id_stops_run() {
    let store = Arc::new(InMemoryStore::new());
    let pipeline = pipeline(
        source(&[&["S1", "Aarti", ""], &["S1", "Aarti again", ""]], &[]),
        &store,
        ReferencePolicy::Strict,
    );

    let err = pipeline.ingest_all().await.unwrap_err();
    assert_eq!(err.kind(), Some(Kind::Stotra));
    assert_eq!(
        err.failures(),
        &[RecordFailure::DuplicateTmpId {
            tmp_id: "S1".into(),
            rows: vec![1, 2],
        }]
    );
    assert_eq!(store.count(Kind::Stotra).await, 0);
    assert_eq!(store.count(Kind::Prarthana).await, 0);
}

#[tokio::test]
async fn test_decode_errors_name_rows() {
    let store = Arc::new(InMemoryStore::new());
    let pipeline = pipeline(
        source(
            &[&["S1", "Aarti", ""]],
            &[
                &["P1", "Evening Prayer", "D1", "Ch1", "5 mins", "S1"],
                &["P2", "", "D1", "Ch1", "00:05:00", "S1"],
            ],
        ),
        &store,
        ReferencePolicy::Strict,
    );

    let err = pipeline.ingest_all().await.unwrap_err();
    let IngestError::Pass { stage, failures, .. } = &err else {
        panic!("expected pass error")
    };
    assert_eq!(*stage, Stage::Decode);
    assert_eq!(failures.len(), 2);
    assert!(failures[0].to_string().contains("5 mins"));
    assert!(failures[1].to_string().starts_with("row 2"));
}

#[tokio::test]
async fn test_unreachable_store_aborts_run() {
    let store = Arc::new(InMemoryStore::new());
    store.set_unreachable(true);
    let pipeline = pipeline(source(&[], &[]), &store, ReferencePolicy::Strict);

    let err = pipeline.ingest_all().await.unwrap_err();
    assert!(matches!(err.root(), IngestError::Database(_)));
    assert_eq!(err.kind(), Some(Kind::Deity));
    assert_eq!(err.stage(), Some(Stage::Load));
    assert_eq!(err.status_code(), hyper::StatusCode::SERVICE_UNAVAILABLE);

    let body = err.to_json();
    assert_eq!(body["kind"], "deity");
    assert_eq!(body["stage"], "load");
}
