mod helpers;

use std::time::Duration;

use catalog_embed::catalog::import::import_dir;
use catalog_embed::catalog::normalize::ContentNormalizer;
use catalog_embed::catalog::pipeline::{EmbeddingPipeline, PipelineOptions};
use catalog_embed::catalog::records::{fetch_records, get_record};
use catalog_embed::catalog::search::{search, QueryEmbedder, SearchFilter, SearchMode};
use catalog_embed::catalog::types::{ComplexityLevel, Lane};
use catalog_embed::db;
use helpers::{spike, MockProvider, DIMS};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, body: &str) {
    std::fs::write(dir.path().join(name), body).unwrap();
}

#[test]
fn imported_files_are_embedded_and_searchable() {
    let files = TempDir::new().unwrap();
    write(
        &files,
        "inline-validation.json",
        r#"{
            "id": "inline-validation",
            "title": "Inline Validation",
            "category": "forms",
            "url": "https://htmx.org/examples/inline-validation/",
            "description": "Validate a form field on blur",
            "html_snippets": [{"name": "email", "code": "<input name='email' hx-post='/contact/email'>", "explanation": "validated on change"}],
            "javascript_snippets": "[]",
            "key_concepts": ["validation", "hx-target"],
            "htmx_attributes": ["hx-post", "hx-target"],
            "demo_explanation": "The server validates the email.",
            "complexity_level": "beginner",
            "use_cases": ["signup forms"]
        }"#,
    );
    write(
        &files,
        "progress-bar.json",
        r#"{
            "title": "Progress Bar",
            "category": "loading",
            "description": "Poll a job and show progress",
            "html_snippets": {"bar": "<div class='progress' hx-get='/job/progress' hx-trigger='every 600ms'></div>"},
            "complexity_level": "intermediate"
        }"#,
    );

    let tmp = TempDir::new().unwrap();
    let mut conn = db::open_database(tmp.path().join("catalog.db"), DIMS).unwrap();

    let report = import_dir(&conn, files.path()).unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(report.failed, 0);

    let progress = get_record(&conn, "progress-bar").unwrap().unwrap();
    assert_eq!(progress.complexity_level, Some(ComplexityLevel::Intermediate));
    assert!(progress.key_concepts.is_empty());

    let provider = MockProvider::new()
        .with_vector("Inline Validation", spike(0))
        .with_vector("Validate a form field", spike(0))
        .with_vector("validation, hx-target", spike(0))
        .with_vector("<input name='email'", spike(0))
        .with_vector("validate a form field on blur", spike(0));
    let records = fetch_records(&conn, None, None).unwrap();
    let pipeline_report = EmbeddingPipeline::new(
        &mut conn,
        &provider,
        ContentNormalizer::default(),
        PipelineOptions {
            force_refresh: false,
            batch_size: 10,
            pacing: Duration::ZERO,
        },
    )
    .run(&records)
    .unwrap();
    assert_eq!(pipeline_report.succeeded, 2);
    assert_eq!(pipeline_report.failed, 0);
    // progress-bar has no key concepts, so three lanes
    assert_eq!(pipeline_report.embedding_calls, 7);

    let content_call = provider
        .calls()
        .into_iter()
        .map(|(text, _)| text)
        .find(|text| text.contains("hx-trigger='every 600ms'"))
        .unwrap();
    assert!(content_call.starts_with("HTML Code:\n<div class='progress'"));

    let embedder = QueryEmbedder::new(&provider);
    let results = search(
        &conn,
        &embedder,
        "how to validate a form field on blur",
        SearchMode::Lane(Lane::Content),
        3,
        &SearchFilter {
            category: Some("forms".into()),
            complexity: Some(ComplexityLevel::Beginner),
        },
    )
    .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "inline-validation");
    assert!((results[0].similarity - 1.0).abs() < 1e-6);
    assert_eq!(
        results[0].html_snippets[0].description.as_deref(),
        Some("validated on change")
    );

    let multi = search(
        &conn,
        &embedder,
        "how to validate a form field on blur",
        SearchMode::MultiLane,
        5,
        &SearchFilter::default(),
    )
    .unwrap();
    assert_eq!(multi.len(), 2);
    assert_eq!(multi[0].id, "inline-validation");
}

#[test]
fn reimport_updates_in_place() {
    let files = TempDir::new().unwrap();
    write(&files, "tabs.json", r#"{"id": "tabs", "title": "Tabs", "category": "navigation"}"#);

    let conn = helpers::test_db();
    import_dir(&conn, files.path()).unwrap();

    write(
        &files,
        "tabs.json",
        r#"{"id": "tabs", "title": "Tabs (HATEOAS)", "category": "navigation"}"#,
    );
    let report = import_dir(&conn, files.path()).unwrap();
    assert_eq!(report.imported, 1);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM content_records", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(get_record(&conn, "tabs").unwrap().unwrap().title, "Tabs (HATEOAS)");
}
