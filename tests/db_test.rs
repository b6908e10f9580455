mod helpers;

use catalog_embed::catalog::embedding_to_bytes;
use catalog_embed::catalog::types::{ComplexityLevel, Lane};
use catalog_embed::config::EmbeddingConfig;
use catalog_embed::db;
use catalog_embed::db::migrations::{
    get_embedding_dimensions, get_schema_version, CURRENT_SCHEMA_VERSION,
};
use catalog_embed::db::resize::resize_vector_columns;
use helpers::{full_record, lane_bytes, seed, spike, store_lanes, DIMS};
use tempfile::TempDir;

#[test]
fn open_creates_new_db_at_nonexistent_path() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("subdir").join("catalog.db");
    assert!(!db_path.exists());

    let conn = db::open_database(&db_path, DIMS).unwrap();
    assert!(db_path.exists());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM content_records", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn busy_timeout_and_wal_are_set() {
    let tmp = TempDir::new().unwrap();
    let conn = db::open_database(tmp.path().join("catalog.db"), DIMS).unwrap();

    let timeout: i64 = conn
        .pragma_query_value(None, "busy_timeout", |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 5000);

    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[test]
fn reopening_keeps_the_original_dimension() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("catalog.db");
    drop(db::open_database(&path, DIMS).unwrap());

    let conn = db::open_database(&path, 16).unwrap();
    assert_eq!(get_embedding_dimensions(&conn).unwrap(), Some(DIMS));

    let config = EmbeddingConfig {
        dimensions: 16,
        ..EmbeddingConfig::default()
    };
    let err = db::verify_embedding_config(&conn, &config).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn cosine_similarity_through_sqlite_vec() {
    let conn = helpers::test_db();
    let same: f64 = conn
        .query_row(
            "SELECT 1.0 - vec_distance_cosine(?1, ?2)",
            [embedding_to_bytes(&spike(2)), embedding_to_bytes(&spike(2))],
            |r| r.get(0),
        )
        .unwrap();
    let orthogonal: f64 = conn
        .query_row(
            "SELECT 1.0 - vec_distance_cosine(?1, ?2)",
            [embedding_to_bytes(&spike(2)), embedding_to_bytes(&spike(5))],
            |r| r.get(0),
        )
        .unwrap();
    assert!((same - 1.0).abs() < 1e-6);
    assert!(orthogonal.abs() < 1e-6);
}

#[test]
fn resize_keeps_records_and_custom_views() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("catalog.db");
    let mut conn = db::open_database(&path, DIMS).unwrap();

    seed(&conn, &[full_record("a", "forms", ComplexityLevel::Beginner)]);
    store_lanes(&mut conn, "a", &[(Lane::Title, spike(1)), (Lane::Content, spike(2))]);
    conn.execute_batch(
        "CREATE VIEW embedded_titles AS SELECT id, title_embedding FROM content_embeddings \
         WHERE title_embedding IS NOT NULL;",
    )
    .unwrap();

    let report = resize_vector_columns(&mut conn, 16).unwrap();
    assert_eq!(report.vectors_cleared, 2);
    assert_eq!(
        report.views_recreated,
        vec!["content_with_embeddings".to_string(), "embedded_titles".to_string()]
    );
    drop(conn);

    let conn = db::open_database(&path, 16).unwrap();
    assert_eq!(get_embedding_dimensions(&conn).unwrap(), Some(16));
    assert_eq!(lane_bytes(&conn, "a", Lane::Title), None);
    let titles: i64 = conn
        .query_row("SELECT COUNT(*) FROM embedded_titles", [], |r| r.get(0))
        .unwrap();
    assert_eq!(titles, 0);

    let config = EmbeddingConfig {
        dimensions: 16,
        ..EmbeddingConfig::default()
    };
    db::verify_embedding_config(&conn, &config).unwrap();
}

#[test]
fn resize_recreates_views_built_on_other_views() {
    let mut conn = helpers::test_db();
    seed(&conn, &[full_record("a", "forms", ComplexityLevel::Beginner)]);
    store_lanes(&mut conn, "a", &[(Lane::Title, spike(1))]);
    // zz_titled sorts after the view that reads it
    conn.execute_batch(
        "CREATE VIEW zz_titled AS SELECT id, title_embedding FROM content_embeddings \
         WHERE title_embedding IS NOT NULL;
         CREATE VIEW titled_count AS SELECT COUNT(*) AS n FROM zz_titled;
         CREATE VIEW unrelated AS SELECT id FROM content_records;",
    )
    .unwrap();

    let report = resize_vector_columns(&mut conn, 16).unwrap();
    assert_eq!(
        report.views_recreated,
        vec![
            "content_with_embeddings".to_string(),
            "zz_titled".to_string(),
            "titled_count".to_string()
        ]
    );
    assert_eq!(get_embedding_dimensions(&conn).unwrap(), Some(16));

    let n: i64 = conn
        .query_row("SELECT n FROM titled_count", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
    let unrelated: i64 = conn
        .query_row("SELECT COUNT(*) FROM unrelated", [], |r| r.get(0))
        .unwrap();
    assert_eq!(unrelated, 1);
}

#[test]
fn failed_resize_leaves_everything_in_place() {
    let mut conn = helpers::test_db();
    seed(&conn, &[full_record("a", "forms", ComplexityLevel::Beginner)]);
    store_lanes(&mut conn, "a", &[(Lane::Title, spike(1))]);
    let before = lane_bytes(&conn, "a", Lane::Title);
    // a leftover rebuild table makes the rebuild step fail after the views were dropped
    conn.execute_batch("CREATE TABLE content_embeddings_resized (id TEXT PRIMARY KEY);")
        .unwrap();

    assert!(resize_vector_columns(&mut conn, 16).is_err());
    assert_eq!(get_embedding_dimensions(&conn).unwrap(), Some(DIMS));
    assert_eq!(lane_bytes(&conn, "a", Lane::Title), before);
    let views: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'view' AND name = 'content_with_embeddings'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(views, 1);
}
