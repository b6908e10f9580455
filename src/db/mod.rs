pub mod migrations;
pub mod resize;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;

use crate::config::EmbeddingConfig;
use crate::error::CatalogError;

static SQLITE_VEC_INIT: Once = Once::new();

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Open (or create) the catalog database at the given path, with sqlite-vec
/// loaded and schema initialized. A new database gets vector columns sized
/// for `dimensions`; an existing one keeps its stored dimension.
pub fn open_database(path: impl AsRef<Path>, dimensions: usize) -> Result<Connection> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    load_sqlite_vec();

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    schema::init_schema(&conn, dimensions).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open an in-memory database with schema and migrations applied.
pub fn open_memory_database(dimensions: usize) -> Result<Connection> {
    load_sqlite_vec();
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::init_schema(&conn, dimensions).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Check the configured embedding settings against what the stored vectors
/// were built with.
///
/// A dimension mismatch is a Configuration error: vectors of different
/// lengths cannot be compared and the columns reject them. A model mismatch
/// only warns. On first use the model identifier is recorded.
pub fn verify_embedding_config(
    conn: &Connection,
    config: &EmbeddingConfig,
) -> Result<(), CatalogError> {
    let stored = migrations::get_embedding_dimensions(conn)?;
    if let Some(stored) = stored {
        if stored != config.dimensions {
            return Err(CatalogError::Configuration(format!(
                "configured embedding dimension {} does not match the database ({stored}); \
                 run `catalog-embed resize --dimensions {}` or change embedding.dimensions",
                config.dimensions, config.dimensions
            )));
        }
    }

    match migrations::get_embedding_model(conn)? {
        Some(model) if model != config.model => {
            tracing::warn!(
                stored = %model,
                configured = %config.model,
                "embedding model changed; run `catalog-embed embed --force-update` to rebuild vectors"
            );
        }
        Some(_) => {}
        None => migrations::set_embedding_model(conn, &config.model)?,
    }

    Ok(())
}

/// Counts reported by the `status` command.
#[derive(Debug, Serialize)]
pub struct DatabaseStatus {
    pub schema_version: u32,
    pub sqlite_vec_version: String,
    pub embedding_model: Option<String>,
    pub embedding_dimensions: Option<usize>,
    pub record_count: u64,
    pub embedded_records: u64,
    pub title_vectors: u64,
    pub description_vectors: u64,
    pub content_vectors: u64,
    pub key_concepts_vectors: u64,
}

pub fn database_status(conn: &Connection) -> rusqlite::Result<DatabaseStatus> {
    let sqlite_vec_version: String = conn.query_row("SELECT vec_version()", [], |r| r.get(0))?;
    let record_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM content_records", [], |r| r.get(0))?;

    let (embedded_records, title, description, content, key_concepts): (i64, i64, i64, i64, i64) =
        conn.query_row(
            "SELECT COUNT(*), COUNT(title_embedding), COUNT(description_embedding), \
             COUNT(content_embedding), COUNT(key_concepts_embedding) FROM content_embeddings",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )?;

    Ok(DatabaseStatus {
        schema_version: migrations::get_schema_version(conn)?,
        sqlite_vec_version,
        embedding_model: migrations::get_embedding_model(conn)?,
        embedding_dimensions: migrations::get_embedding_dimensions(conn)?,
        record_count: record_count as u64,
        embedded_records: embedded_records as u64,
        title_vectors: title as u64,
        description_vectors: description as u64,
        content_vectors: content as u64,
        key_concepts_vectors: key_concepts as u64,
    })
}
