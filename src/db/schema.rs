//! SQL DDL for the catalog tables.
//!
//! Defines `content_records`, `content_embeddings`, `schema_meta`, and the
//! `content_with_embeddings` view. All DDL uses `IF NOT EXISTS` for idempotent
//! initialization. The vector columns are sized for the dimension the
//! database is created with; see [`crate::db::resize`] for changing it.

use rusqlite::Connection;

/// Lane columns of `content_embeddings`, in declaration order.
pub const VECTOR_COLUMNS: [&str; 4] = [
    "title_embedding",
    "description_embedding",
    "content_embedding",
    "key_concepts_embedding",
];

/// Name of the table holding per-record vectors.
pub const EMBEDDINGS_TABLE: &str = "content_embeddings";

const SCHEMA_SQL: &str = r#"
-- Content catalog, populated by `import`
CREATE TABLE IF NOT EXISTS content_records (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL DEFAULT '',
    url TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    html_snippets TEXT,
    javascript_snippets TEXT,
    key_concepts TEXT,
    htmx_attributes TEXT,
    demo_explanation TEXT NOT NULL DEFAULT '',
    complexity_level TEXT CHECK(complexity_level IN ('beginner','intermediate','advanced')),
    use_cases TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const VIEW_SQL: &str = r#"
CREATE VIEW IF NOT EXISTS content_with_embeddings AS
SELECT r.id, r.title, r.category, r.complexity_level,
       e.title_embedding, e.description_embedding,
       e.content_embedding, e.key_concepts_embedding,
       e.updated_at AS embedded_at
FROM content_records r
JOIN content_embeddings e ON e.id = r.id;
"#;

/// DDL for the vectors table at the given dimension. Each lane is either NULL
/// or exactly `dimensions` little-endian f32 values.
pub fn embeddings_table_sql(table: &str, dimensions: usize, if_not_exists: bool) -> String {
    let bytes = dimensions * std::mem::size_of::<f32>();
    let columns: Vec<String> = VECTOR_COLUMNS
        .iter()
        .map(|col| format!("    {col} BLOB CHECK({col} IS NULL OR length({col}) = {bytes})"))
        .collect();
    let guard = if if_not_exists { "IF NOT EXISTS " } else { "" };
    format!(
        "CREATE TABLE {guard}{table} (\n    \
         id TEXT PRIMARY KEY REFERENCES content_records(id) ON DELETE CASCADE,\n\
         {},\n    \
         updated_at TEXT NOT NULL\n);",
        columns.join(",\n")
    )
}

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
///
/// `dimensions` only takes effect when the vectors table is first created;
/// the stored value in `schema_meta` is never overwritten here.
pub fn init_schema(conn: &Connection, dimensions: usize) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(&embeddings_table_sql(EMBEDDINGS_TABLE, dimensions, true))?;
    conn.execute_batch(VIEW_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('embedding_dimensions', ?1)",
        [dimensions.to_string()],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        conn
    }

    #[test]
    fn schema_creates_all_tables() {
        let conn = fresh();
        init_schema(&conn, 8).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"content_records".to_string()));
        assert!(tables.contains(&"content_embeddings".to_string()));
        assert!(tables.contains(&"schema_meta".to_string()));

        let views: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='view' AND name='content_with_embeddings'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(views, 1);

        let version: String = conn
            .query_row("SELECT vec_version()", [], |r| r.get(0))
            .unwrap();
        assert!(!version.is_empty());
    }

    #[test]
    fn schema_is_idempotent_and_keeps_first_dimension() {
        let conn = fresh();
        init_schema(&conn, 8).unwrap();
        init_schema(&conn, 16).unwrap();

        let dims: String = conn
            .query_row(
                "SELECT value FROM schema_meta WHERE key = 'embedding_dimensions'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(dims, "8");
    }

    #[test]
    fn partial_vectors_are_rejected() {
        let conn = fresh();
        init_schema(&conn, 4).unwrap();
        conn.execute(
            "INSERT INTO content_records (id, created_at, updated_at) VALUES ('a', 'now', 'now')",
            [],
        )
        .unwrap();

        let short = vec![0u8; 3 * 4];
        let err = conn.execute(
            "INSERT INTO content_embeddings (id, title_embedding, updated_at) VALUES ('a', ?1, 'now')",
            [short],
        );
        assert!(err.is_err());

        let full = vec![0u8; 4 * 4];
        conn.execute(
            "INSERT INTO content_embeddings (id, title_embedding, updated_at) VALUES ('a', ?1, 'now')",
            [full],
        )
        .unwrap();
    }

    #[test]
    fn vectors_require_existing_record() {
        let conn = fresh();
        init_schema(&conn, 4).unwrap();
        let err = conn.execute(
            "INSERT INTO content_embeddings (id, updated_at) VALUES ('missing', 'now')",
            [],
        );
        assert!(err.is_err());
    }
}
