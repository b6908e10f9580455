//! Read and upsert of `content_records`.
//!
//! List-valued fields are stored as JSON arrays in TEXT columns; snippet
//! columns hold whatever JSON the record arrived with and are decoded later
//! by the normalizer.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::catalog::types::{ContentRecord, SnippetField};
use crate::error::Result;

const RECORD_COLUMNS: &str = "id, title, description, category, url, html_snippets, \
     javascript_snippets, key_concepts, htmx_attributes, demo_explanation, \
     complexity_level, use_cases";

/// Build a [`ContentRecord`] from a row selected with the record columns in
/// their standard order, starting at `offset`.
pub(crate) fn record_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<ContentRecord> {
    let snippets = |idx: usize| -> rusqlite::Result<SnippetField> {
        Ok(row
            .get::<_, Option<String>>(offset + idx)?
            .map(SnippetField::Encoded)
            .unwrap_or_default())
    };
    let list = |idx: usize| -> rusqlite::Result<Vec<String>> {
        Ok(decode_string_list(row.get::<_, Option<String>>(offset + idx)?))
    };
    let complexity: Option<String> = row.get(offset + 10)?;

    Ok(ContentRecord {
        id: row.get(offset)?,
        title: row.get(offset + 1)?,
        description: row.get(offset + 2)?,
        category: row.get(offset + 3)?,
        url: row.get(offset + 4)?,
        html_snippets: snippets(5)?,
        javascript_snippets: snippets(6)?,
        key_concepts: list(7)?,
        htmx_attributes: list(8)?,
        demo_explanation: row.get(offset + 9)?,
        complexity_level: complexity.and_then(|c| c.parse().ok()),
        use_cases: list(11)?,
    })
}

/// Column list with a table alias, for joins.
pub(crate) fn record_columns(alias: &str) -> String {
    RECORD_COLUMNS
        .split(", ")
        .map(|col| format!("{alias}.{}", col.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A JSON array of strings. Plain text that is not JSON is kept as a single
/// entry rather than dropped.
fn decode_string_list(raw: Option<String>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Ok(serde_json::Value::String(s)) => vec![s],
        _ => vec![raw],
    }
}

fn encode_string_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".into())
}

/// Records in id order, optionally restricted by a raw SQL predicate over
/// `content_records` columns and capped at `limit`.
///
/// The predicate is trusted operator input and is interpolated verbatim.
pub fn fetch_records(
    conn: &Connection,
    limit: Option<usize>,
    filter: Option<&str>,
) -> Result<Vec<ContentRecord>> {
    let mut sql = format!("SELECT {RECORD_COLUMNS} FROM content_records");
    if let Some(predicate) = filter.map(str::trim).filter(|p| !p.is_empty()) {
        sql.push_str(&format!(" WHERE {predicate}"));
    }
    sql.push_str(" ORDER BY id");
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map([], |row| record_from_row(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(count = records.len(), filter = ?filter, "fetched content records");
    Ok(records)
}

pub fn get_record(conn: &Connection, id: &str) -> Result<Option<ContentRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM content_records WHERE id = ?1"),
            params![id],
            |row| record_from_row(row, 0),
        )
        .optional()?;
    Ok(record)
}

/// Insert a record or replace every field of the existing one. `created_at`
/// is kept from the first insert.
pub fn upsert_record(conn: &Connection, record: &ContentRecord) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO content_records (id, title, description, category, url, html_snippets, \
         javascript_snippets, key_concepts, htmx_attributes, demo_explanation, \
         complexity_level, use_cases, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13) \
         ON CONFLICT(id) DO UPDATE SET \
           title = excluded.title, description = excluded.description, \
           category = excluded.category, url = excluded.url, \
           html_snippets = excluded.html_snippets, \
           javascript_snippets = excluded.javascript_snippets, \
           key_concepts = excluded.key_concepts, htmx_attributes = excluded.htmx_attributes, \
           demo_explanation = excluded.demo_explanation, \
           complexity_level = excluded.complexity_level, use_cases = excluded.use_cases, \
           updated_at = excluded.updated_at",
        params![
            record.id,
            record.title,
            record.description,
            record.category,
            record.url,
            record.html_snippets.to_json_text(),
            record.javascript_snippets.to_json_text(),
            encode_string_list(&record.key_concepts),
            encode_string_list(&record.htmx_attributes),
            record.demo_explanation,
            record.complexity_level.map(|c| c.as_str()),
            encode_string_list(&record.use_cases),
            now,
        ],
    )?;
    Ok(())
}
