//! One-time change of the stored vector dimension.
//!
//! SQLite cannot alter a column's constraint in place, so the vectors table is
//! rebuilt at the new size and swapped in. Views that read the table must be
//! dropped first (the rename refuses to run while a view points at a missing
//! table) and are recreated from their saved SQL afterwards. Everything runs
//! in one transaction; any failure, including a view that cannot be
//! recreated, rolls the whole change back.

use rusqlite::{Connection, Transaction};
use serde::Serialize;

use super::migrations;
use super::schema::{embeddings_table_sql, EMBEDDINGS_TABLE, VECTOR_COLUMNS};
use crate::error::{CatalogError, Result};

const REBUILD_TABLE: &str = "content_embeddings_resized";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResizeReport {
    pub previous: Option<usize>,
    pub dimensions: usize,
    /// Views dropped and recreated around the rebuild.
    pub views_recreated: Vec<String>,
    /// Lane vectors that had the old length and were cleared to NULL.
    pub vectors_cleared: u64,
}

impl ResizeReport {
    pub fn is_noop(&self) -> bool {
        self.previous == Some(self.dimensions)
    }
}

/// Rebuild the vectors table for `dimensions`.
///
/// Vectors of any other length are cleared, so the next pipeline run sees
/// those lanes as missing and regenerates them. Resizing to the current
/// dimension changes nothing.
pub fn resize_vector_columns(conn: &mut Connection, dimensions: usize) -> Result<ResizeReport> {
    if dimensions == 0 {
        return Err(CatalogError::Validation(
            "vector dimension must be greater than zero".into(),
        ));
    }

    let tx = conn.transaction()?;
    let previous = migrations::get_embedding_dimensions(&tx)?;
    if previous == Some(dimensions) {
        tracing::info!(dimensions, "vector dimension unchanged, nothing to do");
        return Ok(ResizeReport {
            previous,
            dimensions,
            views_recreated: Vec::new(),
            vectors_cleared: 0,
        });
    }

    let views = dependent_views(&tx)?;
    for (name, _) in views.iter().rev() {
        tracing::info!(view = %name, "dropping dependent view");
        tx.execute_batch(&format!("DROP VIEW \"{name}\""))?;
    }

    let vectors_cleared = count_mismatched(&tx, dimensions)?;
    rebuild_table(&tx, dimensions)?;

    for (name, sql) in &views {
        if let Err(e) = tx.execute_batch(sql) {
            tracing::error!(view = %name, error = %e, "failed to recreate view, rolling back");
            return Err(e.into());
        }
        tracing::info!(view = %name, "view recreated");
    }

    migrations::set_embedding_dimensions(&tx, dimensions)?;
    tx.commit()?;

    tracing::info!(
        from = ?previous,
        to = dimensions,
        vectors_cleared,
        "vector dimension changed"
    );

    Ok(ResizeReport {
        previous,
        dimensions,
        views_recreated: views.into_iter().map(|(name, _)| name).collect(),
        vectors_cleared,
    })
}

/// Views that read the vectors table, directly or through other views, with
/// their SQL. Ordered so each view comes after every collected view it reads:
/// recreate front to back, drop back to front.
fn dependent_views(tx: &Transaction) -> rusqlite::Result<Vec<(String, String)>> {
    let mut stmt =
        tx.prepare("SELECT name, sql FROM sqlite_master WHERE type = 'view' ORDER BY name")?;
    let all = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<(String, String)>, _>>()?;

    let mut targets = vec![EMBEDDINGS_TABLE.to_string()];
    let mut found: Vec<(String, String)> = Vec::new();
    loop {
        let before = found.len();
        for (name, sql) in &all {
            if found.iter().any(|(n, _)| n == name) {
                continue;
            }
            if targets.iter().any(|t| mentions(sql, t)) {
                targets.push(name.clone());
                found.push((name.clone(), sql.clone()));
            }
        }
        if found.len() == before {
            break;
        }
    }

    let mut ordered = Vec::with_capacity(found.len());
    while !found.is_empty() {
        let ready = found.iter().position(|(name, sql)| {
            !found
                .iter()
                .any(|(other, _)| other != name && mentions(sql, other))
        });
        match ready {
            Some(i) => ordered.push(found.remove(i)),
            // names that only collide textually; keep discovery order
            None => ordered.append(&mut found),
        }
    }
    Ok(ordered)
}

/// Whether `sql` refers to `name` as a whole identifier, ignoring case.
fn mentions(sql: &str, name: &str) -> bool {
    let sql = sql.to_ascii_lowercase();
    let name = name.to_ascii_lowercase();
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    sql.match_indices(&name).any(|(at, _)| {
        let before = sql[..at].chars().next_back();
        let after = sql[at + name.len()..].chars().next();
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}

fn count_mismatched(tx: &Transaction, dimensions: usize) -> rusqlite::Result<u64> {
    let bytes = dimensions * std::mem::size_of::<f32>();
    let terms: Vec<String> = VECTOR_COLUMNS
        .iter()
        .map(|col| format!("SUM({col} IS NOT NULL AND length({col}) != {bytes})"))
        .collect();
    let sql = format!(
        "SELECT COALESCE({}, 0) FROM {EMBEDDINGS_TABLE}",
        terms.join(" + ")
    );
    let cleared: i64 = tx.query_row(&sql, [], |row| row.get(0))?;
    Ok(cleared as u64)
}

fn rebuild_table(tx: &Transaction, dimensions: usize) -> rusqlite::Result<()> {
    let bytes = dimensions * std::mem::size_of::<f32>();
    tx.execute_batch(&embeddings_table_sql(REBUILD_TABLE, dimensions, false))?;

    let kept: Vec<String> = VECTOR_COLUMNS
        .iter()
        .map(|col| format!("CASE WHEN length({col}) = {bytes} THEN {col} END"))
        .collect();
    tx.execute_batch(&format!(
        "INSERT INTO {REBUILD_TABLE} (id, {}, updated_at) \
         SELECT id, {}, updated_at FROM {EMBEDDINGS_TABLE};
         DROP TABLE {EMBEDDINGS_TABLE};
         ALTER TABLE {REBUILD_TABLE} RENAME TO {EMBEDDINGS_TABLE};",
        VECTOR_COLUMNS.join(", "),
        kept.join(", ")
    ))
}
