//! Batch write of lane vectors.
//!
//! [`persist_batch`] writes every pair of a batch inside one transaction. Each
//! pair is an upsert that touches only the lanes it carries, so refreshing one
//! lane never clears the others. Any failing statement rolls back the whole
//! batch.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction};

use crate::catalog::embedding_to_bytes;
use crate::catalog::types::LaneVectors;
use crate::error::{CatalogError, Result};

/// Persist `(record id, lane vectors)` pairs atomically. Returns the number of
/// rows written. Pairs with no lanes are ignored.
pub fn persist_batch(
    conn: &mut Connection,
    batch: &[(String, LaneVectors)],
    dimensions: usize,
) -> Result<usize> {
    let tx = conn.transaction()?;
    let now = chrono::Utc::now().to_rfc3339();

    let mut written = 0;
    for (id, lanes) in batch {
        if lanes.is_empty() {
            continue;
        }
        upsert_lanes(&tx, id, lanes, dimensions, &now)?;
        written += 1;
    }

    tx.commit()?;
    tracing::debug!(rows = written, "batch committed");
    Ok(written)
}

fn upsert_lanes(
    tx: &Transaction,
    id: &str,
    lanes: &LaneVectors,
    dimensions: usize,
    now: &str,
) -> Result<()> {
    let mut columns = Vec::with_capacity(lanes.len());
    let mut values = vec![Value::Text(id.to_string())];

    for (lane, vector) in lanes {
        if vector.len() != dimensions {
            return Err(CatalogError::Validation(format!(
                "{id}: {lane} vector has {} dimensions, expected {dimensions}",
                vector.len()
            )));
        }
        columns.push(lane.column());
        values.push(Value::Blob(embedding_to_bytes(vector)));
    }
    values.push(Value::Text(now.to_string()));

    let placeholders: Vec<String> = (2..=values.len()).map(|i| format!("?{i}")).collect();
    let updates: Vec<String> = columns
        .iter()
        .map(|col| format!("{col} = excluded.{col}"))
        .collect();

    let sql = format!(
        "INSERT INTO content_embeddings (id, {cols}, updated_at) VALUES (?1, {placeholders}) \
         ON CONFLICT(id) DO UPDATE SET {updates}, updated_at = excluded.updated_at",
        cols = columns.join(", "),
        placeholders = placeholders.join(", "),
        updates = updates.join(", "),
    );
    tx.execute(&sql, params_from_iter(values))?;
    Ok(())
}
