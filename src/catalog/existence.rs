//! Which lanes of a record already hold a vector.

use rusqlite::{params, Connection, OptionalExtension};

use crate::catalog::bytes_to_embedding;
use crate::catalog::types::{EmbeddingSet, LanePresence};
use crate::error::Result;

/// Per-lane presence for `id`. A record with no row in `content_embeddings`
/// has no lanes.
pub fn lane_presence(conn: &Connection, id: &str) -> Result<LanePresence> {
    let presence = conn
        .query_row(
            "SELECT title_embedding IS NOT NULL, description_embedding IS NOT NULL, \
             content_embedding IS NOT NULL, key_concepts_embedding IS NOT NULL \
             FROM content_embeddings WHERE id = ?1",
            params![id],
            |row| {
                Ok(LanePresence {
                    title: row.get(0)?,
                    description: row.get(1)?,
                    content: row.get(2)?,
                    key_concepts: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(presence.unwrap_or_default())
}

/// The stored vectors of `id`, if a row exists.
pub fn fetch_embedding_set(conn: &Connection, id: &str) -> Result<Option<EmbeddingSet>> {
    let set = conn
        .query_row(
            "SELECT id, title_embedding, description_embedding, content_embedding, \
             key_concepts_embedding, updated_at FROM content_embeddings WHERE id = ?1",
            params![id],
            |row| {
                let lane = |idx: usize| -> rusqlite::Result<Option<Vec<f32>>> {
                    Ok(row
                        .get::<_, Option<Vec<u8>>>(idx)?
                        .map(|bytes| bytes_to_embedding(&bytes)))
                };
                Ok(EmbeddingSet {
                    id: row.get(0)?,
                    title_embedding: lane(1)?,
                    description_embedding: lane(2)?,
                    content_embedding: lane(3)?,
                    key_concepts_embedding: lane(4)?,
                    updated_at: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::embedding_to_bytes;
    use crate::catalog::records::upsert_record;
    use crate::catalog::types::{ContentRecord, Lane};
    use crate::db::open_memory_database;

    #[test]
    fn missing_row_means_no_lanes() {
        let conn = open_memory_database(4).unwrap();
        let presence = lane_presence(&conn, "nope").unwrap();
        assert_eq!(presence, LanePresence::default());
        assert!(fetch_embedding_set(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn reports_each_lane() {
        let conn = open_memory_database(4).unwrap();
        upsert_record(
            &conn,
            &ContentRecord {
                id: "a".into(),
                ..ContentRecord::default()
            },
        )
        .unwrap();
        conn.execute(
            "INSERT INTO content_embeddings (id, content_embedding, updated_at) VALUES ('a', ?1, 'now')",
            params![embedding_to_bytes(&[0.5, 0.5, 0.5, 0.5])],
        )
        .unwrap();

        let presence = lane_presence(&conn, "a").unwrap();
        assert!(presence.has(Lane::Content));
        assert!(!presence.has(Lane::Title));
        assert!(!presence.is_complete());

        let set = fetch_embedding_set(&conn, "a").unwrap().unwrap();
        assert_eq!(set.lane(Lane::Content), Some(&[0.5f32, 0.5, 0.5, 0.5][..]));
        assert!(set.title_embedding.is_none());
    }
}
