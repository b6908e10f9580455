//! Query path: embed the query, rank stored vectors, hydrate records.
//!
//! Single-lane ranking orders rows by cosine similarity against one lane
//! column, computed by sqlite-vec. Multi-lane ranking scores every lane a row
//! has and combines them into a weighted mean, renormalized over the lanes
//! present. Both share the same conjunctive category/complexity filter.

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::catalog::embedding_to_bytes;
use crate::catalog::normalize::{decode_snippets, truncate_chars, DEFAULT_MAX_CHARS};
use crate::catalog::records::{record_columns, record_from_row};
use crate::catalog::types::{ComplexityLevel, ContentRecord, Lane, Snippet, SnippetField};
use crate::db::migrations;
use crate::embedding::{EmbeddingProvider, TaskIntent};
use crate::error::{CatalogError, Result};

/// Embeds search text with the query intent.
pub struct QueryEmbedder<'a> {
    provider: &'a dyn EmbeddingProvider,
    max_chars: usize,
}

impl<'a> QueryEmbedder<'a> {
    pub fn new(provider: &'a dyn EmbeddingProvider) -> Self {
        Self {
            provider,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Fails with Validation on empty input; any provider failure is returned
    /// as is, since a query without a vector cannot be searched.
    pub fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        if query.trim().is_empty() {
            return Err(CatalogError::Validation("query is empty".into()));
        }
        let text = truncate_chars(query, self.max_chars);
        self.provider.embed(text, TaskIntent::RetrievalQuery)
    }
}

/// Conjunctive restrictions; `None` means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub category: Option<String>,
    pub complexity: Option<ComplexityLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Lane(Lane),
    MultiLane,
}

impl Default for SearchMode {
    fn default() -> Self {
        Self::Lane(Lane::Content)
    }
}

/// A ranked record with its snippets decoded.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub url: String,
    pub html_snippets: Vec<Snippet>,
    pub javascript_snippets: Vec<Snippet>,
    pub key_concepts: Vec<String>,
    pub htmx_attributes: Vec<String>,
    pub demo_explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity_level: Option<ComplexityLevel>,
    pub use_cases: Vec<String>,
    pub similarity: f64,
}

impl SearchResult {
    fn from_record(record: ContentRecord, similarity: f64) -> Self {
        let snippets = |field: &SnippetField| {
            decode_snippets(field).unwrap_or_else(|e| {
                tracing::warn!(id = %record.id, error = %e, "stored snippets are not decodable");
                Vec::new()
            })
        };
        let html_snippets = snippets(&record.html_snippets);
        let javascript_snippets = snippets(&record.javascript_snippets);

        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            category: record.category,
            url: record.url,
            html_snippets,
            javascript_snippets,
            key_concepts: record.key_concepts,
            htmx_attributes: record.htmx_attributes,
            demo_explanation: record.demo_explanation,
            complexity_level: record.complexity_level,
            use_cases: record.use_cases,
            similarity,
        }
    }
}

/// Weight of a lane in multi-lane ranking.
pub fn lane_weight(lane: Lane) -> f64 {
    match lane {
        Lane::Content => 0.4,
        Lane::Title | Lane::Description | Lane::KeyConcepts => 0.2,
    }
}

const FILTER_SQL: &str =
    "(?2 IS NULL OR r.category = ?2) AND (?3 IS NULL OR r.complexity_level = ?3)";

/// Top `limit` records by similarity of `lane` to `query`. Rows without a
/// vector in that lane are not candidates, nor are rows whose similarity is
/// undefined (a zero-norm vector makes the cosine NULL).
pub fn vector_search(
    conn: &Connection,
    query: &[f32],
    lane: Lane,
    limit: usize,
    filter: &SearchFilter,
) -> Result<Vec<SearchResult>> {
    let col = lane.column();
    let sql = format!(
        "SELECT {cols}, 1.0 - vec_distance_cosine(e.{col}, ?1) AS similarity \
         FROM content_embeddings e JOIN content_records r ON r.id = e.id \
         WHERE e.{col} IS NOT NULL \
           AND vec_distance_cosine(e.{col}, ?1) IS NOT NULL \
           AND {FILTER_SQL} \
         ORDER BY similarity DESC, r.id \
         LIMIT ?4",
        cols = record_columns("r"),
    );

    let mut stmt = conn.prepare(&sql)?;
    let results = stmt
        .query_map(
            params![
                embedding_to_bytes(query),
                filter.category,
                filter.complexity.map(|c| c.as_str()),
                limit as i64
            ],
            |row| Ok((record_from_row(row, 0)?, row.get::<_, f64>(12)?)),
        )?
        .map(|row| row.map(|(record, similarity)| SearchResult::from_record(record, similarity)))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(%lane, limit, hits = results.len(), "vector search");
    Ok(results)
}

/// Top `limit` records by weighted similarity across all lanes. Each row is
/// scored over the lanes it has; rows with no vectors are not candidates.
pub fn multi_vector_search(
    conn: &Connection,
    query: &[f32],
    limit: usize,
    filter: &SearchFilter,
) -> Result<Vec<SearchResult>> {
    let scores: Vec<String> = Lane::ALL
        .iter()
        .map(|lane| {
            let col = lane.column();
            format!(
                "CASE WHEN e.{col} IS NULL THEN NULL \
                 ELSE 1.0 - vec_distance_cosine(e.{col}, ?1) END"
            )
        })
        .collect();
    let any_lane: Vec<String> = Lane::ALL
        .iter()
        .map(|lane| format!("e.{} IS NOT NULL", lane.column()))
        .collect();
    let sql = format!(
        "SELECT {cols}, {scores} \
         FROM content_embeddings e JOIN content_records r ON r.id = e.id \
         WHERE ({any}) AND {FILTER_SQL}",
        cols = record_columns("r"),
        scores = scores.join(", "),
        any = any_lane.join(" OR "),
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            params![
                embedding_to_bytes(query),
                filter.category,
                filter.complexity.map(|c| c.as_str())
            ],
            |row| {
                let mut lanes = Vec::with_capacity(Lane::ALL.len());
                for (i, lane) in Lane::ALL.iter().enumerate() {
                    if let Some(sim) = row.get::<_, Option<f64>>(12 + i)? {
                        lanes.push((*lane, sim));
                    }
                }
                Ok((record_from_row(row, 0)?, lanes))
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    let mut scored: Vec<(ContentRecord, f64)> = rows
        .into_iter()
        .filter_map(|(record, lanes)| combine(&lanes).map(|score| (record, score)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
    scored.truncate(limit);

    tracing::debug!(limit, hits = scored.len(), "multi-lane vector search");
    Ok(scored
        .into_iter()
        .map(|(record, score)| SearchResult::from_record(record, score))
        .collect())
}

/// Weighted mean over the lanes present.
fn combine(lanes: &[(Lane, f64)]) -> Option<f64> {
    let total: f64 = lanes.iter().map(|(lane, _)| lane_weight(*lane)).sum();
    if lanes.is_empty() || total <= 0.0 {
        return None;
    }
    let weighted: f64 = lanes.iter().map(|(lane, sim)| lane_weight(*lane) * sim).sum();
    Some(weighted / total)
}

/// Embed `query` and rank stored records.
///
/// The query vector must have the dimension the database was built for.
pub fn search(
    conn: &Connection,
    embedder: &QueryEmbedder<'_>,
    query: &str,
    mode: SearchMode,
    limit: usize,
    filter: &SearchFilter,
) -> Result<Vec<SearchResult>> {
    let vector = embedder.embed_query(query)?;

    if let Some(stored) = migrations::get_embedding_dimensions(conn)? {
        if vector.len() != stored {
            return Err(CatalogError::Validation(format!(
                "query vector has {} dimensions, database stores {stored}",
                vector.len()
            )));
        }
    }

    match mode {
        SearchMode::Lane(lane) => vector_search(conn, &vector, lane, limit, filter),
        SearchMode::MultiLane => multi_vector_search(conn, &vector, limit, filter),
    }
}
