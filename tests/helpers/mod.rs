#![allow(dead_code)]

use catalog_embed::catalog::persist::persist_batch;
use catalog_embed::catalog::records::upsert_record;
use catalog_embed::catalog::types::{
    ComplexityLevel, ContentRecord, Lane, LaneVectors, Snippet, SnippetField,
};
use catalog_embed::db;
use catalog_embed::embedding::{EmbeddingProvider, TaskIntent};
use catalog_embed::error::{CatalogError, Result};
use rusqlite::Connection;
use std::sync::Mutex;

/// Vector dimension used by every test database and mock provider.
pub const DIMS: usize = 8;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database(DIMS).unwrap()
}

/// Deterministic unit vector with a spike at position `seed`.
pub fn spike(seed: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; DIMS];
    v[seed % DIMS] = 1.0;
    v
}

/// Normalized mix of two spikes, `weight` toward `a`.
pub fn blend(a: usize, b: usize, weight: f32) -> Vec<f32> {
    let mut v = vec![0.0f32; DIMS];
    v[a % DIMS] += weight;
    v[b % DIMS] += 1.0 - weight;
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    v.iter_mut().for_each(|x| *x /= norm);
    v
}

/// A record with text in every lane.
pub fn full_record(id: &str, category: &str, complexity: ComplexityLevel) -> ContentRecord {
    ContentRecord {
        id: id.into(),
        title: format!("Example {id}"),
        description: format!("Demonstrates {id}"),
        category: category.into(),
        url: format!("https://htmx.org/examples/{id}/"),
        html_snippets: SnippetField::Native(vec![Snippet {
            name: Some("main".into()),
            code: format!("<div id=\"{id}\" hx-get=\"/{id}\"></div>"),
            description: Some("the demo markup".into()),
        }]),
        javascript_snippets: SnippetField::Encoded(r#"[{"code": "htmx.logAll()"}]"#.into()),
        key_concepts: vec!["hx-get".into(), "swapping".into()],
        htmx_attributes: vec!["hx-get".into()],
        demo_explanation: format!("Shows how {id} works."),
        complexity_level: Some(complexity),
        use_cases: vec!["dashboards".into()],
    }
}

/// Upsert records into `content_records`.
pub fn seed(conn: &Connection, records: &[ContentRecord]) {
    for record in records {
        upsert_record(conn, record).unwrap();
    }
}

/// Write vectors for one record directly.
pub fn store_lanes(conn: &mut Connection, id: &str, lanes: &[(Lane, Vec<f32>)]) {
    let vectors: LaneVectors = lanes.iter().cloned().collect();
    persist_batch(conn, &[(id.to_string(), vectors)], DIMS).unwrap();
}

/// Raw bytes of one lane column, for byte-for-byte comparisons.
pub fn lane_bytes(conn: &Connection, id: &str, lane: Lane) -> Option<Vec<u8>> {
    conn.query_row(
        &format!("SELECT {} FROM content_embeddings WHERE id = ?1", lane.column()),
        [id],
        |row| row.get(0),
    )
    .unwrap()
}

/// Recording provider. Texts containing a registered substring fail with a
/// transient error; texts matching a rule get that rule's vector; everything
/// else gets a spike chosen by text length.
#[derive(Default)]
pub struct MockProvider {
    calls: Mutex<Vec<(String, TaskIntent)>>,
    failing: Vec<String>,
    rules: Vec<(String, Vec<f32>)>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.failing.push(needle.into());
        self
    }

    pub fn with_vector(mut self, needle: &str, vector: Vec<f32>) -> Self {
        self.rules.push((needle.into(), vector));
        self
    }

    pub fn calls(&self) -> Vec<(String, TaskIntent)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl EmbeddingProvider for MockProvider {
    fn embed(&self, text: &str, intent: TaskIntent) -> Result<Vec<f32>> {
        self.calls.lock().unwrap().push((text.to_string(), intent));
        if self.failing.iter().any(|needle| text.contains(needle.as_str())) {
            return Err(CatalogError::Transient("mock rate limit".into()));
        }
        if let Some((_, vector)) = self
            .rules
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
        {
            return Ok(vector.clone());
        }
        Ok(spike(text.chars().count()))
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn model(&self) -> &str {
        "mock-embedding"
    }
}
