//! Content and vector type definitions.
//!
//! Defines [`ContentRecord`] (a catalog entry as imported), [`Snippet`] and
//! [`SnippetField`] (code samples in either native or JSON-string form),
//! [`ComplexityLevel`], [`Lane`] (the four embeddable projections of a
//! record), and the per-record vector containers [`LaneVectors`] and
//! [`EmbeddingSet`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Difficulty tier of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ComplexityLevel {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl std::fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComplexityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(format!("unknown complexity level: {s}")),
        }
    }
}

/// A named projection of a record into embeddable text, each stored in its
/// own vector column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Title,
    Description,
    /// Composed multi-field summary; the primary retrieval target.
    Content,
    KeyConcepts,
}

impl Lane {
    pub const ALL: [Lane; 4] = [Lane::Title, Lane::Description, Lane::Content, Lane::KeyConcepts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Content => "content",
            Self::KeyConcepts => "key_concepts",
        }
    }

    /// Vector column in `content_embeddings`.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Title => "title_embedding",
            Self::Description => "description_embedding",
            Self::Content => "content_embedding",
            Self::KeyConcepts => "key_concepts_embedding",
        }
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Lane {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "description" => Ok(Self::Description),
            "content" => Ok(Self::Content),
            "key_concepts" => Ok(Self::KeyConcepts),
            _ => Err(format!("unknown lane: {s}")),
        }
    }
}

/// One code sample attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub code: String,
    #[serde(default, alias = "explanation", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Snippet list as it arrives from import files or the database: a native
/// array, a JSON document serialized into a string, or some other JSON shape
/// (name→code maps, arrays of bare strings). Decoded once, by
/// [`crate::catalog::normalize::decode_snippets`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnippetField {
    Native(Vec<Snippet>),
    Encoded(String),
    Other(serde_json::Value),
}

impl Default for SnippetField {
    fn default() -> Self {
        Self::Native(Vec::new())
    }
}

impl SnippetField {
    /// Text stored in the database column.
    pub fn to_json_text(&self) -> String {
        match self {
            Self::Native(snippets) => {
                serde_json::to_string(snippets).unwrap_or_else(|_| "[]".into())
            }
            Self::Encoded(text) => text.clone(),
            Self::Other(value) => value.to_string(),
        }
    }
}

/// A catalog entry. Owned by the import path; read-only to the embedding
/// pipeline and search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentRecord {
    /// Stable, externally assigned identifier.
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub url: String,
    pub html_snippets: SnippetField,
    pub javascript_snippets: SnippetField,
    pub key_concepts: Vec<String>,
    pub htmx_attributes: Vec<String>,
    pub demo_explanation: String,
    pub complexity_level: Option<ComplexityLevel>,
    pub use_cases: Vec<String>,
}

/// Vectors produced for one record in one run, keyed by lane.
pub type LaneVectors = BTreeMap<Lane, Vec<f32>>;

/// The stored vectors of one record. A lane is either absent or a complete
/// vector of the database dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingSet {
    pub id: String,
    pub title_embedding: Option<Vec<f32>>,
    pub description_embedding: Option<Vec<f32>>,
    pub content_embedding: Option<Vec<f32>>,
    pub key_concepts_embedding: Option<Vec<f32>>,
    pub updated_at: String,
}

impl EmbeddingSet {
    pub fn lane(&self, lane: Lane) -> Option<&[f32]> {
        match lane {
            Lane::Title => self.title_embedding.as_deref(),
            Lane::Description => self.description_embedding.as_deref(),
            Lane::Content => self.content_embedding.as_deref(),
            Lane::KeyConcepts => self.key_concepts_embedding.as_deref(),
        }
    }
}

/// Which lanes of a record already hold a vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LanePresence {
    pub title: bool,
    pub description: bool,
    pub content: bool,
    pub key_concepts: bool,
}

impl LanePresence {
    pub fn has(&self, lane: Lane) -> bool {
        match lane {
            Lane::Title => self.title,
            Lane::Description => self.description,
            Lane::Content => self.content,
            Lane::KeyConcepts => self.key_concepts,
        }
    }

    pub fn is_complete(&self) -> bool {
        Lane::ALL.iter().all(|lane| self.has(*lane))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_round_trips_through_str() {
        for lane in Lane::ALL {
            assert_eq!(lane.as_str().parse::<Lane>().unwrap(), lane);
            assert!(lane.column().starts_with(lane.as_str()));
        }
        assert!("body".parse::<Lane>().is_err());
    }

    #[test]
    fn complexity_parses() {
        assert_eq!("advanced".parse::<ComplexityLevel>().unwrap(), ComplexityLevel::Advanced);
        assert!("expert".parse::<ComplexityLevel>().is_err());
    }

    #[test]
    fn record_accepts_native_and_encoded_snippets() {
        let json = r#"{
            "id": "btn-01",
            "title": "Active Search",
            "category": "forms",
            "complexity_level": "beginner",
            "html_snippets": [{"code": "<input hx-get='/search'>", "description": "search box"}],
            "javascript_snippets": "[{\"code\": \"htmx.on('x')\"}]"
        }"#;
        let record: ContentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.complexity_level, Some(ComplexityLevel::Beginner));
        assert!(matches!(record.html_snippets, SnippetField::Native(ref v) if v.len() == 1));
        assert!(matches!(record.javascript_snippets, SnippetField::Encoded(_)));
        assert!(record.key_concepts.is_empty());
    }

    #[test]
    fn named_snippet_maps_are_kept_raw() {
        let record: ContentRecord =
            serde_json::from_str(r#"{"id": "x", "html_snippets": {"main": "<div></div>"}}"#)
                .unwrap();
        assert!(matches!(record.html_snippets, SnippetField::Other(_)));
    }

    #[test]
    fn presence_completeness() {
        let mut presence = LanePresence {
            title: true,
            description: true,
            content: true,
            key_concepts: false,
        };
        assert!(!presence.is_complete());
        presence.key_concepts = true;
        assert!(presence.is_complete());
    }
}
