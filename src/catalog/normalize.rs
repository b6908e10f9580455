//! Record → lane text.
//!
//! [`ContentNormalizer`] projects a [`ContentRecord`] into the texts that get
//! embedded, one per [`Lane`]. Snippet fields are decoded here and nowhere
//! else, whether they arrive as native arrays or as JSON serialized into a
//! string. Every lane text is capped at a character limit; the tail beyond it
//! is dropped.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::catalog::types::{ContentRecord, Lane, Snippet, SnippetField};
use crate::error::{CatalogError, Result};

/// Default character cap for lane and query texts.
pub const DEFAULT_MAX_CHARS: usize = 25_000;

/// How the `content` lane is composed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentLayout {
    /// Headed sections in fixed order: HTML code, HTML descriptions,
    /// JavaScript code, JavaScript descriptions, key concepts, htmx
    /// attributes, demo explanation.
    #[default]
    Sections,
    /// Title, description, key concepts, each named snippet, htmx
    /// attributes, demo explanation, use cases.
    Extended,
}

impl std::str::FromStr for ContentLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sections" => Ok(Self::Sections),
            "extended" => Ok(Self::Extended),
            _ => Err(format!("unknown content layout: {s}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContentNormalizer {
    layout: ContentLayout,
    max_chars: usize,
}

impl Default for ContentNormalizer {
    fn default() -> Self {
        Self::new(ContentLayout::default(), DEFAULT_MAX_CHARS)
    }
}

impl ContentNormalizer {
    pub fn new(layout: ContentLayout, max_chars: usize) -> Self {
        Self { layout, max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Text for every lane whose source is non-empty. Empty lanes are left
    /// out rather than embedded as empty strings.
    ///
    /// Fails with a Validation error when a snippet field cannot be decoded.
    pub fn lane_texts(&self, record: &ContentRecord) -> Result<BTreeMap<Lane, String>> {
        let html = decode_snippets(&record.html_snippets)?;
        let js = decode_snippets(&record.javascript_snippets)?;

        let content = match self.layout {
            ContentLayout::Sections => sections_content(record, &html, &js),
            ContentLayout::Extended => extended_content(record, &html, &js),
        };

        let mut lanes = BTreeMap::new();
        for (lane, text) in [
            (Lane::Title, record.title.clone()),
            (Lane::Description, record.description.clone()),
            (Lane::Content, content),
            (Lane::KeyConcepts, record.key_concepts.join(", ")),
        ] {
            if text.trim().is_empty() {
                continue;
            }
            lanes.insert(lane, truncate_chars(&text, self.max_chars).to_string());
        }
        Ok(lanes)
    }
}

/// The first `max_chars` characters of `text` (not bytes), or all of it.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Decode a snippet field into snippets.
///
/// Accepts arrays of snippet objects or bare code strings, objects mapping a
/// snippet name to its code (or to a snippet object), a single snippet
/// object, and any of those serialized into a JSON string.
pub fn decode_snippets(field: &SnippetField) -> Result<Vec<Snippet>> {
    match field {
        SnippetField::Native(snippets) => Ok(snippets.clone()),
        SnippetField::Encoded(text) => {
            if text.trim().is_empty() {
                return Ok(Vec::new());
            }
            let value: Value = serde_json::from_str(text).map_err(|e| {
                CatalogError::Validation(format!("undecodable snippet field: {e}"))
            })?;
            snippets_from_value(&value)
        }
        SnippetField::Other(value) => snippets_from_value(value),
    }
}

fn snippets_from_value(value: &Value) -> Result<Vec<Snippet>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(code) => Ok(vec![Snippet {
            code: code.clone(),
            ..Snippet::default()
        }]),
        Value::Array(items) => {
            let mut snippets = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Null => {}
                    Value::String(code) => snippets.push(Snippet {
                        code: code.clone(),
                        ..Snippet::default()
                    }),
                    Value::Object(_) => snippets.push(snippet_from_object(item, None)),
                    other => {
                        return Err(CatalogError::Validation(format!(
                            "unexpected snippet entry: {other}"
                        )))
                    }
                }
            }
            Ok(snippets)
        }
        Value::Object(map) if map.contains_key("code") => {
            Ok(vec![snippet_from_object(value, None)])
        }
        Value::Object(map) => Ok(map
            .iter()
            .map(|(name, entry)| match entry {
                Value::Object(_) => snippet_from_object(entry, Some(name)),
                Value::String(code) => Snippet {
                    name: Some(name.clone()),
                    code: code.clone(),
                    description: None,
                },
                other => Snippet {
                    name: Some(name.clone()),
                    code: other.to_string(),
                    description: None,
                },
            })
            .collect()),
        other => Err(CatalogError::Validation(format!(
            "unexpected snippet field: {other}"
        ))),
    }
}

fn snippet_from_object(value: &Value, name: Option<&String>) -> Snippet {
    let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_owned);
    Snippet {
        name: text("name").or_else(|| name.cloned()),
        code: text("code").unwrap_or_default(),
        description: text("description").or_else(|| text("explanation")),
    }
}

fn sections_content(record: &ContentRecord, html: &[Snippet], js: &[Snippet]) -> String {
    let codes = |snippets: &[Snippet]| {
        snippets
            .iter()
            .map(|s| s.code.as_str())
            .filter(|c| !c.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    };
    let descriptions = |snippets: &[Snippet]| {
        snippets
            .iter()
            .filter_map(|s| s.description.as_deref())
            .filter(|d| !d.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    };

    let sections = [
        ("HTML Code", codes(html)),
        ("HTML Descriptions", descriptions(html)),
        ("JavaScript Code", codes(js)),
        ("JavaScript Descriptions", descriptions(js)),
        ("Key Concepts", record.key_concepts.join(", ")),
        ("HTMX Attributes", record.htmx_attributes.join(", ")),
        ("Demo Explanation", record.demo_explanation.clone()),
    ];

    sections
        .iter()
        .filter(|(_, body)| !body.trim().is_empty())
        .map(|(header, body)| format!("{header}:\n{body}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn extended_content(record: &ContentRecord, html: &[Snippet], js: &[Snippet]) -> String {
    let mut parts = Vec::new();
    let mut push = |label: &str, body: &str| {
        if !body.trim().is_empty() {
            parts.push(format!("{label}: {body}"));
        }
    };

    push("Title", &record.title);
    push("Description", &record.description);
    push("Key Concepts", &record.key_concepts.join(", "));
    for (kind, snippets) in [("HTML Snippet", html), ("JavaScript Snippet", js)] {
        for (i, snippet) in snippets.iter().enumerate() {
            let name = snippet.name.clone().unwrap_or_else(|| (i + 1).to_string());
            let body = match snippet.description.as_deref() {
                Some(desc) if !desc.trim().is_empty() => format!("{}\n{desc}", snippet.code),
                _ => snippet.code.clone(),
            };
            push(&format!("{kind} - {name}"), &body);
        }
    }
    push("HTMX Attributes", &record.htmx_attributes.join(", "));
    push("Demo Explanation", &record.demo_explanation);
    push("Use Cases", &record.use_cases.join(", "));

    parts.join("\n\n")
}
