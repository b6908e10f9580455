//! Rendering of ranked results as terminal text or JSON.

use crate::catalog::search::SearchResult;

pub const NO_MATCHES: &str = "No matching examples found.";

/// Human-readable listing. Basic fields are always shown; `detailed` adds key
/// concepts, htmx attributes, complexity and snippet counts when present.
pub fn format_text(results: &[SearchResult], detailed: bool) -> String {
    if results.is_empty() {
        return NO_MATCHES.to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let mut lines = vec![
                format!("#{}: {} (similarity: {:.2})", i + 1, result.title, result.similarity),
                format!("ID: {}", result.id),
                format!("Category: {}", result.category),
                format!("URL: {}", result.url),
                format!("Description: {}", result.description),
            ];

            if detailed {
                if !result.key_concepts.is_empty() {
                    lines.push(format!("Key Concepts: {}", result.key_concepts.join(", ")));
                }
                if !result.htmx_attributes.is_empty() {
                    lines.push(format!("HTMX Attributes: {}", result.htmx_attributes.join(", ")));
                }
                if let Some(level) = result.complexity_level {
                    lines.push(format!("Complexity: {level}"));
                }
                if !result.html_snippets.is_empty() {
                    lines.push(format!(
                        "HTML Snippets: {} snippet(s) available",
                        result.html_snippets.len()
                    ));
                }
                if !result.javascript_snippets.is_empty() {
                    lines.push(format!(
                        "JavaScript Snippets: {} snippet(s) available",
                        result.javascript_snippets.len()
                    ));
                }
            }

            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Pretty-printed JSON array. An empty list renders as `[]`.
pub fn format_json(results: &[SearchResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(results)
}
