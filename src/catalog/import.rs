//! Load catalog entries from a directory of JSON files.
//!
//! Each `*.json` file holds one record. Missing fields are defaulted with a
//! warning and a missing id falls back to the file stem. A file that cannot be
//! read or parsed is counted and skipped.

use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::catalog::records::upsert_record;
use crate::catalog::types::ContentRecord;
use crate::error::{CatalogError, Result};

const EXPECTED_FIELDS: [&str; 12] = [
    "id",
    "title",
    "category",
    "url",
    "description",
    "html_snippets",
    "javascript_snippets",
    "key_concepts",
    "htmx_attributes",
    "demo_explanation",
    "complexity_level",
    "use_cases",
];

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct ImportReport {
    pub files: usize,
    pub imported: usize,
    pub failed: usize,
}

/// JSON files directly inside `dir`, sorted by name.
pub fn json_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// Parse one record file.
pub fn read_record(path: &Path) -> Result<ContentRecord> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CatalogError::Validation(format!("failed to read {}: {e}", path.display()))
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|e| {
        CatalogError::Validation(format!("{} is not valid JSON: {e}", path.display()))
    })?;
    let Value::Object(mut fields) = value else {
        return Err(CatalogError::Validation(format!(
            "{} does not contain a JSON object",
            path.display()
        )));
    };

    for field in EXPECTED_FIELDS {
        if !fields.contains_key(field) {
            tracing::warn!(file = %path.display(), field, "missing field, using default");
        }
    }

    // An empty or null complexity means "unset".
    if matches!(fields.get("complexity_level"), Some(Value::Null))
        || fields
            .get("complexity_level")
            .and_then(Value::as_str)
            .is_some_and(|s| s.trim().is_empty())
    {
        fields.remove("complexity_level");
    }

    let mut record: ContentRecord = serde_json::from_value(Value::Object(fields)).map_err(|e| {
        CatalogError::Validation(format!("{} is not a valid record: {e}", path.display()))
    })?;

    if record.id.trim().is_empty() {
        record.id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    if record.id.is_empty() {
        return Err(CatalogError::Validation(format!(
            "{} has no id",
            path.display()
        )));
    }
    Ok(record)
}

/// Upsert every record file in `dir`. Parse and database failures are logged
/// and counted per file; only an unreadable directory is returned as an
/// error.
pub fn import_dir(conn: &Connection, dir: &Path) -> Result<ImportReport> {
    let files = json_files(dir).map_err(|e| {
        CatalogError::Configuration(format!("cannot read import directory {}: {e}", dir.display()))
    })?;
    let mut report = ImportReport {
        files: files.len(),
        ..ImportReport::default()
    };

    for path in &files {
        match read_record(path).and_then(|record| {
            upsert_record(conn, &record)?;
            Ok(record.id)
        }) {
            Ok(id) => {
                tracing::debug!(%id, file = %path.display(), "imported");
                report.imported += 1;
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "import failed");
                report.failed += 1;
            }
        }
    }

    tracing::info!(imported = report.imported, failed = report.failed, "import finished");
    Ok(report)
}
