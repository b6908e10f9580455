use anyhow::{Context, Result};
use std::path::Path;

use catalog_embed::catalog::import::{import_dir, ImportReport};
use catalog_embed::config::CatalogConfig;
use catalog_embed::db;

/// Import every `*.json` record file in `dir`.
pub fn import(config: &CatalogConfig, dir: &Path) -> Result<ImportReport> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path, config.embedding.dimensions)
        .context("failed to open database")?;

    println!("Importing records from {}...", dir.display());
    let report = import_dir(&conn, dir)?;

    let total: i64 = conn.query_row("SELECT COUNT(*) FROM content_records", [], |r| r.get(0))?;
    println!(
        "Imported {} of {} file(s) ({} failed). Database now holds {total} record(s).",
        report.imported, report.files, report.failed
    );
    Ok(report)
}
