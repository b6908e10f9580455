pub mod embed;
pub mod import;
pub mod resize;
pub mod search;
pub mod status;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;

use catalog_embed::config::CatalogConfig;
use catalog_embed::db;

/// Open the configured database and check that its stored dimension and
/// model agree with the embedding settings.
pub(crate) fn open_catalog(config: &CatalogConfig) -> Result<Connection> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path, config.embedding.dimensions)
        .context("failed to open database")?;
    db::verify_embedding_config(&conn, &config.embedding)?;
    Ok(conn)
}

/// Record progress on stderr; drawn only when stderr is a terminal.
pub(crate) fn progress_bar(total: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );
    Ok(pb)
}
