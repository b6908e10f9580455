use anyhow::{Context, Result};

use catalog_embed::config::CatalogConfig;
use catalog_embed::db;
use catalog_embed::db::resize::resize_vector_columns;

/// Change the stored vector dimension.
pub fn resize(config: &CatalogConfig, dimensions: usize) -> Result<()> {
    let db_path = config.resolved_db_path();
    let mut conn = db::open_database(&db_path, dimensions).context("failed to open database")?;

    let report = resize_vector_columns(&mut conn, dimensions)?;
    if report.is_noop() {
        println!("Vector columns already hold {dimensions} dimensions; nothing to do.");
        return Ok(());
    }

    println!(
        "Resized vector columns from {} to {} dimensions.",
        report
            .previous
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unknown".into()),
        report.dimensions
    );
    if !report.views_recreated.is_empty() {
        println!("Recreated views: {}", report.views_recreated.join(", "));
    }
    if report.vectors_cleared > 0 {
        println!(
            "Cleared {} vector(s) of the old size; run `catalog-embed embed` to regenerate them.",
            report.vectors_cleared
        );
    }
    if config.embedding.dimensions != dimensions {
        println!(
            "Set embedding.dimensions = {dimensions} in your config before embedding or searching."
        );
    }
    Ok(())
}
