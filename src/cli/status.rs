use anyhow::{Context, Result};

use catalog_embed::config::CatalogConfig;
use catalog_embed::db;

/// Print database health and vector coverage.
pub fn status(config: &CatalogConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path, config.embedding.dimensions)
        .context("failed to open database")?;
    let status = db::database_status(&conn)?;

    println!("Catalog Status");
    println!("{}", "=".repeat(40));
    println!("  Database:            {}", db_path.display());
    println!("  Schema version:      {}", status.schema_version);
    println!("  sqlite-vec:          {}", status.sqlite_vec_version);
    println!(
        "  Embedding model:     {}",
        status.embedding_model.as_deref().unwrap_or("(none yet)")
    );
    match status.embedding_dimensions {
        Some(dims) if dims != config.embedding.dimensions => println!(
            "  Dimensions:          {dims} (config says {}; run `resize`)",
            config.embedding.dimensions
        ),
        Some(dims) => println!("  Dimensions:          {dims}"),
        None => println!("  Dimensions:          unknown"),
    }
    println!();

    println!("  Records:             {}", status.record_count);
    println!("  With embeddings:     {}", status.embedded_records);
    println!();

    println!("Vectors by lane:");
    for (lane, count) in [
        ("title", status.title_vectors),
        ("description", status.description_vectors),
        ("content", status.content_vectors),
        ("key_concepts", status.key_concepts_vectors),
    ] {
        println!("  {:<14} {}", lane, count);
    }

    Ok(())
}
