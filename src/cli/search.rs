use anyhow::{Context, Result};
use clap::Args;

use catalog_embed::catalog::format::{format_json, format_text};
use catalog_embed::catalog::search::{search as run_search, QueryEmbedder, SearchFilter, SearchMode};
use catalog_embed::catalog::types::{ComplexityLevel, Lane};
use catalog_embed::config::CatalogConfig;
use catalog_embed::embedding;

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free-text query
    pub query: String,
    /// Lane to rank by: content, title, description, key_concepts
    #[arg(long)]
    pub lane: Option<Lane>,
    /// Maximum number of results (default: search.default_limit)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Only records in this category
    #[arg(long)]
    pub category: Option<String>,
    /// Only records at this complexity: beginner, intermediate, advanced
    #[arg(long)]
    pub complexity: Option<ComplexityLevel>,
    /// Show key concepts, attributes, complexity and snippet counts
    #[arg(long)]
    pub detailed: bool,
    /// Rank by all lanes combined
    #[arg(long, conflicts_with = "lane")]
    pub multi_lane: bool,
    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run a search and return the rendered output.
pub async fn search(config: CatalogConfig, args: SearchArgs) -> Result<String> {
    tokio::task::spawn_blocking(move || run(&config, &args)).await?
}

fn run(config: &CatalogConfig, args: &SearchArgs) -> Result<String> {
    let mode = if args.multi_lane {
        SearchMode::MultiLane
    } else {
        let lane = match args.lane {
            Some(lane) => lane,
            None => config
                .search
                .default_lane
                .parse()
                .map_err(anyhow::Error::msg)?,
        };
        SearchMode::Lane(lane)
    };
    let limit = args.limit.unwrap_or(config.search.default_limit);
    let filter = SearchFilter {
        category: args.category.clone(),
        complexity: args.complexity,
    };

    let provider = embedding::create_provider(&config.embedding)
        .context("failed to create embedding provider")?;
    let conn = super::open_catalog(config)?;

    let embedder = QueryEmbedder::new(provider.as_ref()).with_max_chars(config.embedding.max_chars);
    let results = run_search(&conn, &embedder, &args.query, mode, limit, &filter)
        .context("search failed")?;

    if args.json {
        Ok(format_json(&results)?)
    } else {
        Ok(format_text(&results, args.detailed))
    }
}
