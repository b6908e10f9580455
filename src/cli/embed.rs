//! CLI `embed` command: runs the embedding pipeline over stored records.

use anyhow::{bail, Context, Result};
use clap::Args;

use catalog_embed::catalog::normalize::{ContentLayout, ContentNormalizer};
use catalog_embed::catalog::pipeline::{EmbeddingPipeline, PipelineOptions, PipelineReport};
use catalog_embed::catalog::records::fetch_records;
use catalog_embed::config::CatalogConfig;
use catalog_embed::embedding;

#[derive(Debug, Args)]
pub struct EmbedArgs {
    /// Process at most this many records
    #[arg(long)]
    pub limit: Option<usize>,
    /// SQL predicate over content_records columns, e.g. "category = 'forms'"
    #[arg(long)]
    pub filter: Option<String>,
    /// Regenerate lanes that already have vectors
    #[arg(long)]
    pub force_update: bool,
    /// Records per transaction (default: pipeline.batch_size)
    #[arg(long)]
    pub batch_size: Option<usize>,
}

/// Embed matching records. The provider and database are blocking, so the
/// whole run happens on the blocking pool.
pub async fn embed(config: CatalogConfig, args: EmbedArgs) -> Result<PipelineReport> {
    tokio::task::spawn_blocking(move || run(&config, &args)).await?
}

fn run(config: &CatalogConfig, args: &EmbedArgs) -> Result<PipelineReport> {
    let batch_size = args.batch_size.unwrap_or(config.pipeline.batch_size);
    if batch_size == 0 {
        bail!("--batch-size must be greater than zero");
    }
    let layout: ContentLayout = config
        .pipeline
        .content_layout
        .parse()
        .map_err(anyhow::Error::msg)?;

    let provider = embedding::create_provider(&config.embedding)
        .context("failed to create embedding provider")?;
    let mut conn = super::open_catalog(config)?;

    let records = fetch_records(&conn, args.limit, args.filter.as_deref())
        .context("failed to fetch records")?;
    if records.is_empty() {
        println!("No records to embed.");
        return Ok(PipelineReport::default());
    }

    println!(
        "Embedding {} record(s) with model '{}'...",
        records.len(),
        provider.model()
    );

    let options = PipelineOptions {
        force_refresh: args.force_update,
        batch_size,
        pacing: config.embedding.pacing(),
    };
    let normalizer = ContentNormalizer::new(layout, config.embedding.max_chars);
    let pb = super::progress_bar(records.len())?;

    let report = EmbeddingPipeline::new(&mut conn, provider.as_ref(), normalizer, options)
        .with_progress(pb.clone())
        .run(&records)?;
    pb.finish_and_clear();

    println!(
        "Done: {} succeeded ({} already embedded), {} failed, {} batch(es) committed, \
         {} embedding call(s).",
        report.succeeded,
        report.skipped,
        report.failed,
        report.batches_committed,
        report.embedding_calls
    );
    if report.lanes_failed > 0 {
        println!(
            "{} lane(s) failed and will be retried on the next run.",
            report.lanes_failed
        );
    }
    Ok(report)
}
