mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use catalog_embed::config::CatalogConfig;

#[derive(Parser)]
#[command(
    name = "catalog-embed",
    version,
    about = "Multi-lane embeddings and semantic search for a content catalog"
)]
struct Cli {
    /// Config file (default: ~/.catalog-embed/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate missing lane embeddings for stored records
    Embed(cli::embed::EmbedArgs),
    /// Search records by semantic similarity
    Search(cli::search::SearchArgs),
    /// Import record JSON files from a directory
    Import {
        /// Directory containing one JSON file per record
        dir: PathBuf,
    },
    /// Change the vector dimension of the stored embeddings
    Resize {
        #[arg(long)]
        dimensions: usize,
    },
    /// Show database and embedding coverage
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CatalogConfig::load_from(path)?,
        None => CatalogConfig::load()?,
    };

    // Log to stderr so stdout stays clean for results and JSON.
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    config.validate()?;

    match cli.command {
        Command::Embed(args) => {
            let report = cli::embed::embed(config, args).await?;
            if report.has_failures() {
                std::process::exit(1);
            }
        }
        Command::Search(args) => {
            let output = cli::search::search(config, args).await?;
            println!("{output}");
        }
        Command::Import { dir } => {
            let report = cli::import::import(&config, &dir)?;
            if report.failed > 0 {
                std::process::exit(1);
            }
        }
        Command::Resize { dimensions } => {
            cli::resize::resize(&config, dimensions)?;
        }
        Command::Status => {
            cli::status::status(&config)?;
        }
    }

    Ok(())
}
