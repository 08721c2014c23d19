//! Catalog Search CLI Entry Point
//!
//! Subcommands:
//! - backfill: compute embeddings for catalog items that lack one
//! - search: run one query (or list the newest items when no query is given)
//! - verify: run a fixed set of queries and print the top results

use catalog_search::{
    EmbeddingProvider, EncoderConfig, ProviderConfig, SearchConfig, SearchService, SemanticSearch,
    ServiceConfig, DEFAULT_LIMIT, DEFAULT_THRESHOLD,
};
use catalog_search_cli::commands::{self, SearchOptions};
use catalog_search_cli::{Catalog, CliResult};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "catalog-search")]
#[command(about = "Semantic search tools for the campus marketplace catalog")]
#[command(version)]
struct Args {
    /// Encoder model name (overrides CATALOG_SEARCH_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Model cache directory (overrides CATALOG_SEARCH_MODEL_CACHE)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate embeddings for items that have none
    Backfill {
        /// Catalog JSON file, rewritten in place
        #[arg(long, short)]
        catalog: PathBuf,

        /// Regenerate every embedding, not just missing ones
        #[arg(long)]
        force: bool,
    },
    /// Search the catalog
    Search {
        #[arg(long, short)]
        catalog: PathBuf,

        /// Free-text query; omit to list the newest items
        #[arg(long, short)]
        query: Option<String>,

        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f32,

        /// Only list items in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Run the verification query set
    Verify {
        #[arg(long, short)]
        catalog: PathBuf,

        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f32,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_search=info,catalog_search_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(args: Args) -> CliResult<()> {
    let mut encoder_config = EncoderConfig::from_env();
    if let Some(model) = args.model {
        encoder_config.model = model;
    }
    if let Some(cache_dir) = args.cache_dir {
        encoder_config.cache_dir = cache_dir;
    }
    tracing::info!(
        "Encoder model {} (cache: {})",
        encoder_config.model,
        encoder_config.cache_dir.display()
    );

    let provider = Arc::new(EmbeddingProvider::fastembed(
        encoder_config,
        ProviderConfig::default(),
    ));

    match args.command {
        Command::Backfill { catalog, force } => {
            let report = commands::backfill(&catalog, &provider, force)?;
            println!(
                "Processed {} items: {} generated, {} skipped, {} stale, {} without text",
                report.processed, report.generated, report.skipped, report.stale, report.empty
            );
        }
        Command::Search {
            catalog,
            query,
            limit,
            threshold,
            category,
        } => {
            let service = service(provider, SearchConfig { limit, threshold })?;
            let catalog = Catalog::load(&catalog)?;
            let options = SearchOptions {
                query,
                limit,
                threshold,
                category,
            };
            let rows = commands::search(&service, &catalog, &options).await?;
            print!("{}", commands::render_rows(&rows));
        }
        Command::Verify { catalog, threshold } => {
            let service = service(
                provider,
                SearchConfig {
                    limit: commands::VERIFY_LIMIT,
                    threshold,
                },
            )?;
            let catalog = Catalog::load(&catalog)?;
            service.warm_up().await?;
            for (query, rows) in commands::verify(&service, &catalog, threshold).await? {
                println!("Query: '{}'", query);
                print!("{}", commands::render_rows(&rows));
            }
        }
    }

    Ok(())
}

fn service(provider: Arc<EmbeddingProvider>, config: SearchConfig) -> CliResult<SearchService> {
    let engine = SemanticSearch::new(provider, config)?;
    Ok(SearchService::new(Arc::new(engine), ServiceConfig::from_env()))
}
