//! Guideline ingestion CLI
//!
//! Usage:
//!   pharmaguard-ingest run [<docs-dir>] [--reset]
//!   pharmaguard-ingest stats

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use pharmaguard_rag::config::Config;
use pharmaguard_rag::ingest::ingest_directory;
use pharmaguard_rag::llm::embeddings::HttpEmbedder;
use pharmaguard_rag::search::vector::VectorStore;

#[derive(Parser)]
#[command(name = "pharmaguard-ingest")]
#[command(version)]
#[command(about = "Load CPIC guideline PDFs into the vector collection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Collection name (overrides PHARMAGUARD_COLLECTION)
    #[arg(short, long)]
    collection: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk, filter, embed and store every gene-named PDF
    Run {
        /// Directory of per-gene PDFs (defaults to PHARMAGUARD_DOCS_DIR)
        docs_dir: Option<PathBuf>,

        /// Empty the collection before ingesting
        #[arg(long)]
        reset: bool,
    },

    /// Print chunk counts per gene/drug
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(collection) = cli.collection {
        config.collection = collection;
    }

    let store = VectorStore::open_or_create(&config.vector_dir(), &config.collection)?;

    match cli.command {
        Commands::Run { docs_dir, reset } => {
            let docs_dir = docs_dir.unwrap_or_else(|| config.docs_dir.clone());
            if reset {
                tracing::info!("Clearing collection {}", store.name());
                store.clear()?;
            }

            let client = reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(120))
                .build()?;
            let embedder = HttpEmbedder::new(client, config.llm.clone());

            let report = ingest_directory(&docs_dir, &store, &embedder, config.chunking).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            print_stats(&store);
        }
        Commands::Stats => print_stats(&store),
    }

    Ok(())
}

fn print_stats(store: &VectorStore) {
    println!("Collection {}: {} chunks", store.name(), store.count());
    for (key, count) in store.counts_by_gene_drug() {
        println!("  {key:<24} {count}");
    }
}
