//! PDF RAG server binary
//!
//! Run with: cargo run -p pdf-rag --bin pdf-rag-server -- --host 0.0.0.0 --port 8000

use clap::Parser;
use pdf_rag::{config::RagConfig, AppState, RagServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "pdf-rag-server", version, about = "Query PDF documents with Retrieval-Augmented Generation")]
struct Args {
    /// Optional TOML configuration file
    #[arg(long, env = "RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Folder scanned for PDFs
    #[arg(long)]
    pdfs_dir: Option<PathBuf>,

    /// Folder for documents.json and embeddings.json
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Start serving without the initial ingestion pass
    #[arg(long)]
    skip_ingest: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_rag=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = RagConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = args.pdfs_dir {
        config.storage.pdfs_dir = dir;
    }
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = dir;
    }
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.gemini.embedding_model);
    tracing::info!("  - LLM model: {}", config.gemini.llm_model);
    tracing::info!(
        "  - Chunk size: {} (overlap {})",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - PDFs folder: {}", config.storage.pdfs_dir.display());

    let state = AppState::new(config).await?;

    if !state.check_providers().await {
        tracing::warn!("Gemini is not reachable; queries will fall back to keyword heuristics");
    }

    if args.skip_ingest {
        tracing::info!("Skipping initial PDF ingestion");
    } else {
        let report = state.ingestor().process_pdfs_folder().await?;
        tracing::info!(
            "Initial ingestion: {} new, {} already indexed, {} failed",
            report.processed,
            report.skipped,
            report.failed
        );
    }

    state.set_ready(true);
    let stats = state.store().stats();
    tracing::info!(
        "Ready with {} documents ({} chunks)",
        stats.documents,
        stats.chunks
    );

    let server = RagServer::new(state);

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/info", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
