use clap::Parser;
use epicsum_api::RestApi;
use epicsum_core::RetrieverConfig;
use epicsum_storage::{MediaStore, StoreConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Media lookup service: free-text descriptions to image and video links
#[derive(Parser, Debug)]
#[command(name = "epicsum")]
#[command(about = "Resolve free-text descriptions to media links", long_about = None)]
struct Args {
    /// Catalog JSON array of media records
    #[arg(long, env = "EPICSUM_CATALOG", default_value = "unified_media_database.json")]
    catalog: PathBuf,

    /// Embedding table (.npy or raw f32); enables semantic retrieval
    #[arg(long, env = "EPICSUM_EMBEDDINGS", requires = "metadata")]
    embeddings: Option<PathBuf>,

    /// Embedding metadata JSON written alongside the table
    #[arg(long, env = "EPICSUM_METADATA", requires = "embeddings")]
    metadata: Option<PathBuf>,

    /// Bind address
    #[arg(long, env = "EPICSUM_HOST", default_value = "0.0.0.0")]
    host: String,

    /// HTTP API port
    #[arg(short, long, env = "EPICSUM_PORT", default_value_t = 8082)]
    port: u16,

    /// Log level, overridden by RUST_LOG
    #[arg(long, env = "EPICSUM_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Maximum ranked results per query
    #[arg(long, env = "EPICSUM_RESULT_LIMIT", default_value_t = epicsum_core::retriever::DEFAULT_RESULT_LIMIT)]
    limit: usize,

    /// Semantic over-fetch factor relative to the partition size
    #[arg(long, env = "EPICSUM_OVERFETCH", default_value_t = epicsum_core::retriever::DEFAULT_OVERFETCH)]
    overfetch: usize,

    /// HTTP worker threads (defaults to the number of CPUs)
    #[arg(long, env = "EPICSUM_WORKERS")]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if args.limit == 0 {
        anyhow::bail!("--limit must be at least 1");
    }

    info!("Starting epicsum v{}", env!("CARGO_PKG_VERSION"));
    info!("Catalog: {:?}", args.catalog);

    let config = StoreConfig {
        catalog_path: args.catalog.clone(),
        embeddings_path: args.embeddings.clone(),
        metadata_path: args.metadata.clone(),
        retriever: RetrieverConfig {
            limit: args.limit,
            overfetch: args.overfetch.max(1),
        },
    };

    // model loading and table parsing block
    let store = tokio::task::spawn_blocking(move || MediaStore::open(&config)).await??;
    let store = Arc::new(store);
    info!(
        "Store ready: {} items, {} retrieval",
        store.stats().total_items,
        store.status().strategy
    );

    let host = args.host.clone();
    let port = args.port;
    let workers = args.workers;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on {}:{}", host, port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async { RestApi::start(store, &host, port, workers).await })
    });

    info!("HTTP API: http://localhost:{}/", args.port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        joined = tokio::task::spawn_blocking(move || http_handle.join()) => {
            match joined {
                Ok(Ok(Ok(()))) => info!("HTTP server stopped"),
                Ok(Ok(Err(e))) => return Err(anyhow::anyhow!("HTTP server error: {}", e)),
                _ => return Err(anyhow::anyhow!("HTTP server thread panicked")),
            }
        }
    }

    info!("Shutting down...");
    Ok(())
}
