use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use minutes_search::config::{DatastoreConfig, EmbeddingConfig, LogConfig};
use minutes_search::{api, build_embedder, PgDatastore, SearchService};
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(
    name = "minutes-api",
    about = "HTTP API for semantic search over archived council meeting minutes"
)]
struct ApiCli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "MINUTES_BIND", default_value = "127.0.0.1:8000")]
    bind: String,

    #[command(flatten)]
    datastore: DatastoreConfig,

    #[command(flatten)]
    embedding: EmbeddingConfig,

    #[command(flatten)]
    log: LogConfig,
}

fn main() -> Result<()> {
    let cli = ApiCli::parse();
    cli.log.init()?;
    let addr: SocketAddr = cli
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", cli.bind))?;

    // The blocking HTTP client owns a runtime thread of its own; it must be
    // created and dropped outside of tokio.
    let embedder = build_embedder(&cli.embedding);
    let layout = cli.datastore.layout()?;
    let store = Arc::new(PgDatastore::new(&cli.datastore.database_url, &layout)?);
    let service = SearchService::new(Arc::clone(&embedder), store);

    let runtime = Runtime::new().context("failed to start tokio runtime")?;
    let served = runtime.block_on(serve(addr, service));
    drop(runtime);
    drop(embedder);
    served
}

async fn serve(addr: SocketAddr, service: SearchService) -> Result<()> {
    let app = api::router(service);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("minutes-api listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {err}");
        return;
    }
    tracing::info!("shutdown requested");
}
