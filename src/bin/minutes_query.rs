use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use minutes_search::config::{DatastoreConfig, EmbeddingConfig, LogConfig};
use minutes_search::{build_embedder, PgDatastore, SearchRequest, SearchService};
use tokio::runtime::Runtime;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Chunk search grouped per document.
    Chunks,
    /// Precomputed summary search.
    Summaries,
}

#[derive(Parser, Debug)]
#[command(
    name = "minutes-query",
    about = "Run a single search against the minutes store and print JSON results"
)]
struct QueryCli {
    /// Natural-language query.
    #[arg(long)]
    query: String,

    /// Number of documents to return.
    #[arg(long, allow_negative_numbers = true)]
    top_k: Option<i64>,

    /// Restrict results to one category (e.g. a ministry).
    #[arg(long)]
    category: Option<String>,

    /// Which collection to search.
    #[arg(long, value_enum, default_value = "chunks")]
    mode: Mode,

    #[command(flatten)]
    datastore: DatastoreConfig,

    #[command(flatten)]
    embedding: EmbeddingConfig,

    #[command(flatten)]
    log: LogConfig,
}

fn main() -> Result<()> {
    let cli = QueryCli::parse();
    cli.log.init()?;
    let embedder = build_embedder(&cli.embedding);
    let layout = cli.datastore.layout()?;
    let store = Arc::new(PgDatastore::new(&cli.datastore.database_url, &layout)?);
    let service = SearchService::new(embedder, store);
    let mode = cli.mode;
    let request = SearchRequest {
        query: cli.query,
        top_k: cli.top_k,
        category: cli.category,
    };

    let runtime = Runtime::new().context("failed to start tokio runtime")?;
    let rendered = runtime.block_on(async {
        match mode {
            Mode::Chunks => serde_json::to_string_pretty(&service.search(&request).await?),
            Mode::Summaries => {
                serde_json::to_string_pretty(&service.summary_search(&request).await?)
            }
        }
        .context("failed to render results")
    })?;
    println!("{rendered}");
    Ok(())
}
