//! Command-line and environment configuration shared by the binaries.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::vector_store::{StoreLayout, TableName};

/// Which embedding strategy to construct at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EmbeddingProviderKind {
    /// OpenAI-compatible `/embeddings` endpoint.
    Openai,
    /// Deterministic hash-seeded vectors; no network access.
    Local,
}

/// Embedding provider settings.
#[derive(Args, Debug, Clone)]
pub struct EmbeddingConfig {
    /// Embedding strategy (openai or local).
    #[arg(
        long = "embedding-provider",
        env = "EMBEDDING_PROVIDER",
        value_enum,
        ignore_case = true,
        default_value = "openai"
    )]
    pub provider: EmbeddingProviderKind,

    /// Embedding model identifier.
    #[arg(
        long = "embedding-model",
        env = "EMBEDDING_MODEL",
        default_value = "text-embedding-3-small"
    )]
    pub model: String,

    /// OpenAI API key; when missing the local fallback is used.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL for OpenAI-compatible endpoints.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// Optional dimension override sent to the OpenAI API.
    #[arg(long, env = "OPENAI_DIMENSIONS")]
    pub openai_dimensions: Option<usize>,

    /// Vector length produced by the local fallback.
    #[arg(long, env = "EMBEDDING_DIMENSIONS", default_value_t = 1536)]
    pub local_dimensions: usize,

    /// Seconds before embedding requests time out.
    #[arg(long, env = "EMBEDDING_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Max inputs per embedding request.
    #[arg(long, env = "EMBEDDING_BATCH", default_value_t = 32)]
    pub batch_size: usize,
}

impl EmbeddingConfig {
    /// Request timeout, never shorter than one second.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Openai,
            model: "text-embedding-3-small".to_string(),
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_dimensions: None,
            local_dimensions: 1536,
            timeout_secs: 30,
            batch_size: 32,
        }
    }
}

/// Datastore connection and table layout.
#[derive(Args, Debug, Clone)]
pub struct DatastoreConfig {
    /// Postgres connection string (postgres://...).
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Schema holding the minutes tables.
    #[arg(long, env = "MINUTES_DB_SCHEMA", default_value = "public")]
    pub schema: String,

    /// Table of embedded document chunks.
    #[arg(long, env = "MINUTES_CHUNK_TABLE", default_value = "meeting_chunks")]
    pub chunk_table: String,

    /// Table of embedded per-document summaries.
    #[arg(long, env = "MINUTES_SUMMARY_TABLE", default_value = "chunks_summary")]
    pub summary_table: String,

    /// Table of document metadata (url, council, date, category).
    #[arg(long, env = "MINUTES_METADATA_TABLE", default_value = "meeting_metadata")]
    pub metadata_table: String,

    /// Metadata column matched by the category filter.
    #[arg(long, env = "MINUTES_CATEGORY_COLUMN", default_value = "ministry")]
    pub category_column: String,
}

impl DatastoreConfig {
    /// Validates identifiers and builds the table layout used by the query builder.
    pub fn layout(&self) -> Result<StoreLayout> {
        let chunks = TableName::new(&self.schema, &self.chunk_table)?;
        let summaries = TableName::new(&self.schema, &self.summary_table)?;
        let metadata = TableName::new(&self.schema, &self.metadata_table)?;
        StoreLayout::new(chunks, summaries, metadata, &self.category_column)
            .context("invalid datastore layout")
    }
}

/// Logging settings.
#[derive(Args, Debug, Clone)]
pub struct LogConfig {
    /// Default log filter when RUST_LOG is unset (e.g. info, debug).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl LogConfig {
    /// Installs the global `tracing` subscriber.
    pub fn init(&self) -> Result<()> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(self.log_level.to_lowercase())
                .with_context(|| format!("invalid log level {:?}", self.log_level))?,
        };
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .map_err(|err| anyhow::anyhow!("failed to install log subscriber: {err}"))
    }
}
