//! Embedding providers and the startup factory that picks one.

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};

pub mod local;
pub mod openai;

pub use local::LocalEmbedder;
pub use openai::OpenAiEmbedder;

/// Maps a batch of texts to fixed-length vectors, preserving order and length.
///
/// Implementations are blocking; async callers should run them on
/// `tokio::task::spawn_blocking`.
pub trait Embedder: Send + Sync {
    /// Short provider label used in logs.
    fn name(&self) -> &str;

    /// Vector length when known ahead of the first call.
    fn dimensions(&self) -> Option<usize>;

    /// Embeds every input, returning one vector per input in the same order.
    fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>>;
}

/// Embeds a single text and returns its vector.
pub fn embed_one(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    embedder
        .embed(&[text])?
        .pop()
        .ok_or_else(|| anyhow!("{} returned no embedding", embedder.name()))
}

/// Builds the configured provider once at startup.
///
/// A remote provider that cannot be constructed (missing key, bad header,
/// client build failure) is replaced by [`LocalEmbedder`] with a warning.
pub fn build_embedder(config: &EmbeddingConfig) -> Arc<dyn Embedder> {
    match config.provider {
        EmbeddingProviderKind::Openai => match OpenAiEmbedder::from_config(config) {
            Ok(embedder) => {
                tracing::info!(model = %config.model, "using OpenAI embeddings");
                Arc::new(embedder)
            }
            Err(err) => {
                tracing::warn!(
                    dimensions = config.local_dimensions,
                    "falling back to local embeddings: {err:#}"
                );
                Arc::new(LocalEmbedder::new(config.local_dimensions))
            }
        },
        EmbeddingProviderKind::Local => {
            tracing::info!(
                dimensions = config.local_dimensions,
                "using local hash embeddings"
            );
            Arc::new(LocalEmbedder::new(config.local_dimensions))
        }
    }
}
