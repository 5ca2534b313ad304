//! Search facade: validation, embedding, retrieval and response shaping.

use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::{self, DocumentAggregate};
use crate::datastore::Datastore;
use crate::embedder::{self, Embedder};
use crate::error::{Result, SearchError};
use crate::vector_literal;
use crate::vector_store::{Collection, RawHit};

/// Incoming search parameters shared by both search paths.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    /// Natural-language query.
    pub query: String,
    /// Requested page size; clamped per path.
    #[serde(default)]
    pub top_k: Option<i64>,
    /// Exact-match document category.
    #[serde(default, alias = "ministry")]
    pub category: Option<String>,
}

impl SearchRequest {
    /// Convenience constructor.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Sets the requested page size.
    pub fn with_top_k(mut self, top_k: i64) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Sets the category filter.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// One document returned by chunk search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkResult {
    /// Source document URL.
    pub url: String,
    /// Council that held the meeting.
    pub council_name: String,
    /// ISO-8601 meeting date.
    pub date: Option<String>,
    /// Best-scoring chunk of the document.
    pub chunk_text: Option<String>,
    /// Mean similarity of the matched chunks.
    pub score: Option<f64>,
    /// Number of chunks that matched.
    pub match_count: usize,
}

impl From<DocumentAggregate> for ChunkResult {
    fn from(aggregate: DocumentAggregate) -> Self {
        Self {
            url: aggregate.document_url,
            council_name: aggregate.council_name,
            date: aggregate.date.map(iso_date),
            chunk_text: aggregate.best_text_span,
            score: aggregate.average_score,
            match_count: aggregate.match_count,
        }
    }
}

/// One document returned by summary search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResult {
    /// Source document URL.
    pub url: String,
    /// Council that held the meeting.
    pub council_name: String,
    /// ISO-8601 meeting date.
    pub date: Option<String>,
    /// Precomputed document summary.
    pub summary: String,
    /// Raw similarity of the summary.
    pub score: Option<f64>,
}

impl From<RawHit> for SummaryResult {
    fn from(hit: RawHit) -> Self {
        Self {
            url: hit.document_url,
            council_name: hit.council_name,
            date: hit.date.map(iso_date),
            summary: hit.text_span,
            score: hit.score,
        }
    }
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Stateless search service over injected embedding and datastore handles.
#[derive(Clone)]
pub struct SearchService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn Datastore>,
}

impl SearchService {
    /// Wires the service to its collaborators.
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn Datastore>) -> Self {
        Self { embedder, store }
    }

    /// Chunk search: over-fetch chunks, fold them per document, rank, page.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<ChunkResult>> {
        let query = validated_query(request)?;
        let limits = aggregate::resolve_chunk_limits(request.top_k);
        let start = Instant::now();
        let literal = self.embed_query(query).await?;
        let hits = self
            .neighbors(Collection::Chunks, &literal, request, limits.fetch_limit)
            .await?;
        let fetched = hits.len();
        let ranked = aggregate::rank(aggregate::aggregate_hits(hits), limits.top_k);
        tracing::info!(
            top_k = limits.top_k,
            fetch_limit = limits.fetch_limit,
            fetched,
            returned = ranked.len(),
            latency_ms = start.elapsed().as_secs_f64() * 1000.0,
            "chunk search"
        );
        Ok(ranked.into_iter().map(ChunkResult::from).collect())
    }

    /// Summary search: one row per document, no grouping.
    pub async fn summary_search(&self, request: &SearchRequest) -> Result<Vec<SummaryResult>> {
        let query = validated_query(request)?;
        let top_k = aggregate::resolve_summary_top_k(request.top_k);
        let start = Instant::now();
        let literal = self.embed_query(query).await?;
        let hits = self
            .neighbors(Collection::Summaries, &literal, request, top_k)
            .await?;
        tracing::info!(
            top_k,
            returned = hits.len(),
            latency_ms = start.elapsed().as_secs_f64() * 1000.0,
            "summary search"
        );
        Ok(hits.into_iter().map(SummaryResult::from).collect())
    }

    /// Runs the datastore liveness probe.
    pub async fn health(&self) -> Result<()> {
        self.store.ping().await.map_err(|err| {
            tracing::error!("health check failed: {err:#}");
            SearchError::Datastore(err)
        })
    }

    async fn embed_query(&self, query: &str) -> Result<String> {
        let provider = Arc::clone(&self.embedder);
        let text = query.to_string();
        let embedded =
            tokio::task::spawn_blocking(move || embedder::embed_one(provider.as_ref(), &text))
                .await
                .map_err(|err| anyhow!("embedding task join error: {err}"))
                .and_then(|result| result);
        let vector = embedded.map_err(|err| {
            tracing::error!(provider = self.embedder.name(), "embedding failed: {err:#}");
            SearchError::Embedding(err)
        })?;
        Ok(vector_literal::encode(&vector))
    }

    async fn neighbors(
        &self,
        collection: Collection,
        literal: &str,
        request: &SearchRequest,
        limit: usize,
    ) -> Result<Vec<RawHit>> {
        self.store
            .nearest_neighbors(collection, literal, request.category.as_deref(), limit)
            .await
            .map_err(|err| {
                tracing::error!(collection = collection.label(), "db query failed: {err:#}");
                SearchError::Datastore(err)
            })
    }
}

fn validated_query(request: &SearchRequest) -> Result<&str> {
    if request.query.trim().is_empty() {
        return Err(SearchError::InvalidQuery);
    }
    Ok(&request.query)
}
