#![warn(missing_docs)]
//! Semantic search over archived government meeting minutes.
//!
//! A query is embedded, matched against pgvector-indexed chunks or summaries,
//! and (for chunks) folded into one ranked result per source document.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod datastore;
pub mod embedder;
pub mod error;
pub mod service;
pub mod vector_literal;
pub mod vector_store;

pub use aggregate::{aggregate_hits, rank, DocumentAggregate};
pub use datastore::{Datastore, PgDatastore};
pub use embedder::{build_embedder, Embedder, LocalEmbedder, OpenAiEmbedder};
pub use error::SearchError;
pub use service::{ChunkResult, SearchRequest, SearchService, SummaryResult};
pub use vector_store::{Collection, RawHit, StoreLayout, TableName};
