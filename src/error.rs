//! Error taxonomy surfaced by the search facade.

use thiserror::Error;

/// Failure modes of a single search request.
///
/// Embedding and datastore failures are kept apart so operators can tell an
/// unreachable embedding provider from an unreachable database.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query was empty or whitespace-only.
    #[error("query is required")]
    InvalidQuery,

    /// The embedding provider could not produce a vector for the query.
    #[error("embedding failed: {0:#}")]
    Embedding(#[source] anyhow::Error),

    /// The similarity query failed or returned rows we could not decode.
    #[error("db query failed: {0:#}")]
    Datastore(#[source] anyhow::Error),
}

impl SearchError {
    /// True when the caller sent bad input rather than the server failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidQuery)
    }
}

/// Result alias used by the facade.
pub type Result<T, E = SearchError> = std::result::Result<T, E>;
