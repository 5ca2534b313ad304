//! Datastore seam and its Postgres implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio_postgres::{Client, NoTls, Row};

use crate::vector_store::{Collection, RawHit, StoreLayout};

/// Nearest-neighbor lookups over the embedded collections.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Returns up to `limit` rows of `collection` closest to `vector_literal`,
    /// restricted to `category` when given, ordered by distance ascending.
    async fn nearest_neighbors(
        &self,
        collection: Collection,
        vector_literal: &str,
        category: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RawHit>>;

    /// Liveness probe.
    async fn ping(&self) -> Result<()>;
}

/// Postgres + pgvector datastore.
///
/// Each call opens its own connection and transaction. The transaction is
/// committed on success and rolled back when dropped on any other path,
/// including cancellation of the request future.
pub struct PgDatastore {
    config: tokio_postgres::Config,
    chunk_sql: String,
    summary_sql: String,
}

impl PgDatastore {
    /// Parses the connection string and prepares the query text.
    pub fn new(database_url: &str, layout: &StoreLayout) -> Result<Self> {
        let config = database_url
            .parse::<tokio_postgres::Config>()
            .context("invalid DATABASE_URL")?;
        Ok(Self {
            config,
            chunk_sql: layout.similarity_sql(Collection::Chunks),
            summary_sql: layout.similarity_sql(Collection::Summaries),
        })
    }

    async fn connect(&self) -> Result<Client> {
        let (client, connection) = self
            .config
            .connect(NoTls)
            .await
            .context("failed to connect to Postgres")?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::error!("postgres connection error: {err}");
            }
        });
        Ok(client)
    }

    fn sql(&self, collection: Collection) -> &str {
        match collection {
            Collection::Chunks => &self.chunk_sql,
            Collection::Summaries => &self.summary_sql,
        }
    }
}

#[async_trait]
impl Datastore for PgDatastore {
    async fn nearest_neighbors(
        &self,
        collection: Collection,
        vector_literal: &str,
        category: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RawHit>> {
        let limit = i64::try_from(limit).context("row limit exceeds i64 range")?;
        let mut client = self.connect().await?;
        let transaction = client.transaction().await?;
        let rows = transaction
            .query(self.sql(collection), &[&vector_literal, &category, &limit])
            .await
            .with_context(|| format!("similarity query on {} failed", collection.label()))?;
        transaction.commit().await?;
        rows.iter().map(hit_from_row).collect()
    }

    async fn ping(&self) -> Result<()> {
        let mut client = self.connect().await?;
        let transaction = client.transaction().await?;
        transaction
            .execute("SELECT 1", &[])
            .await
            .context("health query failed")?;
        transaction.commit().await?;
        Ok(())
    }
}

fn hit_from_row(row: &Row) -> Result<RawHit> {
    Ok(RawHit {
        document_url: row.try_get("url").context("invalid url column")?,
        council_name: row
            .try_get("council_name")
            .context("invalid council_name column")?,
        date: row.try_get("date").context("invalid date column")?,
        text_span: row.try_get("text_span").context("invalid text column")?,
        score: row.try_get("score").context("invalid score column")?,
    })
}
