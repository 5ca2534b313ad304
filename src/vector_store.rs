//! pgvector table layout and similarity query construction.

use anyhow::Result;
use chrono::NaiveDate;

/// Fully-qualified Postgres table name (schema + table).
#[derive(Debug, Clone)]
pub struct TableName {
    schema: String,
    table: String,
}

impl TableName {
    /// Builds a new table identifier.
    pub fn new<S, T>(schema: S, table: T) -> Result<Self>
    where
        S: Into<String>,
        T: Into<String>,
    {
        let schema = schema.into();
        let table = table.into();
        anyhow::ensure!(!schema.trim().is_empty(), "schema name is required");
        anyhow::ensure!(!table.trim().is_empty(), "table name is required");
        Ok(Self { schema, table })
    }

    /// Fully-qualified table reference with quoted identifiers.
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

/// Quotes Postgres identifiers, escaping embedded quotes.
pub fn quote_ident(input: &str) -> String {
    let escaped = input.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// The two embedded collections a query can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Many rows per document, one per embedded text chunk.
    Chunks,
    /// One precomputed summary row per document.
    Summaries,
}

impl Collection {
    /// Label used in logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Chunks => "chunks",
            Self::Summaries => "summaries",
        }
    }

    fn text_column(self) -> &'static str {
        match self {
            Self::Chunks => "chunk_text",
            Self::Summaries => "summary",
        }
    }
}

/// Where the chunk, summary and metadata tables live.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    chunks: TableName,
    summaries: TableName,
    metadata: TableName,
    category_column: String,
}

impl StoreLayout {
    /// Builds a layout; the category column must be non-empty.
    pub fn new(
        chunks: TableName,
        summaries: TableName,
        metadata: TableName,
        category_column: &str,
    ) -> Result<Self> {
        anyhow::ensure!(
            !category_column.trim().is_empty(),
            "category column is required"
        );
        Ok(Self {
            chunks,
            summaries,
            metadata,
            category_column: category_column.to_string(),
        })
    }

    fn table(&self, collection: Collection) -> &TableName {
        match collection {
            Collection::Chunks => &self.chunks,
            Collection::Summaries => &self.summaries,
        }
    }

    /// Similarity SQL for `collection`.
    ///
    /// Parameters: `$1` vector literal (text), `$2` optional category (text),
    /// `$3` row limit (int8). Rows come back ordered by distance ascending and
    /// carry `url, council_name, date, text_span, score` where
    /// `score = 1 - distance`. The category predicate only filters rows; it is
    /// never part of the ordering expression.
    pub fn similarity_sql(&self, collection: Collection) -> String {
        let distance = "e.embedding <=> CAST($1::text AS vector)";
        format!(
            "SELECT \
                m.url AS url, \
                m.council_name AS council_name, \
                CAST(m.date AS date) AS date, \
                e.{text} AS text_span, \
                1 - ({distance}) AS score \
            FROM {source} e \
            JOIN {metadata} m ON e.doc_id = m.doc_id \
            WHERE ($2::text IS NULL OR m.{category} = $2::text) \
            ORDER BY {distance} ASC \
            LIMIT $3",
            text = collection.text_column(),
            source = self.table(collection).qualified(),
            metadata = self.metadata.qualified(),
            category = quote_ident(&self.category_column),
        )
    }
}

/// One row returned by a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    /// Source document URL; the grouping key for chunk results.
    pub document_url: String,
    /// Council or body that held the meeting.
    pub council_name: String,
    /// Meeting date, when recorded.
    pub date: Option<NaiveDate>,
    /// Chunk text or summary text, depending on the collection.
    pub text_span: String,
    /// `1 - distance`; higher is more similar.
    pub score: Option<f64>,
}
