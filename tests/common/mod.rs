#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use minutes_search::{Collection, Datastore, Embedder, RawHit, SearchService};

/// Embedder returning a fixed vector and counting calls.
pub struct FakeEmbedder {
    pub vector: Vec<f32>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for FakeEmbedder {
    fn name(&self) -> &str {
        "fake"
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.vector.len())
    }

    fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("provider unavailable"));
        }
        Ok(inputs.iter().map(|_| self.vector.clone()).collect())
    }
}

/// What the service asked the datastore for.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub collection: Collection,
    pub vector_literal: String,
    pub category: Option<String>,
    pub limit: usize,
}

/// In-memory datastore: rows are tagged with a category and returned in
/// descending score order, filtered and limited like the SQL would.
pub struct FakeStore {
    pub chunks: Vec<(String, RawHit)>,
    pub summaries: Vec<(String, RawHit)>,
    pub fail: bool,
    pub ping_fails: bool,
    pub queries: Mutex<Vec<RecordedQuery>>,
}

impl FakeStore {
    pub fn new(chunks: Vec<(String, RawHit)>, summaries: Vec<(String, RawHit)>) -> Self {
        Self {
            chunks,
            summaries,
            fail: false,
            ping_fails: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ping_fails: true,
            ..Self::new(Vec::new(), Vec::new())
        }
    }

    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Datastore for FakeStore {
    async fn nearest_neighbors(
        &self,
        collection: Collection,
        vector_literal: &str,
        category: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RawHit>> {
        self.queries.lock().unwrap().push(RecordedQuery {
            collection,
            vector_literal: vector_literal.to_string(),
            category: category.map(str::to_string),
            limit,
        });
        if self.fail {
            return Err(anyhow!("relation \"meeting_chunks\" does not exist"));
        }
        let source = match collection {
            Collection::Chunks => &self.chunks,
            Collection::Summaries => &self.summaries,
        };
        let mut rows: Vec<RawHit> = source
            .iter()
            .filter(|(tag, _)| category.map_or(true, |wanted| wanted == tag.as_str()))
            .map(|(_, hit)| hit.clone())
            .collect();
        rows.sort_by(|a, b| {
            b.score
                .unwrap_or(0.0)
                .partial_cmp(&a.score.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows.truncate(limit);
        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        if self.ping_fails {
            return Err(anyhow!("connection refused"));
        }
        Ok(())
    }
}

pub fn hit(url: &str, text: &str, score: f64) -> RawHit {
    RawHit {
        document_url: url.to_string(),
        council_name: "City Council".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 5, 2),
        text_span: text.to_string(),
        score: Some(score),
    }
}

pub fn tagged(category: &str, hit: RawHit) -> (String, RawHit) {
    (category.to_string(), hit)
}

pub fn service(embedder: Arc<FakeEmbedder>, store: Arc<FakeStore>) -> SearchService {
    SearchService::new(embedder, store)
}
