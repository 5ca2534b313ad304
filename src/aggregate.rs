//! Per-document grouping and ranking of chunk hits.
//!
//! A document can match a query through several chunks. Hits are folded into
//! one [`DocumentAggregate`] per URL, and documents are ranked by how many of
//! their chunks matched, then by the mean similarity of those chunks.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;

use crate::vector_store::RawHit;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_TOP_K: usize = 5;
/// Largest page the chunk path will return.
pub const MAX_CHUNK_TOP_K: usize = 20;
/// Largest page the summary path will return.
pub const MAX_SUMMARY_TOP_K: usize = 100;
/// Raw chunk rows fetched per requested document.
pub const OVERFETCH_FACTOR: usize = 5;

/// Page size and row budget for one chunk search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLimits {
    /// Number of documents returned.
    pub top_k: usize,
    /// Number of raw chunk rows requested from the datastore.
    pub fetch_limit: usize,
}

/// Resolves the chunk-path page size and over-fetch budget.
///
/// A missing or non-positive `top_k` falls back to [`DEFAULT_TOP_K`]; the
/// result is clamped to `1..=MAX_CHUNK_TOP_K`. An explicit `top_k` fetches
/// `top_k * OVERFETCH_FACTOR` rows, an omitted one fetches
/// `DEFAULT_TOP_K * OVERFETCH_FACTOR`.
pub fn resolve_chunk_limits(requested: Option<i64>) -> ChunkLimits {
    let top_k = requested
        .filter(|value| *value > 0)
        .map_or(DEFAULT_TOP_K, |value| {
            usize::try_from(value).unwrap_or(MAX_CHUNK_TOP_K)
        })
        .clamp(1, MAX_CHUNK_TOP_K);
    let fetch_limit = match requested {
        Some(_) => top_k * OVERFETCH_FACTOR,
        None => DEFAULT_TOP_K * OVERFETCH_FACTOR,
    };
    ChunkLimits {
        top_k,
        fetch_limit: fetch_limit.max(top_k),
    }
}

/// Resolves the summary-path page size.
///
/// Missing or zero means [`DEFAULT_TOP_K`]; anything else is clamped to
/// `1..=MAX_SUMMARY_TOP_K`, so negative values become 1.
pub fn resolve_summary_top_k(requested: Option<i64>) -> usize {
    match requested {
        None | Some(0) => DEFAULT_TOP_K,
        Some(value) if value < 0 => 1,
        Some(value) => usize::try_from(value)
            .unwrap_or(MAX_SUMMARY_TOP_K)
            .clamp(1, MAX_SUMMARY_TOP_K),
    }
}

/// Roll-up of every hit that shares one document URL.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentAggregate {
    /// Grouping key.
    pub document_url: String,
    /// Council name from the first hit seen for the document.
    pub council_name: String,
    /// Meeting date from the first hit seen for the document.
    pub date: Option<NaiveDate>,
    /// Text of the highest-scoring hit; earliest row wins ties.
    pub best_text_span: Option<String>,
    /// Mean similarity over the group, `None` when the group is empty.
    pub average_score: Option<f64>,
    /// Number of hits folded into this aggregate.
    pub match_count: usize,
}

#[derive(Debug)]
struct Group {
    document_url: String,
    council_name: String,
    date: Option<NaiveDate>,
    scores: Vec<f64>,
    spans: Vec<String>,
}

impl Group {
    fn new(hit: &RawHit) -> Self {
        Self {
            document_url: hit.document_url.clone(),
            council_name: hit.council_name.clone(),
            date: hit.date,
            scores: Vec::new(),
            spans: Vec::new(),
        }
    }

    fn push(&mut self, hit: RawHit) {
        self.scores.push(hit.score.unwrap_or(0.0));
        self.spans.push(hit.text_span);
    }

    fn finish(mut self) -> DocumentAggregate {
        let match_count = self.scores.len();
        let average_score = if match_count > 0 {
            Some(self.scores.iter().sum::<f64>() / match_count as f64)
        } else {
            None
        };
        let best_text_span = best_index(&self.scores).map(|idx| self.spans.swap_remove(idx));
        DocumentAggregate {
            document_url: self.document_url,
            council_name: self.council_name,
            date: self.date,
            best_text_span,
            average_score,
            match_count,
        }
    }
}

/// Index of the largest score; the first of equal maxima wins.
fn best_index(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, score) in scores.iter().copied().enumerate() {
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Groups hits by document URL, in order of each URL's first appearance.
///
/// A missing score counts as `0.0` in the average.
pub fn aggregate_hits(hits: Vec<RawHit>) -> Vec<DocumentAggregate> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();
    for hit in hits {
        let idx = match positions.get(&hit.document_url) {
            Some(idx) => *idx,
            None => {
                positions.insert(hit.document_url.clone(), groups.len());
                groups.push(Group::new(&hit));
                groups.len() - 1
            }
        };
        groups[idx].push(hit);
    }
    groups.into_iter().map(Group::finish).collect()
}

/// Orders aggregates by `match_count` then `average_score`, both descending,
/// and keeps the first `top_k`.
///
/// The sort is stable, so fully tied documents keep first-appearance order.
pub fn rank(mut aggregates: Vec<DocumentAggregate>, top_k: usize) -> Vec<DocumentAggregate> {
    aggregates.sort_by(compare_rank);
    aggregates.truncate(top_k);
    aggregates
}

fn compare_rank(a: &DocumentAggregate, b: &DocumentAggregate) -> Ordering {
    b.match_count.cmp(&a.match_count).then_with(|| {
        let left = a.average_score.unwrap_or(0.0);
        let right = b.average_score.unwrap_or(0.0);
        right.partial_cmp(&left).unwrap_or(Ordering::Equal)
    })
}
