mod common;

use std::sync::Arc;

use common::{hit, service, tagged, FakeEmbedder, FakeStore};
use minutes_search::{vector_literal, Collection, SearchError, SearchRequest};
use pretty_assertions::assert_eq;

fn many_chunks() -> Vec<(String, minutes_search::RawHit)> {
    (0..40)
        .map(|i| {
            let url = format!("https://minutes.example.gov/doc/{}", i % 9);
            let score = 0.95 - f64::from(i) * 0.01;
            tagged("Environment", hit(&url, &format!("chunk {i}"), score))
        })
        .collect()
}

#[tokio::test]
async fn blank_query_does_no_work() {
    let embedder = Arc::new(FakeEmbedder::new(vec![0.1, 0.2]));
    let store = Arc::new(FakeStore::new(many_chunks(), Vec::new()));
    let service = service(embedder.clone(), store.clone());

    for query in ["", "   ", "\t\n"] {
        let request = SearchRequest::new(query);
        assert!(matches!(
            service.search(&request).await,
            Err(SearchError::InvalidQuery)
        ));
        assert!(matches!(
            service.summary_search(&request).await,
            Err(SearchError::InvalidQuery)
        ));
    }
    assert_eq!(embedder.calls(), 0);
    assert!(store.queries().is_empty());
}

#[tokio::test]
async fn default_chunk_search_overfetches_and_groups() {
    let embedder = Arc::new(FakeEmbedder::new(vec![0.25, -0.5, 1.0]));
    let store = Arc::new(FakeStore::new(many_chunks(), Vec::new()));
    let service = service(embedder.clone(), store.clone());

    let results = service
        .search(&SearchRequest::new("environment policy"))
        .await
        .expect("search succeeds");

    let queries = store.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].collection, Collection::Chunks);
    assert_eq!(queries[0].limit, 25);
    assert_eq!(queries[0].category, None);
    assert_eq!(embedder.calls(), 1);

    assert!(results.len() <= 5);
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r.match_count >= 1));
    let mut urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    urls.sort_unstable();
    urls.dedup();
    assert_eq!(urls.len(), results.len());
    for pair in results.windows(2) {
        let earlier = (pair[0].match_count, pair[0].score.unwrap_or(0.0));
        let later = (pair[1].match_count, pair[1].score.unwrap_or(0.0));
        assert!(earlier >= later, "{earlier:?} ranked before {later:?}");
    }
}

#[tokio::test]
async fn explicit_top_k_scales_fetch_limit() {
    let embedder = Arc::new(FakeEmbedder::new(vec![0.5]));
    let store = Arc::new(FakeStore::new(many_chunks(), Vec::new()));
    let service = service(embedder, store.clone());

    let results = service
        .search(&SearchRequest::new("river").with_top_k(3))
        .await
        .unwrap();
    assert_eq!(results.len(), 3);
    service
        .search(&SearchRequest::new("river").with_top_k(-2))
        .await
        .unwrap();
    service
        .search(&SearchRequest::new("river").with_top_k(500))
        .await
        .unwrap();

    let limits: Vec<usize> = store.queries().iter().map(|q| q.limit).collect();
    assert_eq!(limits, vec![15, 25, 100]);
}

#[tokio::test]
async fn chunks_of_one_document_are_folded() {
    let chunks = vec![
        tagged("Finance", hit("https://minutes.example.gov/a", "weaker", 0.7)),
        tagged("Finance", hit("https://minutes.example.gov/a", "stronger", 0.9)),
        tagged("Finance", hit("https://minutes.example.gov/b", "other", 0.95)),
    ];
    let embedder = Arc::new(FakeEmbedder::new(vec![0.1]));
    let store = Arc::new(FakeStore::new(chunks, Vec::new()));
    let results = service(embedder, store)
        .search(&SearchRequest::new("tax levy"))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    let folded = &results[0];
    assert_eq!(folded.url, "https://minutes.example.gov/a");
    assert_eq!(folded.match_count, 2);
    assert!((folded.score.unwrap() - 0.8).abs() < 1e-9);
    assert_eq!(folded.chunk_text.as_deref(), Some("stronger"));
    assert_eq!(folded.date.as_deref(), Some("2024-05-02"));
    assert_eq!(results[1].url, "https://minutes.example.gov/b");
    assert_eq!(results[1].match_count, 1);
}

#[tokio::test]
async fn summary_search_filters_by_category_without_overfetch() {
    let summaries = vec![
        tagged("Finance", hit("https://minutes.example.gov/f1", "budget", 0.61)),
        tagged("Health", hit("https://minutes.example.gov/h1", "clinics", 0.99)),
        tagged("Finance", hit("https://minutes.example.gov/f2", "audit", 0.83)),
        tagged("Finance", hit("https://minutes.example.gov/f3", "bonds", 0.72)),
        tagged("Finance", hit("https://minutes.example.gov/f4", "levy", 0.55)),
    ];
    let embedder = Arc::new(FakeEmbedder::new(vec![0.3, 0.4]));
    let store = Arc::new(FakeStore::new(Vec::new(), summaries));
    let service = service(embedder, store.clone());

    let results = service
        .summary_search(
            &SearchRequest::new("budget review")
                .with_top_k(3)
                .with_category("Finance"),
        )
        .await
        .unwrap();

    let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://minutes.example.gov/f2",
            "https://minutes.example.gov/f3",
            "https://minutes.example.gov/f1",
        ]
    );
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    let queries = store.queries();
    assert_eq!(queries[0].collection, Collection::Summaries);
    assert_eq!(queries[0].limit, 3);
    assert_eq!(queries[0].category.as_deref(), Some("Finance"));
}

#[tokio::test]
async fn summary_top_k_is_clamped() {
    let embedder = Arc::new(FakeEmbedder::new(vec![0.3]));
    let store = Arc::new(FakeStore::new(Vec::new(), Vec::new()));
    let service = service(embedder, store.clone());

    for top_k in [0, -7, 1000] {
        service
            .summary_search(&SearchRequest::new("parks").with_top_k(top_k))
            .await
            .unwrap();
    }
    service
        .summary_search(&SearchRequest::new("parks"))
        .await
        .unwrap();

    let limits: Vec<usize> = store.queries().iter().map(|q| q.limit).collect();
    assert_eq!(limits, vec![5, 1, 100, 5]);
}

#[tokio::test]
async fn embedding_and_datastore_failures_stay_distinct() {
    let broken_embedder = Arc::new(FakeEmbedder::failing());
    let store = Arc::new(FakeStore::new(Vec::new(), Vec::new()));
    let err = service(broken_embedder, store.clone())
        .summary_search(&SearchRequest::new("budget review"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Embedding(_)));
    assert_eq!(err.to_string(), "embedding failed: provider unavailable");
    assert!(store.queries().is_empty());

    let embedder = Arc::new(FakeEmbedder::new(vec![0.1]));
    let broken_store = Arc::new(FakeStore::failing());
    let err = service(embedder, broken_store)
        .summary_search(&SearchRequest::new("budget review"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Datastore(_)));
    assert!(err.to_string().starts_with("db query failed: "));
}

#[tokio::test]
async fn chunk_path_propagates_embedding_failure() {
    let embedder = Arc::new(FakeEmbedder::failing());
    let store = Arc::new(FakeStore::new(many_chunks(), Vec::new()));
    let err = service(embedder, store.clone())
        .search(&SearchRequest::new("environment policy"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Embedding(_)));
    assert!(store.queries().is_empty());
}

#[tokio::test]
async fn store_receives_encoded_query_vector() {
    let vector = vec![0.123_456_78, -0.5, 0.0];
    let embedder = Arc::new(FakeEmbedder::new(vector.clone()));
    let store = Arc::new(FakeStore::new(Vec::new(), Vec::new()));
    service(embedder, store.clone())
        .search(&SearchRequest::new("zoning"))
        .await
        .unwrap();

    let literal = &store.queries()[0].vector_literal;
    assert_eq!(literal, &vector_literal::encode(&vector));
    let parsed = vector_literal::parse(literal).unwrap();
    for (sent, original) in parsed.iter().zip(&vector) {
        assert!((sent - f64::from(*original)).abs() <= 1e-8);
    }
}

#[tokio::test]
async fn concurrent_requests_do_not_share_state() {
    let embedder = Arc::new(FakeEmbedder::new(vec![0.2]));
    let store = Arc::new(FakeStore::new(many_chunks(), Vec::new()));
    let service = service(embedder.clone(), store);

    let first = SearchRequest::new("air quality").with_top_k(2);
    let second = SearchRequest::new("water quality").with_top_k(4);
    let (a, b) = tokio::join!(service.search(&first), service.search(&second));
    assert_eq!(a.unwrap().len(), 2);
    assert_eq!(b.unwrap().len(), 4);
    assert_eq!(embedder.calls(), 2);
}

#[tokio::test]
async fn health_maps_ping_failure_to_datastore_error() {
    let embedder = Arc::new(FakeEmbedder::new(vec![0.2]));
    assert!(service(embedder.clone(), Arc::new(FakeStore::new(Vec::new(), Vec::new())))
        .health()
        .await
        .is_ok());
    let err = service(embedder, Arc::new(FakeStore::failing()))
        .health()
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Datastore(_)));
}
