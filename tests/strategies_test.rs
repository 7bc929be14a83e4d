//! Strategy facade tests against in-process search and embedding doubles
//!
//! Verifies:
//! 1. Identity and order of mapped documents
//! 2. Request shape per strategy (collection, clauses, vector source)
//! 3. Stage tagging and short-circuiting of errors
//! 4. Boost and RRF fusion semantics on small fixtures

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use common::{hit, strategies, RecordingBackend, StaticEmbedder};
use rodent_search::search::query::{HybridWeights, RrfParams, VectorSource};
use rodent_search::search::{
    Document, QueryVector, RawHit, RetrievalRequest, SearchBackend, SearchStrategies, Strategy,
    StrategySettings,
};
use rodent_search::{RetrievalError, SearchError, Stage};

fn gopher_backend() -> Arc<RecordingBackend> {
    Arc::new(RecordingBackend::with_hits(vec![hit(
        "1",
        json!({
            "id": "not-the-id",
            "title": "Gopher diet",
            "url": "/g1",
            "body_content": "Gophers eat roots"
        }),
    )]))
}

#[tokio::test]
async fn test_keyword_search_end_to_end() {
    let backend = gopher_backend();
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1, 0.2, 0.3]));
    let search = strategies(backend.clone(), embedder.clone(), StrategySettings::new());

    let documents = search.keyword_search("What do Gophers eat?").await.unwrap();

    assert_eq!(
        documents,
        vec![Document {
            id: "1".to_string(),
            title: "Gopher diet".to_string(),
            url: "/g1".to_string(),
        }]
    );

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].collection, "search-rodents");
    let query = requests[0].query.as_ref().unwrap();
    assert_eq!(query.field, "title");
    assert_eq!(query.term(), "What do Gophers eat?");
    assert!(requests[0].knn.is_none());
    assert_eq!(requests[0].size, 10);
    assert_eq!(embedder.call_count(), 0);
}

#[tokio::test]
async fn test_ids_come_from_hits_in_order() {
    let backend = Arc::new(RecordingBackend::with_hits(vec![
        hit("h1", json!({"id": "x", "title": "Vole", "url": "/v"})),
        hit("h2", json!({"id": "y", "title": "Gopher", "url": "/g"})),
        hit("h3", json!({"id": "z", "title": "Beaver", "url": "/b"})),
    ]));
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1]));
    let search = strategies(backend, embedder, StrategySettings::new());

    for term in ["gopher", "rodent", "What do Gophers eat?"] {
        let documents = search.keyword_search(term).await.unwrap();
        let ids: Vec<_> = documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["h1", "h2", "h3"]);
    }
}

#[tokio::test]
async fn test_vector_search_uses_engine_side_embedding() {
    let backend = gopher_backend();
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1, 0.2, 0.3]));
    let search = strategies(backend.clone(), embedder.clone(), StrategySettings::new());

    search.vector_search("gopher").await.unwrap();

    let request = &backend.requests()[0];
    assert_eq!(request.collection, "vector-search-rodents");
    let knn = request.knn.as_ref().unwrap();
    assert_eq!(knn.field, "text_embedding.predicted_value");
    assert_eq!(knn.k, 10);
    assert_eq!(knn.num_candidates, 10);
    match &knn.source {
        VectorSource::QueryVectorBuilder(builder) => {
            assert_eq!(
                builder.text_embedding.model_id,
                "sentence-transformers__msmarco-minilm-l-12-v3"
            );
            assert_eq!(builder.text_embedding.model_text, "gopher");
        }
        other => panic!("expected engine-side vector builder, got {:?}", other),
    }
    assert_eq!(embedder.call_count(), 0);
}

#[tokio::test]
async fn test_generated_vector_is_forwarded_verbatim() {
    let backend = gopher_backend();
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1, 0.2, 0.3]));
    let search = strategies(backend.clone(), embedder.clone(), StrategySettings::new());

    let documents = search
        .vector_search_with_generated_vector("gopher")
        .await
        .unwrap();
    assert_eq!(documents.len(), 1);

    assert_eq!(embedder.call_count(), 1);
    assert_eq!(backend.call_count(), 1);
    let knn = backend.requests()[0].knn.clone().unwrap();
    assert_eq!(
        knn.source,
        VectorSource::QueryVector(QueryVector::new(vec![0.1, 0.2, 0.3]))
    );
}

#[tokio::test]
async fn test_embedding_failure_skips_retrieval() {
    let backend = gopher_backend();
    let embedder = Arc::new(StaticEmbedder::failing(503));
    let search = strategies(backend.clone(), embedder.clone(), StrategySettings::new());

    let err = search
        .vector_search_with_generated_vector("gopher")
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Embedding);
    assert!(matches!(err, SearchError::Embedding(_)));
    assert_eq!(embedder.call_count(), 1);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_empty_generated_vector_is_not_searched() {
    let backend = gopher_backend();
    let embedder = Arc::new(StaticEmbedder::returning(vec![]));
    let search = strategies(backend.clone(), embedder, StrategySettings::new());

    let err = search
        .vector_search_with_generated_vector("gopher")
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Build);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_filtered_vector_search() {
    let backend = gopher_backend();
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1]));
    let search = strategies(backend.clone(), embedder, StrategySettings::new());

    search.vector_search_with_filter("gopher").await.unwrap();

    let knn = backend.requests()[0].knn.clone().unwrap();
    assert_eq!(knn.filter.len(), 1);
    assert_eq!(knn.filter[0].field, "body_content");
    assert_eq!(knn.filter[0].term(), "rodent");
    assert!(matches!(knn.source, VectorSource::QueryVectorBuilder(_)));
}

#[tokio::test]
async fn test_retrieval_failure_is_not_an_empty_result() {
    let backend = Arc::new(RecordingBackend::failing(500));
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1]));
    let search = strategies(backend, embedder, StrategySettings::new());

    for strategy in Strategy::ALL {
        let err = search.run(strategy, "gopher").await.unwrap_err();
        assert_eq!(err.stage(), Stage::Execute, "strategy {}", strategy);
    }
}

#[tokio::test]
async fn test_zero_matches_is_ok() {
    let backend = Arc::new(RecordingBackend::with_hits(vec![]));
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1]));
    let search = strategies(backend, embedder, StrategySettings::new());

    assert!(search.keyword_search("capybara").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_hit_fails_whole_batch() {
    let backend = Arc::new(RecordingBackend::with_hits(vec![
        hit("good", json!({"title": "Gopher", "url": "/g"})),
        hit("broken", json!({"title": ["not", "a", "string"]})),
    ]));
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1]));
    let search = strategies(backend, embedder, StrategySettings::new());

    match search.keyword_search("gopher").await {
        Err(SearchError::Map(err)) => assert_eq!(err.id, "broken"),
        other => panic!("expected mapping error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_term_is_searched() {
    let backend = gopher_backend();
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1]));
    let search = strategies(backend.clone(), embedder, StrategySettings::new());

    search.keyword_search("").await.unwrap();
    assert_eq!(backend.requests()[0].query.as_ref().unwrap().term(), "");
}

#[tokio::test]
async fn test_vector_field_is_configurable() {
    let backend = gopher_backend();
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1]));
    let settings = StrategySettings::new().with_vector_field("ml.inference.predicted_value");
    let search = strategies(backend.clone(), embedder, settings);

    search.hybrid_search_with_rrf("gopher").await.unwrap();
    assert_eq!(
        backend.requests()[0].knn.as_ref().unwrap().field,
        "ml.inference.predicted_value"
    );
}

#[tokio::test]
async fn test_hybrid_boost_request() {
    let backend = gopher_backend();
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1]));
    let search = strategies(backend.clone(), embedder, StrategySettings::new());

    search.hybrid_search_with_boost("gopher").await.unwrap();

    let request = &backend.requests()[0];
    let lexical = request.query.as_ref().unwrap().boost().unwrap();
    let vector = request.knn.as_ref().unwrap().boost.unwrap();
    assert!((lexical + vector - 1.0).abs() < 1e-6);
    assert!(lexical > vector);
    assert_eq!(request.size, 2);
    assert!(request.rank.is_none());
}

#[tokio::test]
async fn test_hybrid_rrf_window_boundary() {
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1]));

    let backend = gopher_backend();
    let search = strategies(
        backend.clone(),
        embedder.clone(),
        StrategySettings::new().with_rrf(RrfParams::new(10, 42)),
    );
    search.hybrid_search_with_rrf("gopher").await.unwrap();
    let rank = backend.requests()[0].rank.clone().unwrap();
    assert_eq!(rank.rrf, RrfParams::new(10, 42));

    let backend = gopher_backend();
    let search = strategies(
        backend.clone(),
        embedder,
        StrategySettings::new().with_rrf(RrfParams::new(9, 42)),
    );
    let err = search.hybrid_search_with_rrf("gopher").await.unwrap_err();
    assert_eq!(err.stage(), Stage::Build);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_concurrent_calls_share_clients() {
    let backend = gopher_backend();
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1, 0.2, 0.3]));
    let search = strategies(backend.clone(), embedder.clone(), StrategySettings::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let search = search.clone();
            let strategy = Strategy::ALL[i % Strategy::ALL.len()];
            tokio::spawn(async move { search.run(strategy, "gopher").await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().len(), 1);
    }
    assert_eq!(backend.call_count(), 8);
    // only index 3 is the generated-vector strategy
    assert_eq!(embedder.call_count(), 1);
}

/// Two documents, one strong lexically and one strong on vectors. Scores
/// are blended with the boosts carried by the request.
struct BlendingBackend {
    scores: Vec<(&'static str, f64, f64)>,
}

#[async_trait]
impl SearchBackend for BlendingBackend {
    async fn execute(&self, request: &RetrievalRequest) -> Result<Vec<RawHit>, RetrievalError> {
        let lexical = request.query.as_ref().and_then(|q| q.boost()).unwrap_or(1.0);
        let vector = request.knn.as_ref().and_then(|k| k.boost).unwrap_or(1.0);
        let weights = HybridWeights::new(lexical, vector)
            .map_err(|e| RetrievalError::Request(e.to_string()))?;

        let mut ranked: Vec<_> = self
            .scores
            .iter()
            .map(|(id, lex, vec)| (*id, weights.blend(*lex, *vec)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        ranked.truncate(request.size);

        Ok(ranked
            .into_iter()
            .map(|(id, score)| RawHit {
                id: id.to_string(),
                score: Some(score),
                body: json!({"title": id, "url": format!("/{}", id)}),
            })
            .collect())
    }
}

fn blended_search(weights: HybridWeights) -> SearchStrategies {
    let backend = Arc::new(BlendingBackend {
        scores: vec![("lexical-top", 1.0, 0.1), ("vector-top", 0.2, 1.0)],
    });
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1]));
    SearchStrategies::new(
        backend,
        embedder,
        StrategySettings::new().with_hybrid_weights(weights),
    )
}

#[tokio::test]
async fn test_boost_split_changes_ranking() {
    let lexical_heavy = blended_search(HybridWeights::default());
    let documents = lexical_heavy.hybrid_search_with_boost("gopher").await.unwrap();
    let ids: Vec<_> = documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["lexical-top", "vector-top"]);

    let vector_heavy = blended_search(HybridWeights::new(0.2, 0.8).unwrap());
    let documents = vector_heavy.hybrid_search_with_boost("gopher").await.unwrap();
    let ids: Vec<_> = documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["vector-top", "lexical-top"]);

    // deterministic across repeated calls
    let again = lexical_heavy.hybrid_search_with_boost("gopher").await.unwrap();
    assert_eq!(again[0].id, "lexical-top");
}

/// Fuses fixed lexical and vector rankings with the request's RRF parameters
struct RrfBackend {
    lexical: Vec<&'static str>,
    vector: Vec<&'static str>,
}

#[async_trait]
impl SearchBackend for RrfBackend {
    async fn execute(&self, request: &RetrievalRequest) -> Result<Vec<RawHit>, RetrievalError> {
        let rrf = request
            .rank
            .as_ref()
            .map(|r| r.rrf)
            .ok_or_else(|| RetrievalError::Request("missing rank clause".to_string()))?;

        let mut ranks: HashMap<&str, Vec<usize>> = HashMap::new();
        for list in [&self.lexical, &self.vector] {
            for (position, id) in list.iter().enumerate() {
                ranks.entry(*id).or_default().push(position + 1);
            }
        }

        let mut fused: Vec<_> = ranks
            .into_iter()
            .map(|(id, ranks)| (id, rrf.fused_score(&ranks)))
            .collect();
        fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then(a.0.cmp(b.0)));
        fused.truncate(request.size);

        Ok(fused
            .into_iter()
            .map(|(id, score)| RawHit {
                id: id.to_string(),
                score: Some(score),
                body: json!({"title": id, "url": ""}),
            })
            .collect())
    }
}

#[tokio::test]
async fn test_rrf_fuses_by_rank() {
    let backend = Arc::new(RrfBackend {
        lexical: vec!["a", "b", "c"],
        vector: vec!["c", "a", "d"],
    });
    let embedder = Arc::new(StaticEmbedder::returning(vec![0.1]));
    let search = SearchStrategies::new(backend, embedder, StrategySettings::new());

    let documents = search.hybrid_search_with_rrf("gopher").await.unwrap();
    let ids: Vec<_> = documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c", "b", "d"]);
}
