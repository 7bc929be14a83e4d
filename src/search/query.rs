//! Request construction for each retrieval strategy
//!
//! Every strategy is a fixed recipe. The builders here are pure functions that
//! produce a fresh `RetrievalRequest`; its serde form is the `_search` body.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::types::{QueryVector, BODY_CONTENT_FIELD, DEFAULT_VECTOR_FIELD, TITLE_FIELD};
use crate::error::BuildError;

/// Results per page for every strategy except hybrid boost
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Hybrid boost shows a short page so the blended ordering is visible
pub const HYBRID_BOOST_PAGE_SIZE: usize = 2;

pub const DEFAULT_K: usize = 10;
pub const DEFAULT_NUM_CANDIDATES: usize = 10;

/// Term every filtered vector search is restricted to
pub const DEFAULT_FILTER_TERM: &str = "rodent";

pub const DEFAULT_LEXICAL_BOOST: f32 = 0.8;
pub const DEFAULT_VECTOR_BOOST: f32 = 0.2;

/// Smallest window that still fills a default page
pub const DEFAULT_RRF_WINDOW_SIZE: usize = 10;
pub const DEFAULT_RRF_RANK_CONSTANT: usize = 42;

const BOOST_TOLERANCE: f32 = 1e-6;

/// Match query on a single field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f32>,
}

/// Lexical clause: `{"match": {<field>: {"query": <term>}}}`
#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    pub field: String,
    pub query: MatchQuery,
}

impl MatchClause {
    pub fn new(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            query: MatchQuery {
                query: term.into(),
                boost: None,
            },
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.query.boost = Some(boost);
        self
    }

    pub fn term(&self) -> &str {
        &self.query.query
    }

    pub fn boost(&self) -> Option<f32> {
        self.query.boost
    }
}

impl Serialize for MatchClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut fields = BTreeMap::new();
        fields.insert(self.field.as_str(), &self.query);

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("match", &fields)?;
        map.end()
    }
}

/// Engine-side embedding directive
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextEmbedding {
    pub model_id: String,
    pub model_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryVectorBuilder {
    pub text_embedding: TextEmbedding,
}

/// Where the query vector comes from. Exactly one per vector clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorSource {
    /// Vector computed client-side and sent verbatim
    QueryVector(QueryVector),
    /// Query text embedded by the engine's deployed model
    QueryVectorBuilder(QueryVectorBuilder),
}

impl VectorSource {
    pub fn engine_side(model_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::QueryVectorBuilder(QueryVectorBuilder {
            text_embedding: TextEmbedding {
                model_id: model_id.into(),
                model_text: text.into(),
            },
        })
    }
}

/// Approximate nearest-neighbor clause
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorClause {
    pub field: String,
    pub k: usize,
    pub num_candidates: usize,
    #[serde(flatten)]
    pub source: VectorSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<MatchClause>,
}

/// Reciprocal rank fusion parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RrfParams {
    pub window_size: usize,
    pub rank_constant: usize,
}

impl Default for RrfParams {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_RRF_WINDOW_SIZE,
            rank_constant: DEFAULT_RRF_RANK_CONSTANT,
        }
    }
}

impl RrfParams {
    pub fn new(window_size: usize, rank_constant: usize) -> Self {
        Self {
            window_size,
            rank_constant,
        }
    }

    /// Reject windows that cannot fill a page of `page_size` results
    pub fn check_page(&self, page_size: usize) -> Result<(), BuildError> {
        if self.window_size < page_size {
            return Err(BuildError::InsufficientRrfWindow {
                window_size: self.window_size,
                page_size,
            });
        }
        Ok(())
    }

    /// Fused score of a document given its 1-based rank in each input list.
    ///
    /// `score = sum(1 / (rank_constant + rank))`; ranks beyond the window
    /// contribute nothing.
    pub fn fused_score(&self, ranks: &[usize]) -> f64 {
        ranks
            .iter()
            .filter(|&&rank| rank >= 1 && rank <= self.window_size)
            .map(|&rank| 1.0 / (self.rank_constant + rank) as f64)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankClause {
    pub rrf: RrfParams,
}

/// Query-time weights for the linear hybrid blend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
    lexical: f32,
    vector: f32,
}

impl HybridWeights {
    /// Both weights must be non-negative and sum to 1.0
    pub fn new(lexical: f32, vector: f32) -> Result<Self, BuildError> {
        let valid = lexical.is_finite()
            && vector.is_finite()
            && lexical >= 0.0
            && vector >= 0.0
            && ((lexical + vector) - 1.0).abs() <= BOOST_TOLERANCE;
        if !valid {
            return Err(BuildError::InvalidBoosts { lexical, vector });
        }
        Ok(Self { lexical, vector })
    }

    pub fn lexical(&self) -> f32 {
        self.lexical
    }

    pub fn vector(&self) -> f32 {
        self.vector
    }

    /// Blended score for independently normalized lexical and vector scores
    pub fn blend(&self, lexical_score: f64, vector_score: f64) -> f64 {
        self.lexical as f64 * lexical_score + self.vector as f64 * vector_score
    }
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            lexical: DEFAULT_LEXICAL_BOOST,
            vector: DEFAULT_VECTOR_BOOST,
        }
    }
}

/// Vector clause shape shared by the vector and hybrid recipes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorParams {
    pub field: String,
    pub k: usize,
    pub num_candidates: usize,
    /// Deployed model id used by the engine-side vector builder
    pub model_id: String,
}

impl VectorParams {
    pub fn new(field: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            k: DEFAULT_K,
            num_candidates: DEFAULT_NUM_CANDIDATES,
            model_id: model_id.into(),
        }
    }

    pub fn with_default_field(model_id: impl Into<String>) -> Self {
        Self::new(DEFAULT_VECTOR_FIELD, model_id)
    }

    fn clause(&self, source: VectorSource) -> VectorClause {
        VectorClause {
            field: self.field.clone(),
            k: self.k,
            num_candidates: self.num_candidates,
            source,
            boost: None,
            filter: Vec::new(),
        }
    }

    fn engine_side_clause(&self, term: &str) -> VectorClause {
        self.clause(VectorSource::engine_side(self.model_id.as_str(), term))
    }
}

/// A single-use search request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalRequest {
    /// Target collection; part of the URL, not the body
    #[serde(skip)]
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<MatchClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knn: Option<VectorClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<RankClause>,
    pub from: usize,
    pub size: usize,
}

impl RetrievalRequest {
    fn new(collection: &str, size: usize) -> Self {
        Self {
            collection: collection.to_string(),
            query: None,
            knn: None,
            rank: None,
            from: 0,
            size,
        }
    }
}

/// Keyword search: match on `title`
pub fn build_keyword(collection: &str, term: &str, size: usize) -> RetrievalRequest {
    RetrievalRequest {
        query: Some(MatchClause::new(TITLE_FIELD, term)),
        ..RetrievalRequest::new(collection, size)
    }
}

/// Vector search with the query embedded by the engine
pub fn build_vector(
    collection: &str,
    term: &str,
    params: &VectorParams,
    size: usize,
) -> RetrievalRequest {
    RetrievalRequest {
        knn: Some(params.engine_side_clause(term)),
        ..RetrievalRequest::new(collection, size)
    }
}

/// Vector search with a vector computed client-side
pub fn build_vector_with_query_vector(
    collection: &str,
    vector: QueryVector,
    params: &VectorParams,
    size: usize,
) -> Result<RetrievalRequest, BuildError> {
    if vector.is_empty() {
        return Err(BuildError::EmptyQueryVector);
    }

    Ok(RetrievalRequest {
        knn: Some(params.clause(VectorSource::QueryVector(vector))),
        ..RetrievalRequest::new(collection, size)
    })
}

/// Engine-side vector search restricted to documents whose `body_content`
/// matches `filter_term`
pub fn build_filtered_vector(
    collection: &str,
    term: &str,
    params: &VectorParams,
    filter_term: &str,
    size: usize,
) -> RetrievalRequest {
    let mut knn = params.engine_side_clause(term);
    knn.filter = vec![MatchClause::new(BODY_CONTENT_FIELD, filter_term)];

    RetrievalRequest {
        knn: Some(knn),
        ..RetrievalRequest::new(collection, size)
    }
}

/// Hybrid search scored as `lexical_boost * match + vector_boost * knn`
pub fn build_hybrid_boost(
    collection: &str,
    term: &str,
    params: &VectorParams,
    weights: HybridWeights,
    size: usize,
) -> RetrievalRequest {
    let mut knn = params.engine_side_clause(term);
    knn.boost = Some(weights.vector());

    RetrievalRequest {
        query: Some(MatchClause::new(TITLE_FIELD, term).with_boost(weights.lexical())),
        knn: Some(knn),
        ..RetrievalRequest::new(collection, size)
    }
}

/// Hybrid search fused by reciprocal rank
pub fn build_hybrid_rrf(
    collection: &str,
    term: &str,
    params: &VectorParams,
    rrf: RrfParams,
    size: usize,
) -> Result<RetrievalRequest, BuildError> {
    rrf.check_page(size)?;

    Ok(RetrievalRequest {
        query: Some(MatchClause::new(TITLE_FIELD, term)),
        knn: Some(params.engine_side_clause(term)),
        rank: Some(RankClause { rrf }),
        ..RetrievalRequest::new(collection, size)
    })
}
