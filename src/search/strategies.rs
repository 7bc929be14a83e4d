//! Public retrieval strategies
//!
//! Each operation builds a request, executes it once and maps the hits.
//! The generated-vector strategy embeds the term first. Errors are returned
//! tagged with the stage that produced them; nothing is retried.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info};

use super::embedding::EmbeddingProvider;
use super::executor::SearchBackend;
use super::mapper::map_hits;
use super::query::{
    build_filtered_vector, build_hybrid_boost, build_hybrid_rrf, build_keyword, build_vector,
    build_vector_with_query_vector, HybridWeights, RetrievalRequest, RrfParams, VectorParams,
    DEFAULT_FILTER_TERM, DEFAULT_K, DEFAULT_NUM_CANDIDATES, DEFAULT_PAGE_SIZE,
    HYBRID_BOOST_PAGE_SIZE,
};
use super::types::{
    Document, DEFAULT_KEYWORD_COLLECTION, DEFAULT_VECTOR_COLLECTION, DEFAULT_VECTOR_FIELD,
};
use crate::error::{Result, SearchError};

/// Named retrieval recipes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Keyword,
    Vector,
    FilteredVector,
    GeneratedVector,
    HybridBoost,
    HybridRrf,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Self::Keyword,
        Self::Vector,
        Self::FilteredVector,
        Self::GeneratedVector,
        Self::HybridBoost,
        Self::HybridRrf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Vector => "vector",
            Self::FilteredVector => "filtered",
            Self::GeneratedVector => "generated-vector",
            Self::HybridBoost => "hybrid-boost",
            Self::HybridRrf => "hybrid-rrf",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|s| s.as_str()).collect();
                format!("unknown strategy '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

/// Index-specific settings shared by all strategies
#[derive(Debug, Clone)]
pub struct StrategySettings {
    pub keyword_collection: String,
    pub vector_collection: String,
    /// Dense vector field; differs between ingest pipelines
    pub vector_field: String,
    pub k: usize,
    pub num_candidates: usize,
    pub page_size: usize,
    pub hybrid_page_size: usize,
    pub filter_term: String,
    pub hybrid_weights: HybridWeights,
    pub rrf: RrfParams,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            keyword_collection: DEFAULT_KEYWORD_COLLECTION.to_string(),
            vector_collection: DEFAULT_VECTOR_COLLECTION.to_string(),
            vector_field: DEFAULT_VECTOR_FIELD.to_string(),
            k: DEFAULT_K,
            num_candidates: DEFAULT_NUM_CANDIDATES,
            page_size: DEFAULT_PAGE_SIZE,
            hybrid_page_size: HYBRID_BOOST_PAGE_SIZE,
            filter_term: DEFAULT_FILTER_TERM.to_string(),
            hybrid_weights: HybridWeights::default(),
            rrf: RrfParams::default(),
        }
    }
}

impl StrategySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vector_field(mut self, field: impl Into<String>) -> Self {
        self.vector_field = field.into();
        self
    }

    pub fn with_collections(
        mut self,
        keyword: impl Into<String>,
        vector: impl Into<String>,
    ) -> Self {
        self.keyword_collection = keyword.into();
        self.vector_collection = vector.into();
        self
    }

    pub fn with_hybrid_weights(mut self, weights: HybridWeights) -> Self {
        self.hybrid_weights = weights;
        self
    }

    pub fn with_rrf(mut self, rrf: RrfParams) -> Self {
        self.rrf = rrf;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Strategy facade over injected search and embedding clients.
///
/// Cloning is cheap and clones share the same client handles.
#[derive(Clone)]
pub struct SearchStrategies {
    backend: Arc<dyn SearchBackend>,
    embedder: Arc<dyn EmbeddingProvider>,
    settings: StrategySettings,
}

impl SearchStrategies {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        embedder: Arc<dyn EmbeddingProvider>,
        settings: StrategySettings,
    ) -> Self {
        info!(
            "Search strategies ready (vector field: {}, model: {})",
            settings.vector_field,
            embedder.model().hub_id
        );

        Self {
            backend,
            embedder,
            settings,
        }
    }

    pub fn settings(&self) -> &StrategySettings {
        &self.settings
    }

    /// Vector clause parameters; the engine-side model is the embedder's model
    fn vector_params(&self) -> VectorParams {
        VectorParams {
            field: self.settings.vector_field.clone(),
            k: self.settings.k,
            num_candidates: self.settings.num_candidates,
            model_id: self.embedder.model().deployed_id(),
        }
    }

    /// Run any strategy by name
    pub async fn run(&self, strategy: Strategy, term: &str) -> Result<Vec<Document>> {
        match strategy {
            Strategy::Keyword => self.keyword_search(term).await,
            Strategy::Vector => self.vector_search(term).await,
            Strategy::FilteredVector => self.vector_search_with_filter(term).await,
            Strategy::GeneratedVector => self.vector_search_with_generated_vector(term).await,
            Strategy::HybridBoost => self.hybrid_search_with_boost(term).await,
            Strategy::HybridRrf => self.hybrid_search_with_rrf(term).await,
        }
    }

    /// Lexical match on the title field
    pub async fn keyword_search(&self, term: &str) -> Result<Vec<Document>> {
        let request = build_keyword(&self.settings.keyword_collection, term, self.settings.page_size);
        self.execute_and_map(Strategy::Keyword, request).await
    }

    /// kNN search with the term embedded by the engine
    pub async fn vector_search(&self, term: &str) -> Result<Vec<Document>> {
        let request = build_vector(
            &self.settings.vector_collection,
            term,
            &self.vector_params(),
            self.settings.page_size,
        );
        self.execute_and_map(Strategy::Vector, request).await
    }

    /// kNN search restricted to documents matching the filter term
    pub async fn vector_search_with_filter(&self, term: &str) -> Result<Vec<Document>> {
        let request = build_filtered_vector(
            &self.settings.vector_collection,
            term,
            &self.vector_params(),
            &self.settings.filter_term,
            self.settings.page_size,
        );
        self.execute_and_map(Strategy::FilteredVector, request).await
    }

    /// kNN search with the term embedded client-side.
    ///
    /// Issues one embedding call, then one search call. An embedding failure
    /// returns before any search is issued.
    pub async fn vector_search_with_generated_vector(&self, term: &str) -> Result<Vec<Document>> {
        let vector = self.embedder.embed(term).await?;
        debug!("Generated query vector with {} dimensions", vector.len());

        let request = build_vector_with_query_vector(
            &self.settings.vector_collection,
            vector,
            &self.vector_params(),
            self.settings.page_size,
        )?;
        self.execute_and_map(Strategy::GeneratedVector, request).await
    }

    /// Lexical and vector scores blended by query-time boosts
    pub async fn hybrid_search_with_boost(&self, term: &str) -> Result<Vec<Document>> {
        let request = build_hybrid_boost(
            &self.settings.vector_collection,
            term,
            &self.vector_params(),
            self.settings.hybrid_weights,
            self.settings.hybrid_page_size,
        );
        self.execute_and_map(Strategy::HybridBoost, request).await
    }

    /// Lexical and vector rankings fused by reciprocal rank
    pub async fn hybrid_search_with_rrf(&self, term: &str) -> Result<Vec<Document>> {
        let request = build_hybrid_rrf(
            &self.settings.vector_collection,
            term,
            &self.vector_params(),
            self.settings.rrf,
            self.settings.page_size,
        )?;
        self.execute_and_map(Strategy::HybridRrf, request).await
    }

    async fn execute_and_map(
        &self,
        strategy: Strategy,
        request: RetrievalRequest,
    ) -> Result<Vec<Document>> {
        let hits = self
            .backend
            .execute(&request)
            .await
            .map_err(SearchError::Execute)?;
        let documents = map_hits(hits)?;

        debug!(
            "{} search on {} returned {} documents",
            strategy,
            request.collection,
            documents.len()
        );
        Ok(documents)
    }
}
