//! Search module for rodent-search
//!
//! Retrieval strategies over an Elasticsearch collection: keyword, vector,
//! filtered vector, generated-vector and two hybrid fusions (boost, RRF).

pub mod embedding;
pub mod executor;
pub mod mapper;
pub mod query;
pub mod strategies;
pub mod types;

pub use embedding::{EmbeddingModel, EmbeddingProvider, HuggingFaceEmbedder};
pub use executor::{ElasticsearchClient, RawHit, SearchBackend};
pub use mapper::map_hits;
pub use query::{HybridWeights, RetrievalRequest, RrfParams, VectorSource};
pub use strategies::{SearchStrategies, Strategy, StrategySettings};
pub use types::{Document, QueryVector};
