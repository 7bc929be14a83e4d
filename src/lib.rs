pub mod api;
pub mod config;
pub mod error;
pub mod search;

pub use api::ApiServer;
pub use config::Config;
pub use error::{BuildError, EmbeddingError, MappingError, RetrievalError, SearchError, Stage};
pub use search::{
    Document, ElasticsearchClient, EmbeddingModel, EmbeddingProvider, HuggingFaceEmbedder,
    QueryVector, RawHit, SearchBackend, SearchStrategies, Strategy, StrategySettings,
};
