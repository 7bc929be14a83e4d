//! Environment configuration for the upstream clients

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::search::embedding::DEFAULT_HUGGING_FACE_URL;
use crate::search::{
    ElasticsearchClient, EmbeddingModel, HuggingFaceEmbedder, SearchStrategies, StrategySettings,
};

pub const ELASTIC_URL_VAR: &str = "ELASTIC_URL";
pub const ELASTIC_API_KEY_VAR: &str = "ELASTIC_API_KEY";
pub const HUGGING_FACE_TOKEN_VAR: &str = "HUGGING_FACE_TOKEN";
pub const HUGGING_FACE_URL_VAR: &str = "HUGGING_FACE_URL";

/// Search engine connection settings
#[derive(Debug, Clone)]
pub struct ElasticConfig {
    pub url: String,
    pub api_key: Option<String>,
}

/// Embedding service settings
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub url: String,
    pub token: Option<String>,
    pub model: EmbeddingModel,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub elastic: ElasticConfig,
    pub embedding: EmbeddingConfig,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a variable lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let url = get(ELASTIC_URL_VAR)
            .with_context(|| format!("{} is not set", ELASTIC_URL_VAR))?;

        Ok(Self {
            elastic: ElasticConfig {
                url,
                api_key: get(ELASTIC_API_KEY_VAR),
            },
            embedding: EmbeddingConfig {
                url: get(HUGGING_FACE_URL_VAR)
                    .unwrap_or_else(|| DEFAULT_HUGGING_FACE_URL.to_string()),
                token: get(HUGGING_FACE_TOKEN_VAR),
                model: EmbeddingModel::default(),
            },
        })
    }

    /// Construct the client handles and the strategy facade over them
    pub fn build_strategies(&self, settings: StrategySettings) -> SearchStrategies {
        let backend = ElasticsearchClient::new(&self.elastic.url, self.elastic.api_key.clone());
        let embedder = HuggingFaceEmbedder::with_config(
            &self.embedding.url,
            self.embedding.token.clone(),
            self.embedding.model.clone(),
        );

        SearchStrategies::new(Arc::new(backend), Arc::new(embedder), settings)
    }
}
