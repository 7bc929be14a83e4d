//! Query embedding through the Hugging Face feature-extraction API

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use super::types::QueryVector;
use crate::error::EmbeddingError;

/// Default hosted inference endpoint for feature extraction
pub const DEFAULT_HUGGING_FACE_URL: &str =
    "https://api-inference.huggingface.co/pipeline/feature-extraction";

/// Sentence-transformer shared by the engine-side and client-side paths
pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/msmarco-minilm-l-12-v3";

/// Output dimension of the default model
pub const DEFAULT_MODEL_DIMENSION: usize = 384;

/// Identity of the embedding model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingModel {
    /// Hub identifier, e.g. `sentence-transformers/msmarco-minilm-l-12-v3`
    pub hub_id: String,
    /// Expected vector length, if known
    pub dimension: Option<usize>,
}

impl EmbeddingModel {
    pub fn new(hub_id: impl Into<String>, dimension: Option<usize>) -> Self {
        Self {
            hub_id: hub_id.into(),
            dimension,
        }
    }

    /// Identifier of the same model once deployed into the search engine.
    ///
    /// Model import into Elasticsearch replaces `/` with `__`, so both names
    /// are derived from the hub id and cannot drift apart.
    pub fn deployed_id(&self) -> String {
        self.hub_id.replace('/', "__")
    }
}

impl Default for EmbeddingModel {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_ID, Some(DEFAULT_MODEL_DIMENSION))
    }
}

/// Converts query text into a dense vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single query text. One upstream call, no retries.
    async fn embed(&self, text: &str) -> Result<QueryVector, EmbeddingError>;

    /// Model the vectors come from
    fn model(&self) -> &EmbeddingModel;
}

/// Feature-extraction request body
#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a str,
    options: FeatureExtractionOptions,
}

#[derive(Debug, Serialize)]
struct FeatureExtractionOptions {
    wait_for_model: bool,
}

/// Embedding client for the Hugging Face inference API
#[derive(Debug, Clone)]
pub struct HuggingFaceEmbedder {
    client: Client,
    base_url: String,
    token: Option<String>,
    model: EmbeddingModel,
}

impl HuggingFaceEmbedder {
    /// Create a client for the default model on the hosted endpoint
    pub fn new(token: Option<String>) -> Self {
        Self::with_config(DEFAULT_HUGGING_FACE_URL, token, EmbeddingModel::default())
    }

    /// Create a client with a custom endpoint and model.
    ///
    /// No request timeout is set; callers bound latency with their own deadline.
    pub fn with_config(base_url: &str, token: Option<String>, model: EmbeddingModel) -> Self {
        info!("Initializing embedding client for model: {}", model.hub_id);

        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            model,
        }
    }

    /// Full URL of the model's feature-extraction pipeline
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, self.model.hub_id)
    }

    fn check_vector(&self, vector: Vec<f32>) -> Result<QueryVector, EmbeddingError> {
        if vector.is_empty() {
            return Err(EmbeddingError::EmptyVector);
        }
        if let Some(expected) = self.model.dimension {
            if vector.len() != expected {
                return Err(EmbeddingError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }
        Ok(QueryVector::new(vector))
    }
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbedder {
    async fn embed(&self, text: &str) -> Result<QueryVector, EmbeddingError> {
        let body = FeatureExtractionRequest {
            inputs: text,
            options: FeatureExtractionOptions {
                wait_for_model: true,
            },
        };

        let mut builder = self.client.post(self.endpoint()).json(&body);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }
        let request = builder
            .build()
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(EmbeddingError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(EmbeddingError::Transport)?;
        let vector: Vec<f32> =
            serde_json::from_slice(&bytes).map_err(|e| EmbeddingError::Decode(e.to_string()))?;

        debug!("Embedded query into {} dimensions", vector.len());
        self.check_vector(vector)
    }

    fn model(&self) -> &EmbeddingModel {
        &self.model
    }
}
