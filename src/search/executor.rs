//! Search engine access: one `_search` round trip per request

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::query::RetrievalRequest;
use crate::error::RetrievalError;

/// Hit record as returned by the engine, before mapping
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawHit {
    /// Engine-assigned identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Relevance score; absent for some rank modes
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    /// Stored document body, undecoded
    #[serde(rename = "_source", default)]
    pub body: serde_json::Value,
}

/// Sends a built request to the search engine
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Execute the request and return hits in engine relevance order.
    ///
    /// Failures are errors, never an empty list.
    async fn execute(&self, request: &RetrievalRequest) -> Result<Vec<RawHit>, RetrievalError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

/// Elasticsearch REST client
#[derive(Debug, Clone)]
pub struct ElasticsearchClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ElasticsearchClient {
    /// Create a client for the given endpoint. The handle is shared across
    /// calls and holds no per-request state.
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        info!("Initializing search engine client for {}", base_url);

        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    /// `_search` URL for a collection
    pub fn search_url(&self, collection: &str) -> String {
        format!("{}/{}/_search", self.base_url, collection)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchClient {
    async fn execute(&self, request: &RetrievalRequest) -> Result<Vec<RawHit>, RetrievalError> {
        let mut builder = self
            .client
            .post(self.search_url(&request.collection))
            .json(request);
        if let Some(ref api_key) = self.api_key {
            builder = builder.header(reqwest::header::AUTHORIZATION, format!("ApiKey {}", api_key));
        }
        let http_request = builder
            .build()
            .map_err(|e| RetrievalError::Request(e.to_string()))?;

        let response = self
            .client
            .execute(http_request)
            .await
            .map_err(RetrievalError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RetrievalError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(RetrievalError::Transport)?;
        let parsed: SearchResponse =
            serde_json::from_slice(&bytes).map_err(|e| RetrievalError::Decode(e.to_string()))?;

        debug!(
            "Search on {} returned {} hits",
            request.collection,
            parsed.hits.hits.len()
        );
        Ok(parsed.hits.hits)
    }
}
