//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use serde_json::Value;

use rodent_search::search::{
    EmbeddingModel, EmbeddingProvider, QueryVector, RawHit, RetrievalRequest, SearchBackend,
    SearchStrategies, StrategySettings,
};
use rodent_search::{EmbeddingError, RetrievalError};

pub fn hit(id: &str, body: Value) -> RawHit {
    RawHit {
        id: id.to_string(),
        score: Some(1.0),
        body,
    }
}

/// Backend returning canned hits and recording every request
#[derive(Default)]
pub struct RecordingBackend {
    hits: Vec<RawHit>,
    fail_with_status: Option<u16>,
    delay: Option<Duration>,
    requests: Mutex<Vec<RetrievalRequest>>,
}

impl RecordingBackend {
    pub fn with_hits(hits: Vec<RawHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<RetrievalRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchBackend for RecordingBackend {
    async fn execute(&self, request: &RetrievalRequest) -> Result<Vec<RawHit>, RetrievalError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = self.fail_with_status {
            return Err(RetrievalError::Status {
                status,
                body: "search_phase_execution_exception".to_string(),
            });
        }
        Ok(self.hits.clone())
    }
}

/// Embedder returning a fixed vector, or a fixed HTTP failure
pub struct StaticEmbedder {
    vector: Option<Vec<f32>>,
    status: u16,
    model: EmbeddingModel,
    calls: AtomicUsize,
}

impl StaticEmbedder {
    pub fn returning(vector: Vec<f32>) -> Self {
        Self {
            vector: Some(vector),
            status: 200,
            model: EmbeddingModel::default(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            vector: None,
            status,
            model: EmbeddingModel::default(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StaticEmbedder {
    async fn embed(&self, _text: &str) -> Result<QueryVector, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.vector {
            Some(ref vector) => Ok(QueryVector::new(vector.clone())),
            None => Err(EmbeddingError::Status {
                status: self.status,
                body: "Service Unavailable".to_string(),
            }),
        }
    }

    fn model(&self) -> &EmbeddingModel {
        &self.model
    }
}

pub fn strategies(
    backend: Arc<RecordingBackend>,
    embedder: Arc<StaticEmbedder>,
    settings: StrategySettings,
) -> SearchStrategies {
    SearchStrategies::new(backend, embedder, settings)
}

/// Serve a router on an ephemeral local port and return its base URL
pub async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
