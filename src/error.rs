//! Error types for the retrieval strategy layer
//!
//! Each stage of a strategy call (embedding, build, execute, map) has its own
//! error type. `SearchError` wraps them so callers can tell which stage failed.

use std::fmt;

use thiserror::Error;

/// Failure talking to the embedding service
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The HTTP request could not be constructed (bad URL, bad header value)
    #[error("Failed to build embedding request: {0}")]
    Request(String),

    /// The request never produced a response
    #[error("Embedding service unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Embedding service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a flat array of numbers
    #[error("Failed to decode embedding response: {0}")]
    Decode(String),

    /// The service returned an empty vector
    #[error("Embedding service returned an empty vector")]
    EmptyVector,

    /// The vector length does not match the model's dimensionality
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Invalid parameters for a strategy recipe
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Query vector is empty")]
    EmptyQueryVector,

    /// RRF can only fill a page if every input list is at least that deep
    #[error("RRF window size {window_size} is smaller than the page size {page_size}")]
    InsufficientRrfWindow { window_size: usize, page_size: usize },

    #[error("Hybrid boosts must be non-negative and sum to 1.0 (lexical {lexical}, vector {vector})")]
    InvalidBoosts { lexical: f32, vector: f32 },
}

/// Failure talking to the search engine
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Failed to build search request: {0}")]
    Request(String),

    #[error("Search engine unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Search engine returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode search response: {0}")]
    Decode(String),
}

/// A hit body could not be decoded into a `Document`
#[derive(Error, Debug)]
#[error("Failed to map hit {id}: {source}")]
pub struct MappingError {
    /// Engine-assigned identifier of the offending hit
    pub id: String,
    #[source]
    pub source: serde_json::Error,
}

/// Stage of a strategy call that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Embedding,
    Build,
    Execute,
    Map,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embedding => "embedding",
            Self::Build => "build",
            Self::Execute => "execute",
            Self::Map => "map",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every strategy operation, tagged with its stage
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("embedding stage failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("build stage failed: {0}")]
    Build(#[from] BuildError),

    #[error("execute stage failed: {0}")]
    Execute(#[from] RetrievalError),

    #[error("map stage failed: {0}")]
    Map(#[from] MappingError),
}

impl SearchError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Embedding(_) => Stage::Embedding,
            Self::Build(_) => Stage::Build,
            Self::Execute(_) => Stage::Execute,
            Self::Map(_) => Stage::Map,
        }
    }
}

/// Result type alias for strategy operations
pub type Result<T> = std::result::Result<T, SearchError>;
