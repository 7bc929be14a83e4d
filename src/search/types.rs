//! Common types for search module

use serde::{Deserialize, Serialize};

/// Dense vector field populated by the ingest inference pipeline
pub const DEFAULT_VECTOR_FIELD: &str = "text_embedding.predicted_value";

/// Field matched by lexical clauses
pub const TITLE_FIELD: &str = "title";

/// Field matched by the filtered vector strategy
pub const BODY_CONTENT_FIELD: &str = "body_content";

/// Collection queried by keyword search
pub const DEFAULT_KEYWORD_COLLECTION: &str = "search-rodents";

/// Collection carrying the vector field, queried by vector and hybrid strategies
pub const DEFAULT_VECTOR_COLLECTION: &str = "vector-search-rodents";

/// Document returned by every strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Engine-assigned identifier, never taken from the stored body
    pub id: String,
    pub title: String,
    pub url: String,
}

/// Query embedding, either produced client-side or captured for a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryVector(Vec<f32>);

impl QueryVector {
    pub fn new(components: Vec<f32>) -> Self {
        Self(components)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for QueryVector {
    fn from(components: Vec<f32>) -> Self {
        Self(components)
    }
}
