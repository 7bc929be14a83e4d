//! Mapping of raw hits into `Document`s

use serde::Deserialize;
use tracing::debug;

use super::executor::RawHit;
use super::types::Document;
use crate::error::MappingError;

/// Stored body fields we read. Any `id` in the body is ignored.
#[derive(Debug, Deserialize)]
struct DocumentBody {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
}

/// Map hits into documents, keeping the engine's order.
///
/// The first undecodable body aborts the whole batch.
pub fn map_hits(hits: Vec<RawHit>) -> Result<Vec<Document>, MappingError> {
    hits.into_iter().map(map_hit).collect()
}

fn map_hit(hit: RawHit) -> Result<Document, MappingError> {
    let RawHit { id, score, body } = hit;

    let body: DocumentBody = match serde_json::from_value(body) {
        Ok(body) => body,
        Err(source) => return Err(MappingError { id, source }),
    };

    debug!("Mapped hit {} (score: {:?})", id, score);
    Ok(Document {
        id,
        title: body.title,
        url: body.url,
    })
}
