//! API routes for rodent-search

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::search::{SearchStrategies, Strategy};

/// Application state
pub struct AppState {
    pub strategies: SearchStrategies,
    /// Term used when a request carries no `q` parameter
    pub default_term: String,
    /// Upper bound on a strategy call, if any
    pub deadline: Option<Duration>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Query parameters accepted by every strategy route
#[derive(Debug, Default, Deserialize)]
pub struct TermQuery {
    pub q: Option<String>,
}

pub async fn index() -> &'static str {
    "Hi Gophers!"
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn keyword_gophers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TermQuery>,
) -> Response {
    run_strategy(&state, Strategy::Keyword, params).await
}

pub async fn vector_gophers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TermQuery>,
) -> Response {
    run_strategy(&state, Strategy::Vector, params).await
}

pub async fn filtered_gophers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TermQuery>,
) -> Response {
    run_strategy(&state, Strategy::FilteredVector, params).await
}

pub async fn generated_vector_gophers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TermQuery>,
) -> Response {
    run_strategy(&state, Strategy::GeneratedVector, params).await
}

pub async fn hybrid_gophers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TermQuery>,
) -> Response {
    run_strategy(&state, Strategy::HybridBoost, params).await
}

pub async fn rrf_gophers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TermQuery>,
) -> Response {
    run_strategy(&state, Strategy::HybridRrf, params).await
}

async fn run_strategy(state: &AppState, strategy: Strategy, params: TermQuery) -> Response {
    let term = params.q.unwrap_or_else(|| state.default_term.clone());
    let search = state.strategies.run(strategy, &term);

    let result = match state.deadline {
        Some(deadline) => match tokio::time::timeout(deadline, search).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} search exceeded deadline of {:?}", strategy, deadline);
                return (StatusCode::GATEWAY_TIMEOUT, "Gateway timeout").into_response();
            }
        },
        None => search.await,
    };

    match result {
        Ok(documents) => {
            info!("{} search: {} documents", strategy, documents.len());
            Json(documents).into_response()
        }
        Err(e) => {
            error!(stage = %e.stage(), "{} search failed: {}", strategy, e);
            internal_server_error()
        }
    }
}

fn internal_server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}
