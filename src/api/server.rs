//! API server for rodent-search

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

use crate::search::SearchStrategies;

use super::routes::{
    filtered_gophers, generated_vector_gophers, health_check, hybrid_gophers, index,
    keyword_gophers, rrf_gophers, vector_gophers, AppState,
};

/// Term searched when a route is hit without `?q=`
pub const DEFAULT_TERM: &str = "What do Gophers eat?";

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub default_term: String,
    /// No deadline means a hung upstream call hangs the request
    pub deadline: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: PathBuf::from("static"),
            default_term: DEFAULT_TERM.to_string(),
            deadline: None,
        }
    }
}

/// API server
pub struct ApiServer {
    config: ServerConfig,
    strategies: SearchStrategies,
}

impl ApiServer {
    pub fn new(config: ServerConfig, strategies: SearchStrategies) -> Self {
        Self { config, strategies }
    }

    /// Build the router with all strategy routes and static files
    pub fn router(&self) -> Router {
        let state = Arc::new(AppState {
            strategies: self.strategies.clone(),
            default_term: self.config.default_term.clone(),
            deadline: self.config.deadline,
        });

        Router::new()
            .route("/", get(index))
            .route("/health", get(health_check))
            .route("/gophers", get(keyword_gophers))
            .route("/vector-gophers", get(vector_gophers))
            .route("/embedding-vector-gophers", get(vector_gophers))
            .route("/filtered-gophers", get(filtered_gophers))
            .route("/generated-vector-gophers", get(generated_vector_gophers))
            .route("/hybrid-gophers", get(hybrid_gophers))
            .route("/rrf-gophers", get(rrf_gophers))
            .with_state(state)
            .nest_service("/static", ServeDir::new(&self.config.static_dir))
            .layer(CorsLayer::permissive())
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        let app = self.router();

        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
