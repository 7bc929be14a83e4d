//! HTTP front end exposing each strategy as a route

pub mod routes;
pub mod server;

pub use routes::AppState;
pub use server::{ApiServer, ServerConfig};
