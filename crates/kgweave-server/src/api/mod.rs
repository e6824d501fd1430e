//! API module for the kgweave server
//!
//! This module contains the API routes and handlers.

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod documents;
pub mod errors;
pub mod graph;
pub mod health;

use crate::server::KgweaveServer;

/// Build the router for API endpoints
pub fn build_router(server: Arc<KgweaveServer>) -> Router {
    Router::new()
        // Graph editing
        .route("/api/graph", get(graph::get_graph))
        .route("/api/graph/generate", post(graph::generate))
        .route("/api/graph/import", post(graph::import))
        .route("/api/graph/export", get(graph::export))
        .route("/api/graph/export/tuples", get(graph::export_tuples))
        .route("/api/graph/clear", post(graph::clear))
        .route("/api/graph/layout", put(graph::set_layout))
        // Document lifecycle
        .route("/api/documents", get(documents::list).post(documents::create))
        .route("/api/documents/latest/open", post(documents::open_latest))
        .route("/api/documents/:id", get(documents::open).put(documents::save))
        .route("/api/documents/:id/save-as", post(documents::save_as))
        .route("/api/documents/:id/undo", post(documents::undo))
        // Health check
        .route("/health", get(health::health_check))
        .layer(TraceLayer::new_for_http())
        // Shared state
        .with_state(server)
}
