//! Health check endpoint for the kgweave server

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::server::KgweaveServer;

/// Health check handler
///
/// Reports the server version and whether the document store answers.
/// An unreachable store degrades the service but does not take it down,
/// since graph editing keeps working without it.
pub async fn health_check(State(server): State<Arc<KgweaveServer>>) -> impl IntoResponse {
    debug!("Health check requested");

    let store_up = matches!(server.check_document_store_health().await, Ok(true));
    let store_status = if store_up { "UP" } else { "DOWN" };

    let response = json!({
        "status": if store_up { "UP" } else { "DEGRADED" },
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "documentStore": { "status": store_status },
        },
    });

    (StatusCode::OK, Json(response))
}
