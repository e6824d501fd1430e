//! Graph editing endpoints.

use axum::{body::Bytes, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use kgweave_core::{export_tuples as tuples_of, GraphContent, Triple};

use super::errors::{ApiError, ApiResult};
use crate::error::ServerError;
use crate::server::KgweaveServer;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct LayoutRequest {
    #[serde(default)]
    pub layout: String,
}

pub async fn get_graph(State(server): State<Arc<KgweaveServer>>) -> Json<GraphContent> {
    Json(server.session().content().await)
}

pub async fn generate(
    State(server): State<Arc<KgweaveServer>>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<Value>> {
    let outcome = server.session().generate(&request.prompt).await?;
    let mut body = serde_json::to_value(&outcome.content).map_err(ServerError::from)?;
    body["triplesAdded"] = json!(outcome.triples_added);
    body["merge"] = serde_json::to_value(outcome.merge).map_err(ServerError::from)?;
    Ok(Json(body))
}

/// Accepts a canonical document or an array of tuple records.
pub async fn import(State(server): State<Arc<KgweaveServer>>, body: Bytes) -> ApiResult<Json<Value>> {
    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::from(ServerError::MalformedImport(format!("not valid JSON: {}", e))))?;
    let merge = server.session().import(&value).await?;
    let content = server.session().content().await;
    Ok(Json(json!({ "ok": true, "merge": merge, "content": content })))
}

pub async fn export(State(server): State<Arc<KgweaveServer>>) -> Json<GraphContent> {
    Json(server.session().content().await)
}

pub async fn export_tuples(State(server): State<Arc<KgweaveServer>>) -> Json<Vec<Triple>> {
    let content = server.session().content().await;
    Json(tuples_of(&content.document()))
}

pub async fn clear(State(server): State<Arc<KgweaveServer>>) -> Json<Value> {
    server.session().clear().await;
    Json(json!({ "ok": true }))
}

pub async fn set_layout(
    State(server): State<Arc<KgweaveServer>>,
    Json(request): Json<LayoutRequest>,
) -> ApiResult<Json<Value>> {
    let layout = server.session().set_layout(&request.layout).await?;
    Ok(Json(json!({ "ok": true, "layout": layout, "displayName": layout.display_name() })))
}
