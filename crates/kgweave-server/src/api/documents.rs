//! Document lifecycle endpoints: list, create, open, save, save-as, undo.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::errors::{ApiError, ApiResult};
use crate::server::KgweaveServer;

#[derive(Debug, Default, Deserialize)]
pub struct NameRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoRequest {
    #[serde(default)]
    pub timestamp_iso: Option<String>,
}

fn parse_timestamp(raw: Option<&str>) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("timestampIso is required".to_string()))?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ApiError::BadRequest(format!("timestampIso '{}' is not an ISO-8601 timestamp: {}", raw, e)))
}

pub async fn list(State(server): State<Arc<KgweaveServer>>) -> ApiResult<Json<Value>> {
    let files = server.session().list_documents().await?;
    Ok(Json(json!({ "ok": true, "files": files })))
}

pub async fn create(
    State(server): State<Arc<KgweaveServer>>,
    body: Option<Json<NameRequest>>,
) -> ApiResult<Json<Value>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let file = server.session().new_document(request.name).await?;
    Ok(Json(json!({ "ok": true, "file": file })))
}

pub async fn open(State(server): State<Arc<KgweaveServer>>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let (file, content) = server.session().open_document(&id).await?;
    Ok(Json(json!({ "ok": true, "file": file, "content": content })))
}

pub async fn open_latest(State(server): State<Arc<KgweaveServer>>) -> ApiResult<Json<Value>> {
    let (file, content) = server.session().open_latest().await?;
    Ok(Json(json!({ "ok": true, "file": file, "content": content })))
}

pub async fn save(State(server): State<Arc<KgweaveServer>>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let file = server.session().save(&id).await?;
    Ok(Json(json!({ "ok": true, "file": file })))
}

pub async fn save_as(
    State(server): State<Arc<KgweaveServer>>,
    Path(id): Path<String>,
    body: Option<Json<NameRequest>>,
) -> ApiResult<Json<Value>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let file = server.session().save_as(&id, request.name).await?;
    Ok(Json(json!({ "ok": true, "file": file })))
}

/// Restores the document to its latest revision at or before `timestampIso`.
pub async fn undo(
    State(server): State<Arc<KgweaveServer>>,
    Path(id): Path<String>,
    body: Option<Json<UndoRequest>>,
) -> ApiResult<Json<Value>> {
    let timestamp = parse_timestamp(body.as_ref().and_then(|Json(r)| r.timestamp_iso.as_deref()))?;
    let (outcome, content) = server.session().restore_to_time(&id, timestamp).await?;
    Ok(Json(json!({
        "ok": true,
        "restoredFromRevision": outcome.restored_from_revision,
        "file": outcome.record,
        "content": content,
    })))
}
