use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::ident::{FileRole, RecordKind};
use crate::schema::{ApplicationInput, ApplicationUpdate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

/// POST /applications
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ApplicationInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let created = state.lifecycle.create_application(input).await?;
    Ok((StatusCode::CREATED, Json(serde_json::to_value(created)?)))
}

/// GET /applications
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let items = state
        .lifecycle
        .list_applications(query.status.as_deref(), query.limit)
        .await?;
    Ok(Json(json!({ "count": items.len(), "items": items })))
}

/// GET /applications/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let (record, files) = state.lifecycle.get_application(&id).await?;
    let mut body = serde_json::to_value(&record)?;
    body["files"] = serde_json::to_value(&files)?;
    Ok(Json(body))
}

/// PUT /applications/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ApplicationUpdate>,
) -> Result<Json<Value>, ApiError> {
    let updated = state.lifecycle.update_application(&id, update).await?;
    Ok(Json(serde_json::to_value(updated)?))
}

/// DELETE /applications/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state.lifecycle.delete(RecordKind::Application, &id).await?;
    Ok(Json(serde_json::to_value(deleted)?))
}

/// POST /applications/:id/cv-upload-url
pub async fn cv_upload_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let url = state
        .lifecycle
        .upload_url(RecordKind::Application, &id, FileRole::Cv)
        .await?;
    Ok(Json(json!({ "id": id, "role": FileRole::Cv.as_str(), "upload_url": url })))
}
