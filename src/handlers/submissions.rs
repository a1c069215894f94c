use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::config;
use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::ident::{FileRole, RecordKind};
use crate::notify;
use crate::schema::SubmissionInput;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotesBody {
    pub notes: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadBody {
    pub role: Option<String>,
}

/// POST /recruiter-submissions (public, rate-limited)
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<SubmissionInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (created, record) = state.lifecycle.create_submission(input).await?;

    // Best-effort fan-out; channel failures never fail the create
    let notifications = notify::dispatch(&state.notifiers, &record).await;

    let mut body = serde_json::to_value(&created)?;
    body["notifications"] = json!(notifications);
    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /recruiter-submissions
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let items = state
        .lifecycle
        .list_submissions(query.status.as_deref(), query.limit)
        .await?;
    Ok(Json(json!({ "count": items.len(), "items": items })))
}

/// GET /recruiter-submissions/:id
///
/// Any authenticated caller may read a submission, but only admins see the
/// full record with download links; everyone else gets the sanitized view.
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let (record, files) = state.lifecycle.get_submission(&id).await?;

    if user.is_admin(&config::config().security) {
        let mut body = serde_json::to_value(&record)?;
        body["files"] = serde_json::to_value(&files)?;
        Ok(Json(body))
    } else {
        Ok(Json(record.sanitized()))
    }
}

/// PUT /recruiter-submissions/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Value>, ApiError> {
    let updated = state
        .lifecycle
        .update_submission_status(&id, &body.status, body.note)
        .await?;
    Ok(Json(serde_json::to_value(updated)?))
}

/// PUT /recruiter-submissions/:id/notes
pub async fn update_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<NotesBody>,
) -> Result<Json<Value>, ApiError> {
    let updated = state.lifecycle.update_submission_notes(&id, &body.notes).await?;
    Ok(Json(serde_json::to_value(updated)?))
}

/// DELETE /recruiter-submissions/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state
        .lifecycle
        .delete(RecordKind::RecruiterSubmission, &id)
        .await?;
    Ok(Json(serde_json::to_value(deleted)?))
}

/// POST /recruiter-submissions/:id/cv-upload
///
/// Body may name a role (`cv` or `job_description`); default is the CV. A
/// job-description role not yet on the record is registered before the URL
/// is issued.
pub async fn upload_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<UploadBody>>,
) -> Result<Json<Value>, ApiError> {
    let role = match body.and_then(|Json(b)| b.role) {
        None => FileRole::Cv,
        Some(raw) => FileRole::parse(&raw)
            .ok_or_else(|| ApiError::validation("role", "must be one of: cv, job_description"))?,
    };

    let url = state
        .lifecycle
        .upload_url(RecordKind::RecruiterSubmission, &id, role)
        .await?;
    Ok(Json(json!({ "id": id, "role": role.as_str(), "upload_url": url })))
}
