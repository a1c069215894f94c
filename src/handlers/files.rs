//! Direct object access through presigned capability URLs.
//!
//! These routes carry no JWT; the query-string signature is the entire
//! authorization. Bad signatures, expired capabilities, and wrong methods
//! all collapse to the same 401; a query missing its parameters outright is
//! a 400 like any other malformed request.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::Query;
use crate::state::AppState;
use crate::store::StoreError;

#[derive(Debug, Deserialize)]
pub struct CapabilityQuery {
    pub expires: i64,
    pub sig: String,
}

/// GET /files/*key
pub async fn download(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<CapabilityQuery>,
) -> Result<Response, ApiError> {
    verify(&state, "GET", &key, &query)?;

    let object = state.store.get(&key).await.map_err(|e| match e {
        StoreError::NotFound(_) => ApiError::not_found(format!("File not found: {}", key)),
        other => other.into(),
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, object.content_type)],
        object.body,
    )
        .into_response())
}

/// PUT /files/*key
pub async fn upload(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<CapabilityQuery>,
    headers: axum::http::HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    verify(&state, "PUT", &key, &query)?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    state.store.put(&key, &content_type, body.to_vec()).await?;
    tracing::info!(key = %key, bytes = body.len(), "file uploaded");
    Ok(StatusCode::OK)
}

fn verify(state: &AppState, method: &str, key: &str, query: &CapabilityQuery) -> Result<(), ApiError> {
    if state.presigner.verify(method, key, query.expires, &query.sig) {
        Ok(())
    } else {
        tracing::debug!(key = %key, method = %method, "capability verification failed");
        Err(ApiError::unauthorized("Invalid or expired URL"))
    }
}
