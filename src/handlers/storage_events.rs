use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;

use crate::admission::UploadEvent;
use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EventBatch {
    pub events: Vec<UploadEvent>,
}

/// POST /storage/events
///
/// Entry point for object-created notifications from the store. Each event
/// runs the admission pipeline; the response reports per-object verdicts.
pub async fn process(
    State(state): State<AppState>,
    Json(batch): Json<EventBatch>,
) -> Result<Json<Value>, ApiError> {
    if batch.events.is_empty() {
        return Err(ApiError::invalid_request("No events in batch"));
    }

    let summary = state.admission.process(batch.events).await;
    Ok(Json(serde_json::to_value(summary)?))
}
