// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::ident::IdentError;
use crate::store::StoreError;
use crate::validate::FieldError;

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Every response body, success or failure, is a JSON object; errors always
/// carry `{"error": <kind>, "message": <human string>}`.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    ValidationError { field: String, message: String },
    InvalidRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 429 Too Many Requests
    RateLimitExceeded { retry_after_secs: u64 },

    // 500 Internal Server Error
    StoreError(String),
    InternalError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error kind string carried in the response body.
    pub fn error_kind(&self) -> &'static str {
        match self {
            ApiError::ValidationError { .. } => "ValidationError",
            ApiError::InvalidRequest(_) => "InvalidRequest",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::NotFound(_) => "NotFound",
            ApiError::RateLimitExceeded { .. } => "RateLimitExceeded",
            ApiError::StoreError(_) => "StoreError",
            ApiError::InternalError(_) => "InternalError",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::ValidationError { field, message } => format!("{}: {}", field, message),
            ApiError::InvalidRequest(msg) => msg.clone(),
            ApiError::Unauthorized(msg) => msg.clone(),
            ApiError::Forbidden(msg) => msg.clone(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::RateLimitExceeded { retry_after_secs } => {
                format!("Rate limit exceeded, retry in {} seconds", retry_after_secs)
            }
            ApiError::StoreError(msg) => msg.clone(),
            ApiError::InternalError(msg) => msg.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ApiError::RateLimitExceeded { retry_after_secs } => json!({
                "error": self.error_kind(),
                "message": self.message(),
                "retry_after_seconds": retry_after_secs,
            }),
            _ => json!({
                "error": self.error_kind(),
                "message": self.message(),
            }),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError { field: field.into(), message: message.into() }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        ApiError::InvalidRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::InternalError(message.into())
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        ApiError::ValidationError { field: err.field, message: err.reason }
    }
}

impl From<IdentError> for ApiError {
    fn from(err: IdentError) -> Self {
        // Malformed ids double as traversal attempts; treat as bad input
        ApiError::InvalidRequest(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => ApiError::NotFound(format!("Object not found: {}", key)),
            StoreError::Backend(msg) => {
                // Log the real error but keep the response message short
                tracing::error!("store backend error: {}", msg);
                ApiError::StoreError("Storage operation failed".to_string())
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {}", err);
        ApiError::InternalError("Failed to process document".to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let retry_after = match &self {
            ApiError::RateLimitExceeded { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };
        let mut response = (status, Json(self.to_json())).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = secs.to_string().parse() {
                response.headers_mut().insert(axum::http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_bodies_carry_kind_and_message() {
        let err = ApiError::validation("job_title", "is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = err.to_json();
        assert_eq!(body["error"], "ValidationError");
        assert_eq!(body["message"], "job_title: is required");
    }

    #[test]
    fn rate_limit_carries_retry_after() {
        let err = ApiError::RateLimitExceeded { retry_after_secs: 42 };
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.to_json()["retry_after_seconds"], 42);
    }

    #[test]
    fn store_not_found_maps_to_404() {
        let err: ApiError = StoreError::NotFound("a/b".into()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_kind(), "NotFound");
    }
}
