use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, AuthUser};
use crate::config;
use crate::error::ApiError;

/// JWT authentication middleware. Validates the bearer token and injects
/// [`AuthUser`] as a request extension. Every failure mode returns the same
/// generic 401 so probes learn nothing about which check failed; the real
/// reason goes to the log.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = match extract_bearer(&headers) {
        Ok(token) => token,
        Err(reason) => {
            tracing::debug!("auth rejected: {}", reason);
            return Err(unauthorized());
        }
    };

    let claims = match validate_jwt(token, &config::config().security) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("auth rejected: {}", e);
            return Err(unauthorized());
        }
    };

    request
        .extensions_mut()
        .insert(AuthUser { subject: claims.sub, role: claims.role });

    Ok(next.run(request).await)
}

/// Admin gate, layered after [`jwt_auth_middleware`] on admin-only routes.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(unauthorized)?;

    if !user.is_admin(&config::config().security) {
        tracing::debug!(subject = %user.subject, role = %user.role, "admin gate rejected");
        return Err(ApiError::forbidden("Admin access required"));
    }

    Ok(next.run(request).await)
}

fn unauthorized() -> ApiError {
    ApiError::unauthorized("Authentication required")
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing Authorization header")?;
    let value = value.to_str().map_err(|_| "non-ASCII Authorization header")?;
    let token = value.strip_prefix("Bearer ").ok_or("not a Bearer token")?;
    if token.trim().is_empty() {
        return Err("empty bearer token");
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert!(extract_bearer(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer tok.en.x"));
        assert_eq!(extract_bearer(&headers).unwrap(), "tok.en.x");
    }
}
