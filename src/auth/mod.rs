use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;

/// Token claims. `role` drives the admin gate; everything else is standard
/// registered claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub aud: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: String, role: String, security: &SecurityConfig, ttl_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            sub,
            role,
            aud: security.jwt_audience.clone(),
            iss: security.jwt_issuer.clone(),
            exp: (now + Duration::hours(ttl_hours)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Caller identity established by the auth middleware and injected as a
/// request extension.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub subject: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self, security: &SecurityConfig) -> bool {
        self.role == security.admin_role
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT secret is not configured")]
    MissingSecret,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Token validation failed: {0}")]
    TokenValidation(String),
}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }
    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Validate signature, expiry, audience, and issuer. Callers map every
/// failure to the same generic 401 so the response never reveals which check
/// tripped.
pub fn validate_jwt(token: &str, security: &SecurityConfig) -> Result<Claims, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }
    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[&security.jwt_audience]);
    validation.set_issuer(&[&security.jwt_issuer]);

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| JwtError::TokenValidation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn security() -> SecurityConfig {
        let mut s = AppConfig::from_env().security.clone();
        s.jwt_secret = "test-secret".to_string();
        s
    }

    #[test]
    fn round_trip_preserves_claims() {
        let security = security();
        let claims = Claims::new("alice".into(), "admin".into(), &security, 1);
        let token = generate_jwt(&claims, &security).unwrap();

        let decoded = validate_jwt(&token, &security).unwrap();
        assert_eq!(decoded.sub, "alice");
        assert_eq!(decoded.role, "admin");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let security = security();
        let claims = Claims::new("alice".into(), "admin".into(), &security, 1);
        let token = generate_jwt(&claims, &security).unwrap();

        let mut other = security.clone();
        other.jwt_secret = "different-secret".to_string();
        assert!(validate_jwt(&token, &other).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let security = security();
        let mut claims = Claims::new("alice".into(), "user".into(), &security, 1);
        claims.exp = (Utc::now() - Duration::hours(2)).timestamp();
        claims.iat = (Utc::now() - Duration::hours(3)).timestamp();
        let token = generate_jwt(&claims, &security).unwrap();
        assert!(validate_jwt(&token, &security).is_err());
    }

    #[test]
    fn wrong_audience_or_issuer_is_rejected() {
        let security = security();
        let mut claims = Claims::new("alice".into(), "user".into(), &security, 1);
        claims.aud = "someone-else".to_string();
        let token = generate_jwt(&claims, &security).unwrap();
        assert!(validate_jwt(&token, &security).is_err());

        let mut claims = Claims::new("alice".into(), "user".into(), &security, 1);
        claims.iss = "rogue-issuer".to_string();
        let token = generate_jwt(&claims, &security).unwrap();
        assert!(validate_jwt(&token, &security).is_err());
    }

    #[test]
    fn empty_secret_refuses_both_directions() {
        let mut security = security();
        security.jwt_secret = String::new();
        let claims = Claims::new("alice".into(), "user".into(), &security, 1);
        assert!(matches!(generate_jwt(&claims, &security), Err(JwtError::MissingSecret)));
        assert!(matches!(validate_jwt("x.y.z", &security), Err(JwtError::MissingSecret)));
    }
}
