use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Logical bucket name reported in upload events.
    pub bucket: String,
    /// Base URL presigned capability URLs are issued against.
    pub public_base_url: String,
    /// Secret keying the capability-URL signatures.
    pub signing_secret: String,
    /// Lifetime of presigned read/write URLs, in seconds.
    pub presign_expiry_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub list_default_limit: usize,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub cors_origins: Vec<String>,
    pub admin_role: String,
}

/// Notification channel settings. A channel is enabled when its required
/// fields are all non-empty; core logic only sees the capability probe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub email_endpoint: String,
    pub email_api_key: String,
    pub email_sender: String,
    pub email_recipient: String,
    pub whatsapp_token: String,
    pub whatsapp_phone_number_id: String,
    pub whatsapp_recipient: String,
    pub sms_endpoint: String,
    pub sms_api_key: String,
    pub sms_origination_number: String,
    pub sms_recipient_number: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Environment presets first, specific env vars override
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Storage overrides
        if let Ok(v) = env::var("STORAGE_BUCKET") {
            self.storage.bucket = v;
        }
        if let Ok(v) = env::var("STORAGE_PUBLIC_BASE_URL") {
            self.storage.public_base_url = v;
        }
        if let Ok(v) = env::var("STORAGE_SIGNING_SECRET") {
            self.storage.signing_secret = v;
        }
        if let Ok(v) = env::var("PRESIGNED_URL_EXPIRY") {
            self.storage.presign_expiry_secs = v.parse().unwrap_or(self.storage.presign_expiry_secs);
        }

        // API overrides
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = v.parse().unwrap_or(self.api.rate_limit_requests);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs = v.parse().unwrap_or(self.api.rate_limit_window_secs);
        }
        if let Ok(v) = env::var("API_LIST_DEFAULT_LIMIT") {
            self.api.list_default_limit = v.parse().unwrap_or(self.api.list_default_limit);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_AUDIENCE") {
            self.security.jwt_audience = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_ISSUER") {
            self.security.jwt_issuer = v;
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_ADMIN_ROLE") {
            self.security.admin_role = v;
        }

        // Notification channels
        if let Ok(v) = env::var("NOTIFY_EMAIL_ENDPOINT") {
            self.notify.email_endpoint = v;
        }
        if let Ok(v) = env::var("NOTIFY_EMAIL_API_KEY") {
            self.notify.email_api_key = v;
        }
        if let Ok(v) = env::var("NOTIFY_EMAIL_SENDER") {
            self.notify.email_sender = v;
        }
        if let Ok(v) = env::var("NOTIFY_EMAIL_RECIPIENT") {
            self.notify.email_recipient = v;
        }
        if let Ok(v) = env::var("NOTIFY_WHATSAPP_TOKEN") {
            self.notify.whatsapp_token = v;
        }
        if let Ok(v) = env::var("NOTIFY_WHATSAPP_PHONE_NUMBER_ID") {
            self.notify.whatsapp_phone_number_id = v;
        }
        if let Ok(v) = env::var("NOTIFY_WHATSAPP_RECIPIENT") {
            self.notify.whatsapp_recipient = v;
        }
        if let Ok(v) = env::var("NOTIFY_SMS_ENDPOINT") {
            self.notify.sms_endpoint = v;
        }
        if let Ok(v) = env::var("NOTIFY_SMS_API_KEY") {
            self.notify.sms_api_key = v;
        }
        if let Ok(v) = env::var("NOTIFY_SMS_ORIGINATION_NUMBER") {
            self.notify.sms_origination_number = v;
        }
        if let Ok(v) = env::var("NOTIFY_SMS_RECIPIENT_NUMBER") {
            self.notify.sms_recipient_number = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            storage: StorageConfig {
                bucket: "jobtrack-dev".to_string(),
                public_base_url: "http://localhost:3000".to_string(),
                signing_secret: "dev-signing-secret".to_string(),
                presign_expiry_secs: 900,
            },
            api: ApiConfig {
                rate_limit_requests: 1000,
                rate_limit_window_secs: 60,
                list_default_limit: 100,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: "dev-jwt-secret".to_string(),
                jwt_audience: "jobtrack-api".to_string(),
                jwt_issuer: "jobtrack-dev".to_string(),
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                admin_role: "admin".to_string(),
            },
            notify: NotifyConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            storage: StorageConfig {
                bucket: "jobtrack-staging".to_string(),
                public_base_url: "https://staging.jobtrack.example".to_string(),
                signing_secret: String::new(),
                presign_expiry_secs: 900,
            },
            api: ApiConfig {
                rate_limit_requests: 20,
                rate_limit_window_secs: 60,
                list_default_limit: 100,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_audience: "jobtrack-api".to_string(),
                jwt_issuer: "jobtrack-staging".to_string(),
                cors_origins: vec!["https://staging.jobtrack.example".to_string()],
                admin_role: "admin".to_string(),
            },
            notify: NotifyConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            storage: StorageConfig {
                bucket: "jobtrack".to_string(),
                public_base_url: "https://jobtrack.example".to_string(),
                signing_secret: String::new(),
                presign_expiry_secs: 900,
            },
            api: ApiConfig {
                rate_limit_requests: 10,
                rate_limit_window_secs: 60,
                list_default_limit: 100,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_audience: "jobtrack-api".to_string(),
                jwt_issuer: "jobtrack".to_string(),
                cors_origins: vec!["https://app.jobtrack.example".to_string()],
                admin_role: "admin".to_string(),
            },
            notify: NotifyConfig::default(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_are_permissive() {
        let config = AppConfig::development();
        assert_eq!(config.api.rate_limit_requests, 1000);
        assert_eq!(config.storage.presign_expiry_secs, 900);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn production_defaults_require_explicit_secrets() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert!(config.storage.signing_secret.is_empty());
        assert_eq!(config.api.rate_limit_requests, 10);
    }
}
