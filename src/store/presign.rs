//! Time-limited capability URLs for direct object access.
//!
//! A presigned URL grants method-scoped access to exactly one key until its
//! expiry, without further authentication. The signature is a keyed SHA-256
//! over `method \n key \n expires-at`, carried as query parameters and
//! verified by the file-serving endpoints.

use chrono::Utc;
use sha2::{Digest, Sha256};

/// A signed, expiring URL plus its remaining lifetime in seconds.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_in: u64,
}

#[derive(Clone)]
pub struct Presigner {
    base_url: String,
    secret: String,
    expiry_secs: u64,
}

impl Presigner {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>, expiry_secs: u64) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
            expiry_secs,
        }
    }

    pub fn expiry_secs(&self) -> u64 {
        self.expiry_secs
    }

    fn signature(&self, method: &str, key: &str, expires_at: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b"\n");
        hasher.update(method.as_bytes());
        hasher.update(b"\n");
        hasher.update(key.as_bytes());
        hasher.update(b"\n");
        hasher.update(expires_at.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    fn sign(&self, method: &str, key: &str) -> PresignedUrl {
        let expires_at = Utc::now().timestamp() + self.expiry_secs as i64;
        let sig = self.signature(method, key, expires_at);
        PresignedUrl {
            url: format!("{}/files/{}?expires={}&sig={}", self.base_url, key, expires_at, sig),
            expires_in: self.expiry_secs,
        }
    }

    /// Issue a read capability for `key`.
    pub fn presign_get(&self, key: &str) -> PresignedUrl {
        self.sign("GET", key)
    }

    /// Issue a write capability for `key`.
    pub fn presign_put(&self, key: &str) -> PresignedUrl {
        self.sign("PUT", key)
    }

    /// Verify a capability's signature and expiry for the given method+key.
    pub fn verify(&self, method: &str, key: &str, expires_at: i64, sig: &str) -> bool {
        if Utc::now().timestamp() > expires_at {
            return false;
        }
        let expected = self.signature(method, key, expires_at);
        // Hex strings are fixed-length; compare byte-wise without early exit
        if expected.len() != sig.len() {
            return false;
        }
        expected
            .bytes()
            .zip(sig.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}
