//! Post-upload file admission.
//!
//! Files land in the store through presigned URLs without passing through
//! the API body, so admission runs after the fact: each upload event is
//! fetched, inspected, and either tagged as passed or deleted. Checks run in
//! a fixed order and the first failure wins, so a given object always yields
//! the same verdict and reason.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::{ObjectStore, StoreError};

pub const MAX_CV_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_JD_BYTES: u64 = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "doc"];

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Patterns that have no business inside a CV or job description. Matched
/// case-insensitively against the raw bytes.
const DENYLIST: &[&str] = &["<script", "javascript:", "eval(", "<iframe", "<?php", "<%"];

/// One object-created notification from the store.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadEvent {
    pub bucket: String,
    pub key: String,
    pub size: u64,
}

/// Final disposition of one uploaded object.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    Rejected { reason: String },
    /// The pipeline itself failed (object unreadable, store error); the
    /// object is left untouched for a retry.
    Errored { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectResult {
    pub key: String,
    #[serde(flatten)]
    pub verdict: Verdict,
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub errored: usize,
    pub results: Vec<ObjectResult>,
}

pub struct Admission {
    store: Arc<dyn ObjectStore>,
}

impl Admission {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Process a batch of upload events. Objects are isolated from each
    /// other: one bad object never blocks the rest of the batch.
    pub async fn process(&self, events: Vec<UploadEvent>) -> BatchSummary {
        let mut results = Vec::with_capacity(events.len());
        let (mut accepted, mut rejected, mut errored) = (0, 0, 0);

        for event in &events {
            let verdict = self.admit(event).await;
            match &verdict {
                Verdict::Accepted => {
                    accepted += 1;
                    tracing::info!(key = %event.key, "file admitted");
                }
                Verdict::Rejected { reason } => {
                    rejected += 1;
                    tracing::warn!(key = %event.key, reason = %reason, "file rejected");
                }
                Verdict::Errored { error } => {
                    errored += 1;
                    tracing::error!(key = %event.key, "admission failed: {}", error);
                }
            }
            results.push(ObjectResult { key: event.key.clone(), verdict });
        }

        BatchSummary { accepted, rejected, errored, results }
    }

    async fn admit(&self, event: &UploadEvent) -> Verdict {
        // Extension and size come from the event alone; an oversized or
        // misnamed upload is rejected without ever downloading the body.
        let extension = match precheck(&event.key, event.size) {
            Ok(extension) => extension,
            Err(reason) => return self.reject(&event.key, reason).await,
        };

        let body = match self.store.get(&event.key).await {
            Ok(object) => object.body,
            Err(StoreError::NotFound(_)) => {
                return Verdict::Errored { error: "object no longer exists".to_string() }
            }
            Err(e) => return Verdict::Errored { error: e.to_string() },
        };

        match inspect_content(&event.key, extension, &body) {
            Ok(()) => {
                // Re-tagging is idempotent, so a tag failure is a warning on
                // an accepted file, not a pipeline error
                if let Err(e) = self
                    .store
                    .put_tags(&event.key, &[("validation_status".to_string(), "passed".to_string())])
                    .await
                {
                    tracing::warn!(key = %event.key, "could not tag accepted file: {}", e);
                }
                Verdict::Accepted
            }
            Err(reason) => self.reject(&event.key, reason).await,
        }
    }

    async fn reject(&self, key: &str, reason: String) -> Verdict {
        if let Err(e) = self.store.delete(key).await {
            return Verdict::Errored { error: format!("delete failed: {}", e) };
        }
        self.mark_record(key, &reason).await;
        Verdict::Rejected { reason }
    }

    /// Best effort: flag the record's metadata document with the failure
    /// reason so the rejection is visible on the record itself. A failure
    /// here never changes the verdict - the offending object is already
    /// gone.
    async fn mark_record(&self, key: &str, reason: &str) {
        let Some(slash) = key.rfind('/') else { return };
        let meta_key = format!("{}/meta.json", &key[..slash]);
        let tags = vec![
            ("validation_status".to_string(), "failed".to_string()),
            ("validation_reason".to_string(), truncate_tag_value(reason)),
        ];
        if let Err(e) = self.store.put_tags(&meta_key, &tags).await {
            tracing::warn!(key = %meta_key, "could not mark record after rejection: {}", e);
        }
    }
}

/// Object-store tag values are capped at 256 characters.
fn truncate_tag_value(value: &str) -> String {
    value.chars().take(256).collect()
}

/// Run every admission check against one object. Checks are ordered from
/// cheapest to most involved; the first failure is the verdict.
pub fn inspect(key: &str, size: u64, body: &[u8]) -> Result<(), String> {
    let extension = precheck(key, size)?;
    inspect_content(key, extension, body)
}

/// The checks that need nothing but the key and reported size.
fn precheck(key: &str, size: u64) -> Result<&'static str, String> {
    let extension = check_extension(key)?;
    check_size(key, size)?;
    Ok(extension)
}

/// The checks that need the object bytes.
fn inspect_content(key: &str, extension: &str, body: &[u8]) -> Result<(), String> {
    check_signature(extension, body)?;
    check_denylist(body)?;
    check_deep(key, extension, body)
}

fn check_extension(key: &str) -> Result<&'static str, String> {
    let name = key.rsplit('/').next().unwrap_or(key);
    let extension = name.rsplit('.').next().unwrap_or("");
    for allowed in ALLOWED_EXTENSIONS {
        if extension.eq_ignore_ascii_case(allowed) {
            return Ok(*allowed);
        }
    }
    Err(format!("extension not allowed: .{}", extension))
}

fn check_size(key: &str, size: u64) -> Result<(), String> {
    let limit = if key.contains("cv") { MAX_CV_BYTES } else { MAX_JD_BYTES };
    if size > limit {
        return Err(format!("file too large: {} bytes (limit {})", size, limit));
    }
    if size == 0 {
        return Err("file is empty".to_string());
    }
    Ok(())
}

fn check_signature(extension: &str, body: &[u8]) -> Result<(), String> {
    let ok = match extension {
        "pdf" => body.starts_with(PDF_MAGIC),
        "docx" => body.starts_with(ZIP_MAGIC),
        "doc" => body.starts_with(OLE_MAGIC),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(format!("content does not match declared type .{}", extension))
    }
}

fn check_denylist(body: &[u8]) -> Result<(), String> {
    let lowered = body.to_ascii_lowercase();
    for pattern in DENYLIST {
        if lowered
            .windows(pattern.len())
            .any(|window| window == pattern.as_bytes())
        {
            return Err(format!("suspicious content: {}", pattern));
        }
    }
    Ok(())
}

fn check_deep(key: &str, extension: &str, body: &[u8]) -> Result<(), String> {
    match extension {
        "pdf" => {
            // A PDF without a trailer is truncated or forged
            if !contains(body, b"%%EOF") {
                return Err("PDF is missing its end-of-file marker".to_string());
            }
            // Active content in PDFs is common enough in the wild that we
            // log it rather than reject outright
            for marker in [&b"/JavaScript"[..], b"/JS", b"/Launch", b"/SubmitForm"] {
                if contains(body, marker) {
                    tracing::warn!(
                        key = %key,
                        marker = %String::from_utf8_lossy(marker),
                        "PDF contains active content"
                    );
                }
            }
            Ok(())
        }
        "docx" => {
            // Macro-enabled documents are rejected outright
            if contains(body, b"vbaProject") || contains(body, b"macros/") {
                return Err("document contains macros".to_string());
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
