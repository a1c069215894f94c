//! Record lifecycle orchestration.
//!
//! All CRUD operations over the metadata documents flow through here. The
//! store is the single source of truth: a record exists exactly when its
//! `meta.json` document does, and files attached to it live and die under the
//! same address prefix.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::ident::{generate_id, FileRole, RecordAddress, RecordKind};
use crate::schema::{
    ApplicationInput, ApplicationRecord, ApplicationSummary, ApplicationUpdate, SubmissionInput,
    SubmissionRecord, SubmissionStatus, SubmissionSummary,
};
use crate::store::{ObjectStore, PresignedUrl, Presigner, StoreError};
use crate::validate::{optional_string, required_string};

/// Hard ceiling on list results regardless of the requested limit.
pub const LIST_HARD_CAP: usize = 1000;

/// Outcome of a create operation: the new id plus write capabilities for the
/// record's declared file roles.
#[derive(Debug, Serialize)]
pub struct CreatedRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub upload_urls: BTreeMap<&'static str, PresignedUrl>,
}

/// Outcome of an update-style operation.
#[derive(Debug, Serialize)]
pub struct UpdatedRecord {
    pub id: String,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a delete: number of objects removed under the record prefix.
#[derive(Debug, Serialize)]
pub struct DeletedRecord {
    pub id: String,
    pub objects_deleted: usize,
}

/// Download links for a record's file roles; roles with no uploaded object
/// yield `None` rather than an error.
pub type FileLinks = BTreeMap<String, Option<PresignedUrl>>;

pub struct Lifecycle {
    store: Arc<dyn ObjectStore>,
    presigner: Presigner,
    list_default_limit: usize,
}

impl Lifecycle {
    pub fn new(store: Arc<dyn ObjectStore>, presigner: Presigner, list_default_limit: usize) -> Self {
        Self { store, presigner, list_default_limit }
    }

    /// Parse an id and pin it to the kind the route serves. An id of the
    /// wrong kind is a 404, not a validation error: the record genuinely does
    /// not exist under this route's namespace.
    fn resolve(&self, kind: RecordKind, id: &str) -> Result<RecordAddress, ApiError> {
        let addr = RecordAddress::parse(id)?;
        if addr.kind != kind {
            return Err(not_found(kind, id));
        }
        Ok(addr)
    }

    async fn read_meta<T: DeserializeOwned>(&self, addr: &RecordAddress) -> Result<T, ApiError> {
        let object = self.store.get(&addr.meta_key()).await.map_err(|e| match e {
            StoreError::NotFound(_) => not_found(addr.kind, &addr.id),
            other => other.into(),
        })?;
        serde_json::from_slice(&object.body).map_err(|e| {
            tracing::error!("corrupt metadata document at {}: {}", addr.meta_key(), e);
            ApiError::internal("Stored record is unreadable")
        })
    }

    async fn write_meta<T: Serialize>(&self, addr: &RecordAddress, record: &T) -> Result<(), ApiError> {
        let body = serde_json::to_vec_pretty(record)?;
        self.store.put(&addr.meta_key(), "application/json", body).await?;
        Ok(())
    }

    // ========================================
    // Create
    // ========================================

    /// Create an application: validate, assign id and address, write the
    /// metadata document, then issue a CV write capability. The metadata
    /// write either fully succeeds or the operation fails before any URL is
    /// issued.
    pub async fn create_application(
        &self,
        input: ApplicationInput,
    ) -> Result<CreatedRecord, ApiError> {
        let id = generate_id(RecordKind::Application);
        let addr = RecordAddress::parse(&id)?;
        let now = Utc::now();

        let mut file_refs = BTreeMap::new();
        file_refs.insert(FileRole::Cv.as_str().to_string(), addr.file_key(FileRole::Cv));

        let record = input.into_record(id.clone(), now, file_refs)?;
        self.write_meta(&addr, &record).await?;

        tracing::info!(id = %id, "created application");

        let mut upload_urls = BTreeMap::new();
        upload_urls.insert(FileRole::Cv.as_str(), self.presigner.presign_put(&addr.file_key(FileRole::Cv)));

        Ok(CreatedRecord { id, created_at: now, upload_urls })
    }

    /// Create a recruiter submission. The CV reference is declared up front;
    /// a job-description reference can be registered later through
    /// [`Lifecycle::upload_url`].
    pub async fn create_submission(
        &self,
        input: SubmissionInput,
    ) -> Result<(CreatedRecord, SubmissionRecord), ApiError> {
        let id = generate_id(RecordKind::RecruiterSubmission);
        let addr = RecordAddress::parse(&id)?;
        let now = Utc::now();

        let mut file_refs = BTreeMap::new();
        file_refs.insert(FileRole::Cv.as_str().to_string(), addr.file_key(FileRole::Cv));

        let record = input.into_record(id.clone(), now, file_refs)?;
        self.write_meta(&addr, &record).await?;

        tracing::info!(id = %id, company = %record.job.company, "created submission");

        let mut upload_urls = BTreeMap::new();
        upload_urls.insert(FileRole::Cv.as_str(), self.presigner.presign_put(&addr.file_key(FileRole::Cv)));

        Ok((CreatedRecord { id, created_at: now, upload_urls }, record))
    }

    // ========================================
    // Read
    // ========================================

    pub async fn get_application(
        &self,
        id: &str,
    ) -> Result<(ApplicationRecord, FileLinks), ApiError> {
        let addr = self.resolve(RecordKind::Application, id)?;
        let record: ApplicationRecord = self.read_meta(&addr).await?;
        let files = self.file_links(&record.file_refs).await;
        Ok((record, files))
    }

    pub async fn get_submission(
        &self,
        id: &str,
    ) -> Result<(SubmissionRecord, FileLinks), ApiError> {
        let addr = self.resolve(RecordKind::RecruiterSubmission, id)?;
        let record: SubmissionRecord = self.read_meta(&addr).await?;
        let files = self.file_links(&record.file_refs).await;
        Ok((record, files))
    }

    /// For each populated file reference, probe existence and issue a read
    /// capability; absent files yield null rather than an error.
    async fn file_links(&self, file_refs: &BTreeMap<String, String>) -> FileLinks {
        let mut links = FileLinks::new();
        for (role, key) in file_refs {
            let link = match self.store.head(key).await {
                Ok(_) => Some(self.presigner.presign_get(key)),
                Err(StoreError::NotFound(_)) => None,
                Err(e) => {
                    tracing::warn!(key = %key, "existence probe failed: {}", e);
                    None
                }
            };
            links.insert(role.clone(), link);
        }
        links
    }

    // ========================================
    // List
    // ========================================

    /// List applications, optionally filtered by status, newest first.
    ///
    /// Enumeration walks partitions (years) in store order and stops as soon
    /// as the cap is reached, so records beyond the cap in
    /// not-yet-enumerated partitions are simply not read; only the records
    /// actually read are sorted. Unparseable metadata documents are skipped
    /// with a warning - partial results beat total failure.
    pub async fn list_applications(
        &self,
        status: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ApplicationSummary>, ApiError> {
        let status = match status {
            Some(s) => Some(crate::schema::ApplicationStatus::parse("status", s)?),
            None => None,
        };
        let mut summaries = self
            .scan_partitions(RecordKind::Application, limit, |record: &ApplicationRecord| {
                match status {
                    Some(s) if record.status != s => None,
                    _ => Some(ApplicationSummary::from(record)),
                }
            })
            .await?;
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    /// List submissions, optionally filtered by status, newest first. Same
    /// cap and partial-enumeration semantics as application listing.
    pub async fn list_submissions(
        &self,
        status: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<SubmissionSummary>, ApiError> {
        let status = match status {
            Some(s) => Some(SubmissionStatus::parse("status", s)?),
            None => None,
        };
        let mut summaries = self
            .scan_partitions(RecordKind::RecruiterSubmission, limit, |record: &SubmissionRecord| {
                match status {
                    Some(s) if record.status != s => None,
                    _ => Some(SubmissionSummary::from(record)),
                }
            })
            .await?;
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    /// Range-enumerate the store with delimiter grouping: first level is the
    /// partition year, second level the record folder. `project` filters and
    /// projects each successfully parsed record.
    async fn scan_partitions<T, R, F>(
        &self,
        kind: RecordKind,
        limit: Option<usize>,
        project: F,
    ) -> Result<Vec<R>, ApiError>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> Option<R>,
    {
        let limit = limit.unwrap_or(self.list_default_limit).min(LIST_HARD_CAP);
        let root = format!("{}/", kind.root());
        let mut out = Vec::new();
        if limit == 0 {
            return Ok(out);
        }

        'years: for year_prefix in self.store.list_dirs(&root).await? {
            for folder in self.store.list_dirs(&year_prefix).await? {
                let meta_key = format!("{}meta.json", folder);
                let object = match self.store.get(&meta_key).await {
                    Ok(o) => o,
                    Err(e) => {
                        tracing::warn!(key = %meta_key, "could not read metadata: {}", e);
                        continue;
                    }
                };
                let record: T = match serde_json::from_slice(&object.body) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(key = %meta_key, "skipping unparseable metadata: {}", e);
                        continue;
                    }
                };
                if let Some(projected) = project(&record) {
                    out.push(projected);
                    if out.len() >= limit {
                        break 'years;
                    }
                }
            }
        }

        Ok(out)
    }

    // ========================================
    // Update
    // ========================================

    /// Apply an allow-listed partial update. Unknown fields in the payload
    /// were already dropped at deserialization; sub-objects present in the
    /// payload replace the stored ones wholesale.
    pub async fn update_application(
        &self,
        id: &str,
        update: ApplicationUpdate,
    ) -> Result<UpdatedRecord, ApiError> {
        let addr = self.resolve(RecordKind::Application, id)?;
        let mut record: ApplicationRecord = self.read_meta(&addr).await?;

        let now = Utc::now();
        update.apply(&mut record, now)?;
        self.write_meta(&addr, &record).await?;

        tracing::info!(id = %id, "updated application");
        Ok(UpdatedRecord { id: id.to_string(), updated_at: now })
    }

    /// Transition a submission's status, appending a contact-history entry
    /// only when the value actually changes.
    pub async fn update_submission_status(
        &self,
        id: &str,
        new_status: &str,
        note: Option<String>,
    ) -> Result<UpdatedRecord, ApiError> {
        let status = SubmissionStatus::parse("status", new_status)?;
        let note = note.unwrap_or_default();
        optional_string("note", &note, 1000)?;

        let addr = self.resolve(RecordKind::RecruiterSubmission, id)?;
        let mut record: SubmissionRecord = self.read_meta(&addr).await?;

        let now = Utc::now();
        record.apply_status(status, note, now);
        self.write_meta(&addr, &record).await?;

        tracing::info!(id = %id, status = %status.as_str(), "updated submission status");
        Ok(UpdatedRecord { id: id.to_string(), updated_at: now })
    }

    pub async fn update_submission_notes(
        &self,
        id: &str,
        notes: &str,
    ) -> Result<UpdatedRecord, ApiError> {
        required_string("notes", notes, 5000)?;

        let addr = self.resolve(RecordKind::RecruiterSubmission, id)?;
        let mut record: SubmissionRecord = self.read_meta(&addr).await?;

        let now = Utc::now();
        record.admin_notes = notes.to_string();
        record.updated_at = now;
        self.write_meta(&addr, &record).await?;

        Ok(UpdatedRecord { id: id.to_string(), updated_at: now })
    }

    // ========================================
    // Delete
    // ========================================

    /// Delete a record by removing every object under its address prefix.
    /// Not transactional: a crash mid-delete can leave a partial record, but
    /// retrying re-lists whatever remains, so Delete converges.
    pub async fn delete(&self, kind: RecordKind, id: &str) -> Result<DeletedRecord, ApiError> {
        let addr = self.resolve(kind, id)?;
        let keys = self.store.list_keys(&addr.prefix()).await?;
        if keys.is_empty() {
            return Err(not_found(kind, id));
        }
        let deleted = self.store.delete_many(&keys).await?;
        tracing::info!(id = %id, objects = deleted, "deleted record");
        Ok(DeletedRecord { id: id.to_string(), objects_deleted: deleted })
    }

    // ========================================
    // Upload URLs
    // ========================================

    /// Issue a fresh write capability for a file role. Existence is checked
    /// with a lightweight probe of the metadata document, not a full read;
    /// a role not yet present in `file_refs` is registered first (metadata
    /// update before the URL is returned).
    pub async fn upload_url(
        &self,
        kind: RecordKind,
        id: &str,
        role: FileRole,
    ) -> Result<PresignedUrl, ApiError> {
        if kind == RecordKind::Application && role != FileRole::Cv {
            return Err(ApiError::invalid_request("Applications only carry a cv file"));
        }

        let addr = self.resolve(kind, id)?;
        self.store.head(&addr.meta_key()).await.map_err(|e| match e {
            StoreError::NotFound(_) => not_found(kind, id),
            other => other.into(),
        })?;

        let key = addr.file_key(role);

        // Register a newly-declared file role on the record before handing
        // out the capability.
        if kind == RecordKind::RecruiterSubmission {
            let mut record: SubmissionRecord = self.read_meta(&addr).await?;
            if !record.file_refs.contains_key(role.as_str()) {
                record.file_refs.insert(role.as_str().to_string(), key.clone());
                record.updated_at = Utc::now();
                self.write_meta(&addr, &record).await?;
            }
        }

        Ok(self.presigner.presign_put(&key))
    }
}

fn not_found(kind: RecordKind, id: &str) -> ApiError {
    let noun = match kind {
        RecordKind::Application => "Application",
        RecordKind::RecruiterSubmission => "Submission",
    };
    ApiError::not_found(format!("{} not found: {}", noun, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn lifecycle() -> (Arc<MemoryStore>, Lifecycle) {
        let store = Arc::new(MemoryStore::new());
        let presigner = Presigner::new("http://localhost:3000", "test-secret", 900);
        (store.clone(), Lifecycle::new(store, presigner, 100))
    }

    fn application_input(title: &str, status: &str) -> ApplicationInput {
        serde_json::from_value(json!({ "job_title": title, "status": status })).unwrap()
    }

    fn submission_input() -> SubmissionInput {
        serde_json::from_value(json!({
            "recruiter": {"name": "Aisha", "email": "aisha@agency.example"},
            "job": {"title": "Backend Engineer", "company": "Acme"}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_then_get_returns_declared_fields() {
        let (_, lc) = lifecycle();
        let created = lc
            .create_application(application_input("Platform Engineer", "applied"))
            .await
            .unwrap();
        assert!(created.upload_urls.contains_key("cv"));

        let (record, files) = lc.get_application(&created.id).await.unwrap();
        assert_eq!(record.job_title, "Platform Engineer");
        assert_eq!(record.id, created.id);
        assert_eq!(record.created_at, record.updated_at);
        // Declared but not yet uploaded: null link, not an error
        assert!(files.get("cv").unwrap().is_none());
    }

    #[tokio::test]
    async fn get_unknown_or_malformed_id() {
        let (_, lc) = lifecycle();
        let err = lc.get_application("app_2025-01-01_00000000").await.unwrap_err();
        assert_eq!(err.error_kind(), "NotFound");

        let err = lc.get_application("../../etc/passwd").await.unwrap_err();
        assert_eq!(err.error_kind(), "InvalidRequest");

        // A submission id under the application route is a 404
        let err = lc.get_submission("app_2025-01-01_00000000").await.unwrap_err();
        assert_eq!(err.error_kind(), "NotFound");
    }

    #[tokio::test]
    async fn uploaded_file_yields_download_link() {
        let (store, lc) = lifecycle();
        let created = lc
            .create_application(application_input("Engineer", "applied"))
            .await
            .unwrap();
        let addr = RecordAddress::parse(&created.id).unwrap();
        store
            .put(&addr.file_key(FileRole::Cv), "application/pdf", b"%PDF-1.7".to_vec())
            .await
            .unwrap();

        let (_, files) = lc.get_application(&created.id).await.unwrap();
        let link = files.get("cv").unwrap().as_ref().unwrap();
        assert!(link.url.contains("cv.pdf"));
        assert_eq!(link.expires_in, 900);
    }

    #[tokio::test]
    async fn update_ignores_unknown_fields_and_bumps_updated_at() {
        let (_, lc) = lifecycle();
        let created = lc
            .create_application(application_input("Engineer", "applied"))
            .await
            .unwrap();

        let update: ApplicationUpdate = serde_json::from_value(json!({
            "status": "offer",
            "unauthorized_field": "x"
        }))
        .unwrap();
        lc.update_application(&created.id, update).await.unwrap();

        let (record, _) = lc.get_application(&created.id).await.unwrap();
        assert_eq!(record.status.as_str(), "offer");
        assert!(record.updated_at >= record.created_at);
        let raw = serde_json::to_value(&record).unwrap();
        assert!(raw.get("unauthorized_field").is_none());
    }

    #[tokio::test]
    async fn status_history_appends_only_on_change() {
        let (_, lc) = lifecycle();
        let (created, _) = lc.create_submission(submission_input()).await.unwrap();

        lc.update_submission_status(&created.id, "contacted", Some("call".into())).await.unwrap();
        lc.update_submission_status(&created.id, "contacted", Some("again".into())).await.unwrap();
        lc.update_submission_status(&created.id, "cv_sent", None).await.unwrap();

        let (record, _) = lc.get_submission(&created.id).await.unwrap();
        assert_eq!(record.contact_history.len(), 2);
        assert_eq!(record.contact_history[0].new_status, SubmissionStatus::Contacted);
        assert_eq!(record.contact_history[1].old_status, SubmissionStatus::Contacted);
        assert_eq!(record.contact_history[1].new_status, SubmissionStatus::CvSent);

        let err = lc.update_submission_status(&created.id, "bogus", None).await.unwrap_err();
        assert_eq!(err.error_kind(), "ValidationError");
    }

    #[tokio::test]
    async fn delete_is_idempotent_via_not_found() {
        let (store, lc) = lifecycle();
        let created = lc
            .create_application(application_input("Engineer", "applied"))
            .await
            .unwrap();
        let addr = RecordAddress::parse(&created.id).unwrap();
        store
            .put(&addr.file_key(FileRole::Cv), "application/pdf", b"%PDF-1.7".to_vec())
            .await
            .unwrap();

        let deleted = lc.delete(RecordKind::Application, &created.id).await.unwrap();
        assert_eq!(deleted.objects_deleted, 2); // meta.json + cv.pdf

        let err = lc.delete(RecordKind::Application, &created.id).await.unwrap_err();
        assert_eq!(err.error_kind(), "NotFound");
    }

    #[tokio::test]
    async fn list_filters_caps_and_sorts_descending() {
        let (_, lc) = lifecycle();
        for i in 0..6 {
            let status = if i % 2 == 0 { "applied" } else { "rejected" };
            lc.create_application(application_input(&format!("Job {}", i), status)).await.unwrap();
        }

        let all = lc.list_applications(None, None).await.unwrap();
        assert_eq!(all.len(), 6);
        for pair in all.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }

        let applied = lc.list_applications(Some("applied"), None).await.unwrap();
        assert_eq!(applied.len(), 3);
        assert!(applied.iter().all(|s| s.status.as_str() == "applied"));

        let capped = lc.list_applications(None, Some(2)).await.unwrap();
        assert_eq!(capped.len(), 2);

        let none = lc.list_applications(None, Some(0)).await.unwrap();
        assert!(none.is_empty());

        let err = lc.list_applications(Some("bogus"), None).await.unwrap_err();
        assert_eq!(err.error_kind(), "ValidationError");
    }

    #[tokio::test]
    async fn list_skips_unparseable_metadata() {
        let (store, lc) = lifecycle();
        lc.create_application(application_input("Good", "applied")).await.unwrap();
        store
            .put(
                "applications/2025/app_2025-06-01_0badf00d/meta.json",
                "application/json",
                b"{not json".to_vec(),
            )
            .await
            .unwrap();

        let all = lc.list_applications(None, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].job_title, "Good");
    }

    #[tokio::test]
    async fn upload_url_registers_new_role_lazily() {
        let (_, lc) = lifecycle();
        let (created, _) = lc.create_submission(submission_input()).await.unwrap();

        let (before, _) = lc.get_submission(&created.id).await.unwrap();
        assert!(!before.file_refs.contains_key("job_description"));

        let url = lc
            .upload_url(RecordKind::RecruiterSubmission, &created.id, FileRole::JobDescription)
            .await
            .unwrap();
        assert!(url.url.contains("job_description.pdf"));

        let (after, _) = lc.get_submission(&created.id).await.unwrap();
        assert!(after.file_refs.contains_key("job_description"));
        // Registering the new role is a metadata mutation
        assert!(after.updated_at > before.updated_at);

        // Applications never grow a job-description role
        let err = lc
            .upload_url(RecordKind::Application, &created.id, FileRole::JobDescription)
            .await
            .unwrap_err();
        assert_eq!(err.error_kind(), "InvalidRequest");
    }

    #[tokio::test]
    async fn upload_url_for_missing_record_is_not_found() {
        let (_, lc) = lifecycle();
        let err = lc
            .upload_url(RecordKind::Application, "app_2025-01-01_00000000", FileRole::Cv)
            .await
            .unwrap_err();
        assert_eq!(err.error_kind(), "NotFound");
    }
}
