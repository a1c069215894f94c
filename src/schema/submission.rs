use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{validate_currency, MAX_NAME_LEN, MAX_TEXT_LEN, MAX_TITLE_LEN};
use crate::validate::{
    coerce_string_list, email, enum_member, optional_string, phone, required_string, salary_range,
    string_list, FieldError, FieldResult,
};

/// Workflow states of a recruiter submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    New,
    Contacted,
    CvSent,
    Closed,
}

impl SubmissionStatus {
    pub const ALL: &'static [&'static str] = &["new", "contacted", "cv_sent", "closed"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::New => "new",
            SubmissionStatus::Contacted => "contacted",
            SubmissionStatus::CvSent => "cv_sent",
            SubmissionStatus::Closed => "closed",
        }
    }

    pub fn parse(field: &str, value: &str) -> Result<Self, FieldError> {
        enum_member(field, value, Self::ALL)?;
        Ok(match value {
            "new" => SubmissionStatus::New,
            "contacted" => SubmissionStatus::Contacted,
            "cv_sent" => SubmissionStatus::CvSent,
            _ => SubmissionStatus::Closed,
        })
    }
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        SubmissionStatus::New
    }
}

/// Recruiter contact details. Email and phone are privileged fields, stripped
/// from non-admin reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recruiter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub agency: String,
}

impl Recruiter {
    fn validate(&self) -> FieldResult {
        required_string("recruiter.name", &self.name, MAX_NAME_LEN)?;
        email("recruiter.email", &self.email)?;
        phone("recruiter.phone", &self.phone)?;
        optional_string("recruiter.agency", &self.agency, MAX_NAME_LEN)?;
        Ok(())
    }
}

/// Position details submitted by the recruiter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub salary_min: f64,
    #[serde(default)]
    pub salary_max: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

fn default_currency() -> String {
    "MYR".to_string()
}

/// One entry in the append-only contact log, written exactly when the status
/// actually changes value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactEvent {
    pub timestamp: DateTime<Utc>,
    pub old_status: SubmissionStatus,
    pub new_status: SubmissionStatus,
    #[serde(default)]
    pub note: String,
}

/// Full submission metadata document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: SubmissionStatus,
    pub recruiter: Recruiter,
    pub job: JobInfo,
    #[serde(default)]
    pub file_refs: BTreeMap<String, String>,
    #[serde(default)]
    pub contact_history: Vec<ContactEvent>,
    #[serde(default)]
    pub admin_notes: String,
}

impl SubmissionRecord {
    /// Transition to `new_status`, appending a history entry only when the
    /// value actually changes. `updated_at` is bumped unconditionally.
    pub fn apply_status(&mut self, new_status: SubmissionStatus, note: String, now: DateTime<Utc>) {
        if new_status != self.status {
            self.contact_history.push(ContactEvent {
                timestamp: now,
                old_status: self.status,
                new_status,
                note,
            });
            self.status = new_status;
        }
        self.updated_at = now;
    }

    /// Non-admin view: drops admin notes, the contact log, and the raw
    /// recruiter contact channels. Name and agency stay visible.
    pub fn sanitized(&self) -> Value {
        json!({
            "id": self.id,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
            "status": self.status,
            "recruiter": {
                "name": self.recruiter.name,
                "agency": self.recruiter.agency,
            },
            "job": self.job,
            "file_refs": self.file_refs,
        })
    }
}

/// Raw job input; salary bounds optional, skills arrive as arbitrary JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub skills: Value,
}

/// Create payload for the public `POST /recruiter-submissions` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionInput {
    #[serde(default)]
    pub recruiter: Recruiter,
    #[serde(default)]
    pub job: JobInput,
}

impl SubmissionInput {
    pub fn into_record(
        self,
        id: String,
        now: DateTime<Utc>,
        file_refs: BTreeMap<String, String>,
    ) -> Result<SubmissionRecord, FieldError> {
        self.recruiter.validate()?;
        required_string("job.title", &self.job.title, MAX_TITLE_LEN)?;
        required_string("job.company", &self.job.company, MAX_NAME_LEN)?;
        optional_string("job.description", &self.job.description, MAX_TEXT_LEN)?;
        optional_string("job.requirements", &self.job.requirements, MAX_TEXT_LEN)?;
        salary_range("job.salary", self.job.salary_min, self.job.salary_max)?;
        if let Some(currency) = &self.job.currency {
            validate_currency("job.currency", currency)?;
        }

        let skills = coerce_string_list(&self.job.skills);
        string_list("job.skills", &skills)?;

        Ok(SubmissionRecord {
            id,
            created_at: now,
            updated_at: now,
            status: SubmissionStatus::default(),
            recruiter: self.recruiter,
            job: JobInfo {
                title: self.job.title,
                company: self.job.company,
                description: self.job.description,
                requirements: self.job.requirements,
                salary_min: self.job.salary_min.unwrap_or(0.0),
                salary_max: self.job.salary_max.unwrap_or(0.0),
                currency: self.job.currency.unwrap_or_else(default_currency),
                skills,
            },
            file_refs,
            contact_history: Vec::new(),
            admin_notes: String::new(),
        })
    }
}

/// Summary projection for submission listings.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: SubmissionStatus,
    pub job_title: String,
    pub company: String,
    pub recruiter_agency: String,
}

impl From<&SubmissionRecord> for SubmissionSummary {
    fn from(record: &SubmissionRecord) -> Self {
        Self {
            id: record.id.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            status: record.status,
            job_title: record.job.title.clone(),
            company: record.job.company.clone(),
            recruiter_agency: record.recruiter.agency.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> SubmissionInput {
        serde_json::from_value(json!({
            "recruiter": {
                "name": "Aisha",
                "email": "aisha@agency.example",
                "phone": "+60 12-345 6789",
                "agency": "TalentCo"
            },
            "job": {
                "title": "Backend Engineer",
                "company": "Acme",
                "salary_min": 8000.0,
                "salary_max": 12000.0,
                "skills": ["rust", 7, "tokio"]
            }
        }))
        .unwrap()
    }

    fn sample_record() -> SubmissionRecord {
        sample_input()
            .into_record("sub_2025-11-01_deadbeef".into(), Utc::now(), BTreeMap::new())
            .unwrap()
    }

    #[test]
    fn create_defaults_and_coerces_skills() {
        let record = sample_record();
        assert_eq!(record.status, SubmissionStatus::New);
        assert_eq!(record.job.skills, vec!["rust", "tokio"]);
        assert_eq!(record.job.currency, "MYR");
        assert!(record.contact_history.is_empty());
    }

    #[test]
    fn recruiter_name_is_required() {
        let input: SubmissionInput = serde_json::from_value(json!({
            "recruiter": {"email": "a@b.co"},
            "job": {"title": "X", "company": "Y"}
        }))
        .unwrap();
        let err = input
            .into_record("sub_2025-11-01_deadbeef".into(), Utc::now(), BTreeMap::new())
            .unwrap_err();
        assert_eq!(err.field, "recruiter.name");
    }

    #[test]
    fn status_change_appends_exactly_one_history_entry() {
        let mut record = sample_record();
        let now = Utc::now();

        record.apply_status(SubmissionStatus::Contacted, "called".into(), now);
        assert_eq!(record.contact_history.len(), 1);
        assert_eq!(record.contact_history[0].old_status, SubmissionStatus::New);
        assert_eq!(record.contact_history[0].new_status, SubmissionStatus::Contacted);

        // Same status again: no new entry, updated_at still bumps.
        let later = now + chrono::Duration::seconds(10);
        record.apply_status(SubmissionStatus::Contacted, "again".into(), later);
        assert_eq!(record.contact_history.len(), 1);
        assert_eq!(record.updated_at, later);
    }

    #[test]
    fn sanitized_view_strips_privileged_fields() {
        let mut record = sample_record();
        record.admin_notes = "internal note".into();
        record.apply_status(SubmissionStatus::Contacted, "called".into(), Utc::now());

        let view = record.sanitized();
        assert!(view.get("admin_notes").is_none());
        assert!(view.get("contact_history").is_none());
        assert!(view["recruiter"].get("email").is_none());
        assert!(view["recruiter"].get("phone").is_none());
        assert_eq!(view["recruiter"]["name"], "Aisha");
        assert_eq!(view["recruiter"]["agency"], "TalentCo");
        assert_eq!(view["status"], "contacted");
    }

    #[test]
    fn summary_projects_subset() {
        let record = sample_record();
        let value = serde_json::to_value(SubmissionSummary::from(&record)).unwrap();
        assert!(value.get("recruiter").is_none());
        assert!(value.get("admin_notes").is_none());
        assert_eq!(value["job_title"], "Backend Engineer");
        assert_eq!(value["recruiter_agency"], "TalentCo");
    }
}
