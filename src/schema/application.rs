use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{validate_currency, ALLOWED_PERIODS, MAX_NAME_LEN, MAX_TEXT_LEN, MAX_TITLE_LEN};
use crate::validate::{
    coerce_string_list, email, enum_member, optional_string, phone, required_string, salary_range,
    string_list, FieldError, FieldResult,
};

/// Lifecycle states of a job application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    Screening,
    Interviewing,
    Offer,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: &'static [&'static str] =
        &["applied", "screening", "interviewing", "offer", "rejected", "withdrawn"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Screening => "screening",
            ApplicationStatus::Interviewing => "interviewing",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(field: &str, value: &str) -> Result<Self, FieldError> {
        enum_member(field, value, Self::ALL)?;
        Ok(match value {
            "applied" => ApplicationStatus::Applied,
            "screening" => ApplicationStatus::Screening,
            "interviewing" => ApplicationStatus::Interviewing,
            "offer" => ApplicationStatus::Offer,
            "rejected" => ApplicationStatus::Rejected,
            _ => ApplicationStatus::Withdrawn,
        })
    }
}

impl Default for ApplicationStatus {
    fn default() -> Self {
        ApplicationStatus::Applied
    }
}

/// Contact person on the hiring side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Caller {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl Caller {
    fn validate(&self, prefix: &str) -> FieldResult {
        optional_string(&format!("{}.name", prefix), &self.name, MAX_NAME_LEN)?;
        email(&format!("{}.email", prefix), &self.email)?;
        phone(&format!("{}.phone", prefix), &self.phone)?;
        Ok(())
    }
}

/// Salary range attached to an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Salary {
    pub currency: String,
    pub min: f64,
    pub max: f64,
    pub period: String,
}

impl Default for Salary {
    fn default() -> Self {
        Self { currency: "MYR".to_string(), min: 0.0, max: 0.0, period: "monthly".to_string() }
    }
}

/// Free-form job detail fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Details {
    #[serde(default)]
    pub roles: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub skillsets: Vec<String>,
    #[serde(default)]
    pub questions_asked: Vec<String>,
    #[serde(default)]
    pub info_provided: Vec<String>,
}

/// Full application metadata document, the sole source of truth for one
/// application. `id`, `created_at`, and `file_refs` are server-assigned and
/// never mutable through the update path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub job_title: String,
    #[serde(default)]
    pub agency_name: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub caller: Caller,
    #[serde(default)]
    pub caller_method: String,
    #[serde(default)]
    pub salary: Salary,
    #[serde(default)]
    pub perks: Vec<String>,
    #[serde(default)]
    pub details: Details,
    /// Logical file role -> storage key, assigned at creation.
    #[serde(default)]
    pub file_refs: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub admin_notes: String,
}

/// Raw salary input; list coercion and defaulting happen when the input is
/// turned into a record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalaryInput {
    pub currency: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub period: Option<String>,
}

impl SalaryInput {
    fn validate(&self) -> FieldResult {
        if let Some(currency) = &self.currency {
            validate_currency("salary.currency", currency)?;
        }
        if let Some(period) = &self.period {
            enum_member("salary.period", period, ALLOWED_PERIODS)?;
        }
        salary_range("salary", self.min, self.max)
    }

    fn into_salary(self) -> Salary {
        let defaults = Salary::default();
        Salary {
            currency: self.currency.unwrap_or(defaults.currency),
            min: self.min.unwrap_or(0.0),
            max: self.max.unwrap_or(0.0),
            period: self.period.unwrap_or(defaults.period),
        }
    }
}

/// Raw details input. List fields arrive as arbitrary JSON; non-string
/// elements are dropped rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailsInput {
    #[serde(default)]
    pub roles: String,
    #[serde(default)]
    pub responsibilities: Value,
    #[serde(default)]
    pub skillsets: Value,
    #[serde(default)]
    pub questions_asked: Value,
    #[serde(default)]
    pub info_provided: Value,
}

impl DetailsInput {
    fn validate_and_build(self) -> Result<Details, FieldError> {
        optional_string("details.roles", &self.roles, MAX_TEXT_LEN)?;
        let details = Details {
            roles: self.roles,
            responsibilities: coerce_string_list(&self.responsibilities),
            skillsets: coerce_string_list(&self.skillsets),
            questions_asked: coerce_string_list(&self.questions_asked),
            info_provided: coerce_string_list(&self.info_provided),
        };
        string_list("details.responsibilities", &details.responsibilities)?;
        string_list("details.skillsets", &details.skillsets)?;
        string_list("details.questions_asked", &details.questions_asked)?;
        string_list("details.info_provided", &details.info_provided)?;
        Ok(details)
    }
}

/// Create payload for `POST /applications`. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationInput {
    pub status: Option<String>,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub agency_name: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub caller: Caller,
    #[serde(default)]
    pub caller_method: String,
    #[serde(default)]
    pub salary: SalaryInput,
    #[serde(default)]
    pub perks: Value,
    #[serde(default)]
    pub details: DetailsInput,
    #[serde(default)]
    pub tags: Value,
}

impl ApplicationInput {
    /// Validate and build the full record. Server-assigned fields (`id`,
    /// timestamps, `file_refs`) come from the caller of this function, never
    /// from the input payload.
    pub fn into_record(
        self,
        id: String,
        now: DateTime<Utc>,
        file_refs: BTreeMap<String, String>,
    ) -> Result<ApplicationRecord, FieldError> {
        required_string("job_title", &self.job_title, MAX_TITLE_LEN)?;
        optional_string("agency_name", &self.agency_name, MAX_NAME_LEN)?;
        optional_string("company_name", &self.company_name, MAX_NAME_LEN)?;
        optional_string("caller_method", &self.caller_method, MAX_NAME_LEN)?;
        self.caller.validate("caller")?;
        self.salary.validate()?;

        let status = match &self.status {
            Some(s) => ApplicationStatus::parse("status", s)?,
            None => ApplicationStatus::default(),
        };

        let perks = coerce_string_list(&self.perks);
        string_list("perks", &perks)?;
        let tags = coerce_string_list(&self.tags);
        string_list("tags", &tags)?;

        Ok(ApplicationRecord {
            id,
            created_at: now,
            updated_at: now,
            status,
            job_title: self.job_title,
            agency_name: self.agency_name,
            company_name: self.company_name,
            caller: self.caller,
            caller_method: self.caller_method,
            salary: self.salary.into_salary(),
            perks,
            details: self.details.validate_and_build()?,
            file_refs,
            tags,
            admin_notes: String::new(),
        })
    }
}

/// Partial update for `PUT /applications/{id}`. Only these fields may change;
/// anything else in the request body is ignored without error so that newer
/// clients can send fields this version does not know about. Sub-objects are
/// replaced wholesale when their top-level key is present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationUpdate {
    pub status: Option<String>,
    pub job_title: Option<String>,
    pub agency_name: Option<String>,
    pub company_name: Option<String>,
    pub caller: Option<Caller>,
    pub caller_method: Option<String>,
    pub salary: Option<SalaryInput>,
    pub perks: Option<Value>,
    pub details: Option<DetailsInput>,
    pub tags: Option<Value>,
    pub admin_notes: Option<String>,
}

impl ApplicationUpdate {
    pub fn apply(self, record: &mut ApplicationRecord, now: DateTime<Utc>) -> FieldResult {
        if let Some(status) = self.status {
            record.status = ApplicationStatus::parse("status", &status)?;
        }
        if let Some(job_title) = self.job_title {
            required_string("job_title", &job_title, MAX_TITLE_LEN)?;
            record.job_title = job_title;
        }
        if let Some(agency_name) = self.agency_name {
            optional_string("agency_name", &agency_name, MAX_NAME_LEN)?;
            record.agency_name = agency_name;
        }
        if let Some(company_name) = self.company_name {
            optional_string("company_name", &company_name, MAX_NAME_LEN)?;
            record.company_name = company_name;
        }
        if let Some(caller) = self.caller {
            caller.validate("caller")?;
            record.caller = caller;
        }
        if let Some(caller_method) = self.caller_method {
            optional_string("caller_method", &caller_method, MAX_NAME_LEN)?;
            record.caller_method = caller_method;
        }
        if let Some(salary) = self.salary {
            salary.validate()?;
            record.salary = salary.into_salary();
        }
        if let Some(perks) = self.perks {
            let perks = coerce_string_list(&perks);
            string_list("perks", &perks)?;
            record.perks = perks;
        }
        if let Some(details) = self.details {
            record.details = details.validate_and_build()?;
        }
        if let Some(tags) = self.tags {
            let tags = coerce_string_list(&tags);
            string_list("tags", &tags)?;
            record.tags = tags;
        }
        if let Some(admin_notes) = self.admin_notes {
            optional_string("admin_notes", &admin_notes, MAX_TEXT_LEN)?;
            record.admin_notes = admin_notes;
        }
        record.updated_at = now;
        Ok(())
    }
}

/// Summary projection returned by listings; never the full payload.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub job_title: String,
    pub company_name: String,
    pub agency_name: String,
    pub salary_max: f64,
    pub tags: Vec<String>,
}

impl From<&ApplicationRecord> for ApplicationSummary {
    fn from(record: &ApplicationRecord) -> Self {
        Self {
            id: record.id.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            status: record.status,
            job_title: record.job_title.clone(),
            company_name: record.company_name.clone(),
            agency_name: record.agency_name.clone(),
            salary_max: record.salary.max,
            tags: record.tags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_input() -> ApplicationInput {
        serde_json::from_value(json!({ "job_title": "Platform Engineer" })).unwrap()
    }

    #[test]
    fn minimal_input_builds_record_with_defaults() {
        let now = Utc::now();
        let record = minimal_input()
            .into_record("app_2025-11-01_1a2b3c4d".into(), now, BTreeMap::new())
            .unwrap();
        assert_eq!(record.status, ApplicationStatus::Applied);
        assert_eq!(record.salary.currency, "MYR");
        assert_eq!(record.salary.period, "monthly");
        assert_eq!(record.created_at, record.updated_at);
        assert!(record.perks.is_empty());
    }

    #[test]
    fn input_without_job_title_fails() {
        let input: ApplicationInput = serde_json::from_value(json!({})).unwrap();
        let err = input
            .into_record("app_2025-11-01_1a2b3c4d".into(), Utc::now(), BTreeMap::new())
            .unwrap_err();
        assert_eq!(err.field, "job_title");
    }

    #[test]
    fn unknown_input_fields_are_ignored() {
        let input: ApplicationInput = serde_json::from_value(json!({
            "job_title": "Engineer",
            "cv_key": "../../evil",
            "file_refs": {"cv": "hacked"},
            "id": "app_2020-01-01_deadbeef"
        }))
        .unwrap();
        let record = input
            .into_record("app_2025-11-01_1a2b3c4d".into(), Utc::now(), BTreeMap::new())
            .unwrap();
        assert_eq!(record.id, "app_2025-11-01_1a2b3c4d");
        assert!(record.file_refs.is_empty());
    }

    #[test]
    fn update_applies_allow_listed_fields_only() {
        let now = Utc::now();
        let mut record = minimal_input()
            .into_record("app_2025-11-01_1a2b3c4d".into(), now, BTreeMap::new())
            .unwrap();

        let update: ApplicationUpdate = serde_json::from_value(json!({
            "status": "interviewing",
            "unauthorized_field": "x",
            "created_at": "1999-01-01T00:00:00Z",
            "id": "app_1999-01-01_feedface"
        }))
        .unwrap();

        let later = now + chrono::Duration::seconds(5);
        update.apply(&mut record, later).unwrap();

        assert_eq!(record.status, ApplicationStatus::Interviewing);
        assert_eq!(record.id, "app_2025-11-01_1a2b3c4d");
        assert_eq!(record.created_at, now);
        assert_eq!(record.updated_at, later);
    }

    #[test]
    fn update_replaces_sub_objects_wholesale() {
        let now = Utc::now();
        let input: ApplicationInput = serde_json::from_value(json!({
            "job_title": "Engineer",
            "salary": {"currency": "USD", "min": 5000.0, "max": 8000.0, "period": "monthly"}
        }))
        .unwrap();
        let mut record =
            input.into_record("app_2025-11-01_1a2b3c4d".into(), now, BTreeMap::new()).unwrap();

        // Partial salary object: missing keys fall back to defaults, they are
        // not merged from the previous value.
        let update: ApplicationUpdate =
            serde_json::from_value(json!({ "salary": {"max": 9000.0} })).unwrap();
        update.apply(&mut record, now).unwrap();

        assert_eq!(record.salary.max, 9000.0);
        assert_eq!(record.salary.min, 0.0);
        assert_eq!(record.salary.currency, "MYR");
    }

    #[test]
    fn update_rejects_bad_status() {
        let now = Utc::now();
        let mut record =
            minimal_input().into_record("app_2025-11-01_1a2b3c4d".into(), now, BTreeMap::new()).unwrap();
        let update: ApplicationUpdate =
            serde_json::from_value(json!({ "status": "ghosted" })).unwrap();
        let err = update.apply(&mut record, now).unwrap_err();
        assert_eq!(err.field, "status");
        assert!(err.reason.contains("applied"));
    }

    #[test]
    fn summary_projects_subset() {
        let now = Utc::now();
        let record = minimal_input()
            .into_record("app_2025-11-01_1a2b3c4d".into(), now, BTreeMap::new())
            .unwrap();
        let summary = ApplicationSummary::from(&record);
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("caller").is_none());
        assert!(value.get("details").is_none());
        assert!(value.get("admin_notes").is_none());
        assert_eq!(value["job_title"], "Platform Engineer");
    }
}
