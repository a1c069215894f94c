use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record kinds tracked by the API. The kind determines the id prefix and the
/// top-level storage folder a record lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Application,
    RecruiterSubmission,
}

impl RecordKind {
    /// Short token used as the id prefix: `app_...` / `sub_...`
    pub fn prefix(&self) -> &'static str {
        match self {
            RecordKind::Application => "app",
            RecordKind::RecruiterSubmission => "sub",
        }
    }

    /// Top-level storage folder for this kind.
    pub fn root(&self) -> &'static str {
        match self {
            RecordKind::Application => "applications",
            RecordKind::RecruiterSubmission => "submissions",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "app" => Some(RecordKind::Application),
            "sub" => Some(RecordKind::RecruiterSubmission),
            _ => None,
        }
    }
}

/// Errors from identifier parsing and address derivation
#[derive(Debug, thiserror::Error)]
pub enum IdentError {
    #[error("Invalid record identifier: {0}")]
    InvalidIdentifier(String),
}

/// Generate a new record id: `{prefix}_{YYYY-MM-DD}_{8-hex}`.
///
/// The date component makes ids sortable by creation day and encodes the
/// storage partition year; 32 bits of randomness per day makes collisions
/// negligible for this workload.
pub fn generate_id(kind: RecordKind) -> String {
    let today = Utc::now().date_naive().format("%Y-%m-%d");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", kind.prefix(), today, &suffix[..8])
}

/// Resolved storage address for a record: every object belonging to the
/// record lives under `prefix()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordAddress {
    pub kind: RecordKind,
    pub year: u16,
    pub id: String,
}

impl RecordAddress {
    /// Parse an id of the form `{prefix}_{YYYY-MM-DD}_{8-hex}` back into its
    /// kind and partition year.
    ///
    /// The strict shape check doubles as a path-traversal guard: anything
    /// containing separators, `..`, or unexpected characters is rejected
    /// before it can reach the store layer.
    pub fn parse(id: &str) -> Result<Self, IdentError> {
        let invalid = || IdentError::InvalidIdentifier(id.to_string());

        let mut parts = id.split('_');
        let (prefix, date, rand) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(d), Some(r), None) => (p, d, r),
            _ => return Err(invalid()),
        };

        let kind = RecordKind::from_prefix(prefix).ok_or_else(invalid)?;

        // Date component: YYYY-MM-DD, digits and dashes only
        let date_bytes = date.as_bytes();
        if date_bytes.len() != 10 || date_bytes[4] != b'-' || date_bytes[7] != b'-' {
            return Err(invalid());
        }
        for (i, b) in date_bytes.iter().enumerate() {
            if i == 4 || i == 7 {
                continue;
            }
            if !b.is_ascii_digit() {
                return Err(invalid());
            }
        }

        if rand.len() != 8 || !rand.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let year: u16 = date[..4].parse().map_err(|_| invalid())?;

        Ok(Self { kind, year, id: id.to_string() })
    }

    /// Storage prefix for the record folder, e.g.
    /// `applications/2025/app_2025-11-01_1a2b3c4d/`
    pub fn prefix(&self) -> String {
        format!("{}/{}/{}/", self.kind.root(), self.year, self.id)
    }

    /// Key of the record's metadata document.
    pub fn meta_key(&self) -> String {
        format!("{}meta.json", self.prefix())
    }

    /// Deterministic key for a file role under this record's folder.
    pub fn file_key(&self, role: FileRole) -> String {
        format!("{}{}", self.prefix(), role.filename())
    }
}

/// Logical roles a stored file can play for a record. Keys are derived from
/// the record address plus the role, never supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    Cv,
    JobDescription,
}

impl FileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileRole::Cv => "cv",
            FileRole::JobDescription => "job_description",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "cv" => Some(FileRole::Cv),
            "job_description" => Some(FileRole::JobDescription),
            _ => None,
        }
    }

    fn filename(&self) -> &'static str {
        match self {
            FileRole::Cv => "cv.pdf",
            FileRole::JobDescription => "job_description.pdf",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_round_trip() {
        for kind in [RecordKind::Application, RecordKind::RecruiterSubmission] {
            let id = generate_id(kind);
            let addr = RecordAddress::parse(&id).expect("generated id must parse");
            assert_eq!(addr.kind, kind);
            assert_eq!(addr.id, id);
            assert!(addr.prefix().starts_with(kind.root()));
            assert!(addr.prefix().ends_with('/'));
        }
    }

    #[test]
    fn address_encodes_partition_year() {
        let addr = RecordAddress::parse("app_2025-11-01_1a2b3c4d").unwrap();
        assert_eq!(addr.year, 2025);
        assert_eq!(addr.prefix(), "applications/2025/app_2025-11-01_1a2b3c4d/");
        assert_eq!(addr.meta_key(), "applications/2025/app_2025-11-01_1a2b3c4d/meta.json");
        assert_eq!(
            addr.file_key(FileRole::Cv),
            "applications/2025/app_2025-11-01_1a2b3c4d/cv.pdf"
        );
    }

    #[test]
    fn traversal_attempts_are_rejected() {
        for bad in [
            "../../../etc/passwd",
            "app_2025-11-01_1a2b3c4d/../escape",
            "app_2025-11-01_..%2f%2e%2e",
            "app/2025-11-01_1a2b3c4d",
            "app_2025-11-01_1a2b3c4d_extra",
            "app_2025-11-01",
            "",
        ] {
            assert!(RecordAddress::parse(bad).is_err(), "should reject {:?}", bad);
        }
    }

    #[test]
    fn malformed_components_are_rejected() {
        // wrong prefix, bad date, short/non-hex random part
        for bad in [
            "job_2025-11-01_1a2b3c4d",
            "app_2025-13-99x_1a2b3c4d",
            "app_20251101_1a2b3c4d",
            "app_2025-11-01_1a2b3c",
            "app_2025-11-01_zzzzzzzz",
        ] {
            assert!(RecordAddress::parse(bad).is_err(), "should reject {:?}", bad);
        }
    }

    #[test]
    fn submission_roles_have_distinct_keys() {
        let addr = RecordAddress::parse("sub_2025-11-01_deadbeef").unwrap();
        assert_ne!(addr.file_key(FileRole::Cv), addr.file_key(FileRole::JobDescription));
        assert!(addr.file_key(FileRole::JobDescription).ends_with("job_description.pdf"));
    }
}
