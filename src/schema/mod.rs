//! Typed record schemas for both record kinds.
//!
//! The metadata documents stored alongside uploaded files are serialized from
//! these structs; inputs are deserialized at the boundary with defaults so the
//! rest of the pipeline works with one validated structure per kind.

pub mod application;
pub mod submission;

pub use application::{
    ApplicationInput, ApplicationRecord, ApplicationStatus, ApplicationSummary, ApplicationUpdate,
};
pub use submission::{
    ContactEvent, SubmissionInput, SubmissionRecord, SubmissionStatus, SubmissionSummary,
};

use crate::validate::{enum_member, FieldResult};

/// Currencies accepted in salary fields.
pub const ALLOWED_CURRENCIES: &[&str] = &["MYR", "SGD", "USD", "EUR", "GBP"];

/// Salary period values accepted for applications.
pub const ALLOWED_PERIODS: &[&str] = &["monthly", "yearly", "hourly", "daily"];

pub(crate) fn validate_currency(field: &str, value: &str) -> FieldResult {
    enum_member(field, value, ALLOWED_CURRENCIES)
}

/// Bounded lengths for common string fields.
pub(crate) const MAX_NAME_LEN: usize = 120;
pub(crate) const MAX_TITLE_LEN: usize = 200;
pub(crate) const MAX_TEXT_LEN: usize = 5000;
