//! Field-level validation applied before any store write.
//!
//! Every check is a pure function returning the offending field and reason on
//! failure; callers short-circuit on the first error and surface it as a
//! 400-class response naming the field.

use serde_json::Value;

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self { field: field.to_string(), reason: reason.into() }
    }
}

pub type FieldResult = Result<(), FieldError>;

/// Maximum length accepted for an email address (RFC 5321 limit).
pub const MAX_EMAIL_LEN: usize = 254;
/// Maximum length accepted for a phone number.
pub const MAX_PHONE_LEN: usize = 20;
/// Maximum number of elements in a list field (skills, tags, perks).
pub const MAX_LIST_ITEMS: usize = 50;
/// Maximum length of a single list element.
pub const MAX_LIST_ITEM_LEN: usize = 100;

fn has_forbidden_control_chars(value: &str) -> bool {
    value
        .chars()
        .any(|c| (c.is_control() && c != '\t' && c != '\n' && c != '\r') || c == '\0')
}

/// Required string: non-empty, bounded, no NUL or control characters other
/// than tab/newline/carriage-return.
pub fn required_string(field: &str, value: &str, max_len: usize) -> FieldResult {
    if value.trim().is_empty() {
        return Err(FieldError::new(field, "is required"));
    }
    optional_string(field, value, max_len)
}

/// Optional string: may be empty, but when present must be bounded and free
/// of embedded NUL/control characters.
pub fn optional_string(field: &str, value: &str, max_len: usize) -> FieldResult {
    if value.len() > max_len {
        return Err(FieldError::new(
            field,
            format!("exceeds maximum length of {} characters", max_len),
        ));
    }
    if has_forbidden_control_chars(value) {
        return Err(FieldError::new(field, "contains control characters"));
    }
    Ok(())
}

/// Conservative email shape: one `@`, non-empty local part, domain containing
/// a dot with a non-empty tld.
pub fn email(field: &str, value: &str) -> FieldResult {
    if value.is_empty() {
        return Ok(());
    }
    if value.len() > MAX_EMAIL_LEN {
        return Err(FieldError::new(field, "email address too long"));
    }
    if has_forbidden_control_chars(value) || value.contains(char::is_whitespace) {
        return Err(FieldError::new(field, "invalid email address"));
    }
    let Some((local, domain)) = value.split_once('@') else {
        return Err(FieldError::new(field, "invalid email address"));
    };
    if local.is_empty() || domain.contains('@') {
        return Err(FieldError::new(field, "invalid email address"));
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return Err(FieldError::new(field, "invalid email address"));
    };
    if host.is_empty() || tld.is_empty() {
        return Err(FieldError::new(field, "invalid email address"));
    }
    Ok(())
}

/// Phone number: digits plus `+ - ( ) space`, bounded length.
pub fn phone(field: &str, value: &str) -> FieldResult {
    if value.is_empty() {
        return Ok(());
    }
    if value.len() > MAX_PHONE_LEN {
        return Err(FieldError::new(field, "phone number too long"));
    }
    let ok = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '));
    if !ok {
        return Err(FieldError::new(field, "phone number contains invalid characters"));
    }
    Ok(())
}

/// Membership check against a fixed allowed set; the failure message lists
/// the allowed values so clients can self-correct.
pub fn enum_member(field: &str, value: &str, allowed: &[&str]) -> FieldResult {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(FieldError::new(
            field,
            format!("must be one of: {}", allowed.join(", ")),
        ))
    }
}

/// Salary bounds: non-negative, and min <= max when both are given.
pub fn salary_range(field: &str, min: Option<f64>, max: Option<f64>) -> FieldResult {
    if let Some(min) = min {
        if min < 0.0 || !min.is_finite() {
            return Err(FieldError::new(field, "minimum must be a non-negative number"));
        }
    }
    if let Some(max) = max {
        if max < 0.0 || !max.is_finite() {
            return Err(FieldError::new(field, "maximum must be a non-negative number"));
        }
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(FieldError::new(field, "minimum cannot exceed maximum"));
        }
    }
    Ok(())
}

/// Bounded string list. Validates count and per-element length.
pub fn string_list(field: &str, items: &[String]) -> FieldResult {
    if items.len() > MAX_LIST_ITEMS {
        return Err(FieldError::new(
            field,
            format!("too many items (max {})", MAX_LIST_ITEMS),
        ));
    }
    for item in items {
        optional_string(field, item, MAX_LIST_ITEM_LEN)?;
    }
    Ok(())
}

/// Coerce a raw JSON array into a string list, silently dropping non-string
/// elements. Tolerating junk elements instead of rejecting the whole payload
/// matches the forward-compatible update contract.
pub fn coerce_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_string_rejects_empty_and_control_chars() {
        assert!(required_string("job_title", "", 100).is_err());
        assert!(required_string("job_title", "   ", 100).is_err());
        assert!(required_string("job_title", "Engineer\0", 100).is_err());
        assert!(required_string("job_title", "Line1\nLine2\tok", 100).is_ok());
        assert!(required_string("job_title", &"x".repeat(101), 100).is_err());
    }

    #[test]
    fn email_accepts_plain_addresses_only() {
        assert!(email("email", "a@b.co").is_ok());
        assert!(email("email", "first.last@example.com").is_ok());
        assert!(email("email", "").is_ok()); // optional
        assert!(email("email", "no-at-sign").is_err());
        assert!(email("email", "@missing-local.com").is_err());
        assert!(email("email", "user@nodot").is_err());
        assert!(email("email", "user@domain.").is_err());
        assert!(email("email", "a b@c.d").is_err());
        assert!(email("email", &format!("{}@x.co", "a".repeat(255))).is_err());
    }

    #[test]
    fn phone_allows_dial_characters_only() {
        assert!(phone("phone", "+60 (12) 345-6789").is_ok());
        assert!(phone("phone", "").is_ok());
        assert!(phone("phone", "call me maybe").is_err());
        assert!(phone("phone", "+601234567890123456789").is_err());
    }

    #[test]
    fn enum_member_lists_allowed_values_on_failure() {
        let err = enum_member("status", "bogus", &["new", "contacted"]).unwrap_err();
        assert!(err.reason.contains("new"));
        assert!(err.reason.contains("contacted"));
        assert_eq!(err.field, "status");
        assert!(enum_member("status", "new", &["new", "contacted"]).is_ok());
    }

    #[test]
    fn salary_range_checks_sign_and_order() {
        assert!(salary_range("salary", Some(1000.0), Some(2000.0)).is_ok());
        assert!(salary_range("salary", None, None).is_ok());
        assert!(salary_range("salary", Some(-1.0), None).is_err());
        assert!(salary_range("salary", Some(3000.0), Some(2000.0)).is_err());
        assert!(salary_range("salary", Some(f64::NAN), None).is_err());
    }

    #[test]
    fn string_list_bounds_count_and_element_length() {
        let ok: Vec<String> = (0..50).map(|i| format!("skill-{}", i)).collect();
        assert!(string_list("skills", &ok).is_ok());

        let too_many: Vec<String> = (0..51).map(|i| format!("skill-{}", i)).collect();
        assert!(string_list("skills", &too_many).is_err());

        let long_item = vec!["y".repeat(MAX_LIST_ITEM_LEN + 1)];
        assert!(string_list("skills", &long_item).is_err());
    }

    #[test]
    fn coerce_drops_non_string_elements() {
        let raw = json!(["rust", 42, null, "tokio", {"nested": true}]);
        assert_eq!(coerce_string_list(&raw), vec!["rust", "tokio"]);
        assert!(coerce_string_list(&json!("not-a-list")).is_empty());
    }
}
