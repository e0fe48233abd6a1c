//! Field-level validation shared by all records.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("valid email regex"));

/// Invariant violation detected before a write or after a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Record id is the nil UUID.
    NilId(&'static str),
    /// Required text field is empty after trimming.
    BlankField(&'static str),
    /// Field does not look like `local@domain.tld`.
    InvalidEmail { field: &'static str, value: String },
    /// Contact `closed_at` does not agree with its status.
    InconsistentClosure,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId(record) => write!(f, "{record} id must not be nil"),
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::InvalidEmail { field, value } => {
                write!(f, "`{field}` is not a valid email address: `{value}`")
            }
            Self::InconsistentClosure => {
                write!(f, "contact closed_at must be set exactly when status is closed")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_id(record: &'static str, id: Uuid) -> Result<(), ValidationError> {
    if id.is_nil() {
        return Err(ValidationError::NilId(record));
    }
    Ok(())
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

pub(crate) fn require_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require_text(field, value)?;
    if !EMAIL_RE.is_match(value.trim()) {
        return Err(ValidationError::InvalidEmail {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn optional_email(
    field: &'static str,
    value: Option<&str>,
) -> Result<(), ValidationError> {
    match value {
        Some(email) => require_email(field, email),
        None => Ok(()),
    }
}

/// Trims an optional text value and collapses blank input to `None`.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}
