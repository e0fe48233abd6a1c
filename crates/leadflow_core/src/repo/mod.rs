//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data-access contracts the distribution core consumes.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes validate input records before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Uniqueness violations surface as `RepoError::Duplicate`, never as raw
//!   SQLite errors.
//! - Repositories borrow a connection (or transaction); they never open one.

pub mod contact_repo;
pub mod lead_repo;
pub mod operator_repo;
pub mod source_repo;

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::validation::ValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const LIST_DEFAULT_LIMIT: u32 = 100;
const LIST_LIMIT_MAX: u32 = 500;

pub type RepoResult<T> = Result<T, RepoError>;

/// Record family a repository error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Lead,
    Operator,
    Source,
    SourceWeight,
    Contact,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Lead => "lead",
            Self::Operator => "operator",
            Self::Source => "source",
            Self::SourceWeight => "source weight",
            Self::Contact => "contact",
        };
        f.write_str(name)
    }
}

/// Uniqueness rule rejected by storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateConstraint {
    LeadExternalId,
    OperatorEmail,
    SourceBotToken,
    SourceOperatorWeight,
}

impl Display for DuplicateConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rule = match self {
            Self::LeadExternalId => "lead with this external_id already exists",
            Self::OperatorEmail => "operator with this email already exists",
            Self::SourceBotToken => "source with this bot_token already exists",
            Self::SourceOperatorWeight => "operator already has a weight for this source",
        };
        f.write_str(rule)
    }
}

/// Repository error shared by every record family.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { entity: EntityKind, id: String },
    Duplicate(DuplicateConstraint),
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl RepoError {
    pub fn not_found(entity: EntityKind, id: impl Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns whether the underlying database refused a write lock in time.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_busy())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Duplicate(constraint) => write!(f, "{constraint}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Duplicate(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Pagination window for list operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Maximum rows to return. Defaults to 100 and clamps to 500.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

impl ListQuery {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }

    /// Effective limit after defaulting and clamping.
    pub fn applied_limit(&self) -> u32 {
        normalize_list_limit(self.limit)
    }
}

/// Normalizes list limit according to the listing contract.
pub fn normalize_list_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => LIST_DEFAULT_LIMIT,
        Some(value) if value > LIST_LIMIT_MAX => LIST_LIMIT_MAX,
        Some(value) => value,
    }
}

/// Fails unless `conn` carries the schema version this binary writes.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

/// Maps a UNIQUE violation to `Duplicate(constraint)`; other errors pass through.
pub(crate) fn map_unique_violation(
    err: rusqlite::Error,
    constraint: DuplicateConstraint,
) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::Duplicate(constraint)
        }
        _ => err.into(),
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(value: Option<String>, column: &str) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

pub(crate) fn parse_count(value: i64, column: &str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid count value `{value}` in {column}")))
}

pub(crate) fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
