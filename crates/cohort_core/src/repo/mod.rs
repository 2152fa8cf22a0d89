//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the Year Store and Student Store contracts the transition engine
//!   consumes, plus the wider admin repositories built on top of them.
//! - Isolate SQLite query details from service/business orchestration.
//! - Provide the unit-of-work seam (`TransitionStore`) a transition runs in.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Repository APIs return semantic errors (`YearNotFound`, `DuplicateYear`)
//!   in addition to DB transport errors.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::academic_year::{MalformedLabel, YearId};
use crate::model::student::{StudentId, StudentValidationError};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod student_repo;
pub mod transition_store;
pub mod year_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by year and student persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Student record failed field validation.
    Validation(StudentValidationError),
    /// Year label is not `YYYY-YYYY`.
    MalformedLabel(MalformedLabel),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    YearNotFound(YearId),
    StudentNotFound(StudentId),
    /// The current year cannot be deleted.
    CurrentYearLocked(YearId),
    /// A year with this label already exists.
    DuplicateYear(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::MalformedLabel(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::YearNotFound(id) => write!(f, "academic year not found: {id}"),
            Self::StudentNotFound(id) => write!(f, "student not found: {id}"),
            Self::CurrentYearLocked(id) => {
                write!(f, "academic year {id} is current and cannot be deleted")
            }
            Self::DuplicateYear(label) => write!(f, "academic year `{label}` already exists"),
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
            Self::MalformedLabel(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StudentValidationError> for RepoError {
    fn from(value: StudentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<MalformedLabel> for RepoError {
    fn from(value: MalformedLabel) -> Self {
        Self::MalformedLabel(value)
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

/// Fails unless `conn` has every known migration applied.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
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
