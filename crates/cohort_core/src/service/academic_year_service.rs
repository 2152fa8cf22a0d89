//! Academic year admin use-case service.
//!
//! # Responsibility
//! - List, look up, create and delete academic years.
//!
//! # Invariants
//! - Years are created non-current; there is deliberately no way to pick the
//!   current year here. Use `YearTransitionService`.
//! - The current year and any year still referenced by students (archived or
//!   not) cannot be deleted.

use crate::model::academic_year::{validate_label, AcademicYear, MalformedLabel, YearId};
use crate::repo::year_repo::YearRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from academic year admin operations.
#[derive(Debug)]
pub enum YearServiceError {
    MalformedLabel(MalformedLabel),
    DuplicateYear(String),
    YearNotFound(YearId),
    /// Target year is the current year.
    YearIsCurrent(String),
    /// Target year is still referenced by students.
    YearInUse { label: String, students: u64 },
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for YearServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedLabel(err) => write!(f, "{err}"),
            Self::DuplicateYear(label) => write!(f, "academic year `{label}` already exists"),
            Self::YearNotFound(id) => write!(f, "academic year not found: {id}"),
            Self::YearIsCurrent(label) => {
                write!(f, "academic year `{label}` is current and cannot be deleted")
            }
            Self::YearInUse { label, students } => write!(
                f,
                "academic year `{label}` is referenced by {students} student(s) and cannot be deleted"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for YearServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedLabel(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for YearServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::MalformedLabel(err) => Self::MalformedLabel(err),
            RepoError::DuplicateYear(label) => Self::DuplicateYear(label),
            RepoError::YearNotFound(id) => Self::YearNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Academic year admin facade.
pub struct AcademicYearService<R: YearRepository> {
    repo: R,
}

impl<R: YearRepository> AcademicYearService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists all years ordered by label.
    pub fn list_years(&self) -> Result<Vec<AcademicYear>, YearServiceError> {
        self.repo.list_years().map_err(Into::into)
    }

    pub fn get_year(&self, id: YearId) -> Result<Option<AcademicYear>, YearServiceError> {
        self.repo.get_year(id).map_err(Into::into)
    }

    pub fn find_year_by_label(
        &self,
        label: &str,
    ) -> Result<Option<AcademicYear>, YearServiceError> {
        self.repo.find_by_label(label).map_err(Into::into)
    }

    pub fn current_year(&self) -> Result<Option<AcademicYear>, YearServiceError> {
        self.repo.find_current().map_err(Into::into)
    }

    /// Creates one non-current year.
    pub fn create_year(&self, label: &str) -> Result<AcademicYear, YearServiceError> {
        validate_label(label).map_err(YearServiceError::MalformedLabel)?;
        if self.repo.exists_by_label(label)? {
            return Err(YearServiceError::DuplicateYear(label.to_string()));
        }

        let year = self.repo.create(label)?;
        info!(
            "event=year_create module=service status=ok year_id={} label={}",
            year.uuid, year.label
        );
        Ok(year)
    }

    /// Deletes one year that is neither current nor referenced.
    pub fn delete_year(&self, id: YearId) -> Result<(), YearServiceError> {
        let year = self
            .repo
            .get_year(id)?
            .ok_or(YearServiceError::YearNotFound(id))?;

        if year.is_current {
            return Err(YearServiceError::YearIsCurrent(year.label));
        }

        let students = self.repo.count_students_in_year(id)?;
        if students > 0 {
            return Err(YearServiceError::YearInUse {
                label: year.label,
                students,
            });
        }

        self.repo.delete_year(id)?;
        info!(
            "event=year_delete module=service status=ok year_id={} label={}",
            year.uuid, year.label
        );
        Ok(())
    }
}
