//! Student use-case service.
//!
//! # Responsibility
//! - Enroll students under an existing academic year.
//! - Correct and remove individual student records.
//! - Provide lookup, listing and per-program statistics.
//!
//! # Invariants
//! - Enrolled students start non-archived.
//! - Enrollment and correction never create academic years; a referenced
//!   year must already exist.
//! - An archived student's year is never reassigned.

use crate::model::academic_year::YearId;
use crate::model::student::{Student, StudentId, StudentValidationError};
use crate::repo::student_repo::{ProgramYearStats, StudentListQuery, StudentRepository};
use crate::repo::year_repo::YearRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from student use-cases.
#[derive(Debug)]
pub enum StudentServiceError {
    InvalidInput(StudentValidationError),
    YearNotFound(YearId),
    /// No year was given and none is current yet.
    NoCurrentYear,
    StudentNotFound(StudentId),
    /// Archived students keep their graduation year.
    ArchivedYearFrozen(StudentId),
    /// Repository-level failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for StudentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::YearNotFound(id) => write!(f, "academic year not found: {id}"),
            Self::NoCurrentYear => write!(f, "no current academic year; pass a year explicitly"),
            Self::StudentNotFound(id) => write!(f, "student not found: {id}"),
            Self::ArchivedYearFrozen(id) => {
                write!(f, "student {id} is archived; its academic year cannot change")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent student state: {details}"),
        }
    }
}

impl Error for StudentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StudentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidInput(err),
            RepoError::YearNotFound(id) => Self::YearNotFound(id),
            RepoError::StudentNotFound(id) => Self::StudentNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Enrollment request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollStudentRequest {
    pub first_name: String,
    pub last_name: String,
    /// Blank values are stored as `None`.
    pub email: Option<String>,
    pub program_code: String,
    /// Defaults to the current year.
    pub year_uuid: Option<YearId>,
}

/// Partial correction of one student. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateStudentRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `Some("")` clears the stored email.
    pub email: Option<String>,
    pub program_code: Option<String>,
    /// Refused for archived students unless it names their current year.
    pub year_uuid: Option<YearId>,
}

/// Student service facade.
pub struct StudentService<S: StudentRepository, Y: YearRepository> {
    students: S,
    years: Y,
}

impl<S: StudentRepository, Y: YearRepository> StudentService<S, Y> {
    pub fn new(students: S, years: Y) -> Self {
        Self { students, years }
    }

    /// Enrolls one active student.
    ///
    /// # Contract
    /// - Name fields, email and program code are trimmed.
    /// - Without `year_uuid` the student is placed in the current year.
    /// - Returns the stored record as read back from storage.
    pub fn enroll(&self, request: &EnrollStudentRequest) -> Result<Student, StudentServiceError> {
        let mut student = Student::new(
            request.first_name.trim(),
            request.last_name.trim(),
            request.program_code.trim(),
            YearId::nil(),
        );
        student.email = request
            .email
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        student
            .validate()
            .map_err(StudentServiceError::InvalidInput)?;

        let year_uuid = self.resolve_year(request.year_uuid)?;
        student.year_uuid = year_uuid;

        let id = self.students.create_student(&student)?;
        info!(
            "event=student_enroll module=service status=ok student_id={} year_id={} program={}",
            id, year_uuid, student.program_code
        );
        self.students
            .get_student(id)?
            .ok_or(StudentServiceError::InconsistentState(
                "enrolled student not found in read-back",
            ))
    }

    fn resolve_year(&self, requested: Option<YearId>) -> Result<YearId, StudentServiceError> {
        let year = match requested {
            Some(id) => self
                .years
                .get_year(id)?
                .ok_or(StudentServiceError::YearNotFound(id))?,
            None => self
                .years
                .find_current()?
                .ok_or(StudentServiceError::NoCurrentYear)?,
        };
        Ok(year.uuid)
    }

    /// Applies a partial correction and returns the stored record.
    ///
    /// # Contract
    /// - Text fields are trimmed and the result is validated before any write.
    /// - A new `year_uuid` must name an existing year.
    /// - Archived students reject a year change with `ArchivedYearFrozen`.
    pub fn update_student(
        &self,
        id: StudentId,
        request: &UpdateStudentRequest,
    ) -> Result<Student, StudentServiceError> {
        let mut student = self
            .students
            .get_student(id)?
            .ok_or(StudentServiceError::StudentNotFound(id))?;

        if let Some(first_name) = &request.first_name {
            student.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = &request.last_name {
            student.last_name = last_name.trim().to_string();
        }
        if let Some(program_code) = &request.program_code {
            student.program_code = program_code.trim().to_string();
        }
        if let Some(email) = &request.email {
            let email = email.trim();
            student.email = (!email.is_empty()).then(|| email.to_string());
        }
        student
            .validate()
            .map_err(StudentServiceError::InvalidInput)?;

        if let Some(year_uuid) = request.year_uuid {
            if year_uuid != student.year_uuid {
                if student.is_archived {
                    return Err(StudentServiceError::ArchivedYearFrozen(id));
                }
                student.year_uuid = self.resolve_year(Some(year_uuid))?;
            }
        }

        self.students.update_student(&student)?;
        info!(
            "event=student_update module=service status=ok student_id={} year_id={} program={}",
            id, student.year_uuid, student.program_code
        );
        self.students
            .get_student(id)?
            .ok_or(StudentServiceError::InconsistentState(
                "updated student not found in read-back",
            ))
    }

    /// Hard-deletes one student record.
    pub fn delete_student(&self, id: StudentId) -> Result<(), StudentServiceError> {
        self.students.delete_student(id)?;
        info!("event=student_delete module=service status=ok student_id={id}");
        Ok(())
    }

    pub fn get_student(&self, id: StudentId) -> Result<Option<Student>, StudentServiceError> {
        self.students.get_student(id).map_err(Into::into)
    }

    pub fn list_students(
        &self,
        query: &StudentListQuery,
    ) -> Result<Vec<Student>, StudentServiceError> {
        self.students.list_students(query).map_err(Into::into)
    }

    /// Head counts per program code and year label.
    pub fn program_statistics(&self) -> Result<Vec<ProgramYearStats>, StudentServiceError> {
        self.students.program_statistics().map_err(Into::into)
    }
}
