//! Student model.
//!
//! # Responsibility
//! - Define the student record moved around by year transitions.
//! - Validate identity fields before they reach storage.
//!
//! # Invariants
//! - `year_uuid` always points at an existing academic year.
//! - Once `is_archived` is set the record is frozen: its year is the
//!   graduation year and is never reassigned.

use crate::model::academic_year::YearId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a student record.
pub type StudentId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub uuid: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    /// Free-form short code; only codes on the configured track are promoted.
    pub program_code: String,
    pub is_archived: bool,
    pub year_uuid: YearId,
}

/// Validation failures for student identity fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentValidationError {
    BlankFirstName,
    BlankLastName,
    BlankProgramCode,
}

impl Display for StudentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankFirstName => write!(f, "student first name must not be blank"),
            Self::BlankLastName => write!(f, "student last name must not be blank"),
            Self::BlankProgramCode => write!(f, "student program code must not be blank"),
        }
    }
}

impl Error for StudentValidationError {}

impl Student {
    /// Creates an active student with a generated id.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        program_code: impl Into<String>,
        year_uuid: YearId,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            program_code: program_code.into(),
            is_archived: false,
            year_uuid,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Returns whether year transitions still apply to this student.
    pub fn is_active(&self) -> bool {
        !self.is_archived
    }

    pub fn validate(&self) -> Result<(), StudentValidationError> {
        if self.first_name.trim().is_empty() {
            return Err(StudentValidationError::BlankFirstName);
        }
        if self.last_name.trim().is_empty() {
            return Err(StudentValidationError::BlankLastName);
        }
        if self.program_code.trim().is_empty() {
            return Err(StudentValidationError::BlankProgramCode);
        }
        Ok(())
    }
}
