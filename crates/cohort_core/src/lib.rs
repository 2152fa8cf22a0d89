//! Core domain logic for cohort tracking.
//! This crate is the single source of truth for academic year transitions:
//! which year is current, and what happens to students when it changes.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CohortConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::academic_year::{
    is_sequential, label_start_year, validate_label, AcademicYear, MalformedLabel, YearId,
};
pub use model::student::{Student, StudentId, StudentValidationError};
pub use repo::student_repo::{
    ProgramYearStats, SqliteStudentRepository, StudentListQuery, StudentRepository,
};
pub use repo::transition_store::SqliteTransitionStore;
pub use repo::year_repo::{SqliteYearRepository, YearRepository};
pub use repo::{RepoError, RepoResult};
pub use service::academic_year_service::{AcademicYearService, YearServiceError};
pub use service::promotion::{PromotionOutcome, PromotionRules, PromotionRulesError};
pub use service::student_service::{
    EnrollStudentRequest, StudentService, StudentServiceError, UpdateStudentRequest,
};
pub use service::year_transition_service::{
    TransitionError, TransitionReport, YearTransitionService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
