//! Domain model for academic years and the students grouped under them.
//!
//! # Responsibility
//! - Define plain value objects shared by repositories and services.
//! - Own label parsing and the sequential-transition rule.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - A student always references exactly one academic year.

pub mod academic_year;
pub mod student;
