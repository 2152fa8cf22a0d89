//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Host the promotion rules and the year transition state machine.
//! - Keep CLI callers decoupled from storage details.

pub mod academic_year_service;
pub mod promotion;
pub mod student_service;
pub mod year_transition_service;
