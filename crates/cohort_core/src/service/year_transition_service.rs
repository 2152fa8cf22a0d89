//! Academic year transition use-case service.
//!
//! # Responsibility
//! - Validate a proposed academic year against the current one.
//! - Resolve or create the target year.
//! - Promote every active student of the outgoing year.
//! - Move the current flag to the target year.
//!
//! # Invariants
//! - This is the only code path that changes which year is current.
//! - All steps run in one `TransitionStore` transaction: on any error nothing
//!   is promoted and the current flag stays where it was.
//! - Validation failures are reported before any write happens.
//! - Students are promoted at most once per transition: only non-archived
//!   students of the outgoing year are loaded, and the outgoing year stops
//!   being current in the same commit.

use crate::model::academic_year::{is_sequential, validate_label, AcademicYear, MalformedLabel};
use crate::repo::student_repo::{StudentRepository, StudentStore};
use crate::repo::transition_store::{SqliteTransitionStore, TransitionStore};
use crate::repo::year_repo::{YearRepository, YearStore};
use crate::repo::RepoError;
use crate::service::promotion::{PromotionOutcome, PromotionRules};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from year transition operations.
#[derive(Debug)]
pub enum TransitionError {
    /// Proposed label is not the immediate successor of the current label.
    Rejected { current: String, proposed: String },
    /// Bootstrap label does not match `YYYY-YYYY`.
    MalformedLabel(MalformedLabel),
    /// Target label was created concurrently by another writer.
    DuplicateYear(String),
    /// Storage failure; the transaction was rolled back.
    Internal(RepoError),
}

impl TransitionError {
    /// Returns whether the caller's input was at fault, as opposed to storage.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::MalformedLabel(_))
    }
}

impl Display for TransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { current, proposed } => write!(
                f,
                "transition from {current} to {proposed} is not allowed; only the immediately following academic year is accepted"
            ),
            Self::MalformedLabel(err) => write!(f, "{err}"),
            Self::DuplicateYear(label) => write!(f, "academic year `{label}` already exists"),
            Self::Internal(err) => write!(f, "year transition failed: {err}"),
        }
    }
}

impl Error for TransitionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedLabel(err) => Some(err),
            Self::Internal(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TransitionError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateYear(label) => Self::DuplicateYear(label),
            RepoError::MalformedLabel(err) => Self::MalformedLabel(err),
            other => Self::Internal(other),
        }
    }
}

/// Summary of one successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionReport {
    /// New current year.
    pub year: AcademicYear,
    /// Label of the year that was current before; `None` on bootstrap.
    pub previous_label: Option<String>,
    /// Students moved to the next stage of the track.
    pub advanced: usize,
    /// Students archived at the end of the track.
    pub graduated: usize,
    /// Off-track students moved to the new year with their code unchanged.
    pub carried: usize,
}

impl TransitionReport {
    pub fn is_bootstrap(&self) -> bool {
        self.previous_label.is_none()
    }

    pub fn promoted_total(&self) -> usize {
        self.advanced + self.graduated + self.carried
    }
}

/// Orchestrates academic year transitions.
pub struct YearTransitionService<'conn> {
    store: SqliteTransitionStore<'conn>,
    rules: PromotionRules,
}

impl<'conn> YearTransitionService<'conn> {
    /// Creates a service with the default `P1 -> P2 -> P3` track.
    pub fn new(store: SqliteTransitionStore<'conn>) -> Self {
        Self::with_rules(store, PromotionRules::default())
    }

    pub fn with_rules(store: SqliteTransitionStore<'conn>, rules: PromotionRules) -> Self {
        Self { store, rules }
    }

    pub fn rules(&self) -> &PromotionRules {
        &self.rules
    }

    /// Makes `label` the current academic year, promoting students.
    ///
    /// # Contract
    /// - No current year: `label` must be well formed; it is created (or
    ///   reused) and flagged current. Nothing is promoted.
    /// - Otherwise `label` must start exactly one year after the current
    ///   label, else `TransitionError::Rejected` and nothing changes.
    /// - Returns the new current year.
    pub fn advance_to_year(&self, label: &str) -> Result<AcademicYear, TransitionError> {
        self.advance_to_year_with_report(label)
            .map(|report| report.year)
    }

    /// Same as `advance_to_year`, also reporting per-outcome student counts.
    pub fn advance_to_year_with_report(
        &self,
        label: &str,
    ) -> Result<TransitionReport, TransitionError> {
        advance_in(&self.store, &self.rules, label)
    }
}

fn advance_in<S: TransitionStore>(
    store: &S,
    rules: &PromotionRules,
    label: &str,
) -> Result<TransitionReport, TransitionError> {
    let started_at = Instant::now();
    info!("event=year_transition module=service status=start proposed={label}");

    let result =
        store.within_transaction(|years, students| run_transition(rules, years, students, label));

    match &result {
        Ok(report) => info!(
            "event=year_transition module=service status=ok from={} to={} advanced={} graduated={} carried={} duration_ms={}",
            report.previous_label.as_deref().unwrap_or("none"),
            report.year.label,
            report.advanced,
            report.graduated,
            report.carried,
            started_at.elapsed().as_millis()
        ),
        Err(err) if err.is_rejected() => warn!(
            "event=year_transition module=service status=rejected proposed={label} duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=year_transition module=service status=error proposed={label} duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
    }

    result
}

fn run_transition(
    rules: &PromotionRules,
    years: &dyn YearStore,
    students: &dyn StudentStore,
    label: &str,
) -> Result<TransitionReport, TransitionError> {
    let Some(current) = years.find_current()? else {
        return bootstrap(years, label);
    };

    if !is_sequential(&current.label, label) {
        return Err(TransitionError::Rejected {
            current: current.label,
            proposed: label.to_string(),
        });
    }

    let mut target = match years.find_by_label(label)? {
        Some(existing) => existing,
        None => years.create(label)?,
    };

    let outgoing = students.find_active_by_year(current.uuid)?;
    let (mut advanced, mut graduated, mut carried) = (0, 0, 0);
    let mut promoted = Vec::with_capacity(outgoing.len());
    for student in &outgoing {
        match rules.outcome_for(&student.program_code) {
            PromotionOutcome::Advanced { .. } => advanced += 1,
            PromotionOutcome::Graduated => graduated += 1,
            PromotionOutcome::Carried => carried += 1,
        }
        promoted.push(rules.promote(student, target.uuid));
    }
    students.save_all(&promoted)?;

    years.clear_current_flag()?;
    years.set_current(target.uuid)?;
    target.is_current = true;

    let report = TransitionReport {
        year: target,
        previous_label: Some(current.label),
        advanced,
        graduated,
        carried,
    };
    Ok(report)
}

fn bootstrap(years: &dyn YearStore, label: &str) -> Result<TransitionReport, TransitionError> {
    validate_label(label).map_err(TransitionError::MalformedLabel)?;

    let mut year = match years.find_by_label(label)? {
        Some(existing) => existing,
        None => years.create(label)?,
    };
    years.set_current(year.uuid)?;
    year.is_current = true;

    Ok(TransitionReport {
        year,
        previous_label: None,
        advanced: 0,
        graduated: 0,
        carried: 0,
    })
}
