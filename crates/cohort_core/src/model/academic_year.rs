//! Academic year model and transition validator.
//!
//! # Responsibility
//! - Define the `AcademicYear` record.
//! - Parse `YYYY-YYYY` labels and decide whether one label is the immediate
//!   successor of another.
//!
//! # Invariants
//! - A well-formed label is exactly four ASCII digits, a dash, four ASCII digits.
//! - `is_sequential` never panics and never errors: anything it cannot parse
//!   is simply not a valid transition.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static YEAR_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{4}$").expect("valid year label regex"));

/// Stable identifier of an academic year record.
pub type YearId = Uuid;

/// Labeled period students are grouped under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicYear {
    pub uuid: YearId,
    /// `YYYY-YYYY`, unique across all years.
    pub label: String,
    /// Exactly one year carries this flag once the first transition ran.
    pub is_current: bool,
}

impl AcademicYear {
    /// Creates a non-current year with a generated id.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            label: label.into(),
            is_current: false,
        }
    }

    /// Start year parsed from the label, when the label is well formed.
    pub fn start_year(&self) -> Option<i32> {
        label_start_year(&self.label)
    }
}

/// Label did not match `YYYY-YYYY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLabel(pub String);

impl Display for MalformedLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "academic year label `{}` must match YYYY-YYYY", self.0)
    }
}

impl Error for MalformedLabel {}

/// Checks that `label` is a well-formed `YYYY-YYYY` academic year label.
pub fn validate_label(label: &str) -> Result<(), MalformedLabel> {
    if YEAR_LABEL_RE.is_match(label) {
        Ok(())
    } else {
        Err(MalformedLabel(label.to_string()))
    }
}

/// Returns the start year of a well-formed label.
pub fn label_start_year(label: &str) -> Option<i32> {
    validate_label(label).ok()?;
    label.get(..4)?.parse().ok()
}

/// Returns whether `proposed` is the immediate successor of `current`.
///
/// Only `start(proposed) == start(current) + 1` qualifies: equal labels,
/// multi-year jumps, past years and malformed labels are all rejected.
pub fn is_sequential(current: &str, proposed: &str) -> bool {
    match (label_start_year(current), label_start_year(proposed)) {
        (Some(current_start), Some(proposed_start)) => {
            current_start.checked_add(1) == Some(proposed_start)
        }
        _ => false,
    }
}
