//! Promotion rule engine.
//!
//! # Responsibility
//! - Map a student's program code to what a year transition does to them.
//! - Keep the governed program-code vocabulary configurable.
//!
//! # Invariants
//! - Pure: no I/O, the input student is never mutated.
//! - A code on the track advances to the next code and follows the calendar.
//! - The last code on the track graduates: the student is archived and keeps
//!   the year they graduated under.
//! - Codes off the track follow the calendar with their code unchanged.
//! - Archived students come back unchanged.

use crate::model::academic_year::YearId;
use crate::model::student::Student;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Program codes of the default three-stage track.
pub const DEFAULT_TRACK: [&str; 3] = ["P1", "P2", "P3"];

/// What one transition does to one student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionOutcome {
    /// Moved to the next stage of the track and to the target year.
    Advanced { from: String, to: String },
    /// Reached the end of the track: archived, year unchanged.
    Graduated,
    /// Off-track code: moved to the target year, code unchanged.
    Carried,
}

/// Invalid track definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionRulesError {
    EmptyTrack,
    /// Zero-based position of a blank code.
    BlankCode(usize),
    DuplicateCode(String),
}

impl Display for PromotionRulesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTrack => write!(f, "promotion track must contain at least one program code"),
            Self::BlankCode(index) => {
                write!(f, "promotion track code at position {index} is blank")
            }
            Self::DuplicateCode(code) => {
                write!(f, "promotion track lists program code `{code}` more than once")
            }
        }
    }
}

impl Error for PromotionRulesError {}

/// Ordered track of governed program codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionRules {
    track: Vec<String>,
}

impl Default for PromotionRules {
    fn default() -> Self {
        Self {
            track: DEFAULT_TRACK.iter().map(|code| (*code).to_string()).collect(),
        }
    }
}

impl PromotionRules {
    /// Builds rules from an ordered list of program codes.
    ///
    /// Codes are trimmed; the list must be non-empty with unique, non-blank codes.
    pub fn from_track<I, S>(codes: I) -> Result<Self, PromotionRulesError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut track = Vec::new();
        let mut seen = HashSet::new();
        for (index, code) in codes.into_iter().enumerate() {
            let code = code.as_ref().trim();
            if code.is_empty() {
                return Err(PromotionRulesError::BlankCode(index));
            }
            if !seen.insert(code.to_string()) {
                return Err(PromotionRulesError::DuplicateCode(code.to_string()));
            }
            track.push(code.to_string());
        }

        if track.is_empty() {
            return Err(PromotionRulesError::EmptyTrack);
        }
        Ok(Self { track })
    }

    pub fn track(&self) -> &[String] {
        &self.track
    }

    /// Classifies what a transition does to a non-archived student with `program_code`.
    pub fn outcome_for(&self, program_code: &str) -> PromotionOutcome {
        let Some(position) = self.track.iter().position(|code| code == program_code) else {
            return PromotionOutcome::Carried;
        };

        match self.track.get(position + 1) {
            Some(next) => PromotionOutcome::Advanced {
                from: program_code.to_string(),
                to: next.clone(),
            },
            None => PromotionOutcome::Graduated,
        }
    }

    /// Returns the student as it should look after a transition to `target`.
    pub fn promote(&self, student: &Student, target: YearId) -> Student {
        let mut promoted = student.clone();
        if student.is_archived {
            return promoted;
        }

        match self.outcome_for(&student.program_code) {
            PromotionOutcome::Advanced { to, .. } => {
                promoted.program_code = to;
                promoted.year_uuid = target;
            }
            PromotionOutcome::Graduated => promoted.is_archived = true,
            PromotionOutcome::Carried => promoted.year_uuid = target,
        }
        promoted
    }
}

#[cfg(test)]
mod tests {
    use super::{PromotionOutcome, PromotionRules, PromotionRulesError};
    use crate::model::student::Student;
    use uuid::Uuid;

    fn student(code: &str, year: Uuid) -> Student {
        Student::new("Ada", "Lovelace", code, year)
    }

    #[test]
    fn default_track_advances_p1_and_p2_to_target_year() {
        let rules = PromotionRules::default();
        let (from, to) = (Uuid::new_v4(), Uuid::new_v4());

        let p1 = rules.promote(&student("P1", from), to);
        assert_eq!(p1.program_code, "P2");
        assert_eq!(p1.year_uuid, to);
        assert!(!p1.is_archived);

        let p2 = rules.promote(&student("P2", from), to);
        assert_eq!(p2.program_code, "P3");
        assert_eq!(p2.year_uuid, to);
        assert!(!p2.is_archived);
    }

    #[test]
    fn last_stage_graduates_and_keeps_year() {
        let rules = PromotionRules::default();
        let (from, to) = (Uuid::new_v4(), Uuid::new_v4());

        let p3 = rules.promote(&student("P3", from), to);
        assert!(p3.is_archived);
        assert_eq!(p3.program_code, "P3");
        assert_eq!(p3.year_uuid, from);
    }

    #[test]
    fn off_track_code_only_follows_calendar() {
        let rules = PromotionRules::default();
        let (from, to) = (Uuid::new_v4(), Uuid::new_v4());

        let other = rules.promote(&student("X9", from), to);
        assert_eq!(other.program_code, "X9");
        assert_eq!(other.year_uuid, to);
        assert!(!other.is_archived);

        // Matching is exact.
        assert_eq!(rules.outcome_for("p1"), PromotionOutcome::Carried);
    }

    #[test]
    fn archived_student_is_returned_unchanged() {
        let rules = PromotionRules::default();
        let mut archived = student("P1", Uuid::new_v4());
        archived.is_archived = true;

        assert_eq!(rules.promote(&archived, Uuid::new_v4()), archived);
    }

    #[test]
    fn custom_track_uses_configured_vocabulary() {
        let rules = PromotionRules::from_track(["L1", "L2", "L3"]).unwrap();
        assert_eq!(
            rules.outcome_for("L2"),
            PromotionOutcome::Advanced {
                from: "L2".to_string(),
                to: "L3".to_string()
            }
        );
        assert_eq!(rules.outcome_for("L3"), PromotionOutcome::Graduated);
        assert_eq!(rules.outcome_for("P1"), PromotionOutcome::Carried);
    }

    #[test]
    fn single_code_track_graduates_immediately() {
        let rules = PromotionRules::from_track([" M2 "]).unwrap();
        assert_eq!(rules.track().to_vec(), vec!["M2".to_string()]);
        assert_eq!(rules.outcome_for("M2"), PromotionOutcome::Graduated);
    }

    #[test]
    fn invalid_tracks_are_rejected() {
        let empty: [&str; 0] = [];
        assert_eq!(
            PromotionRules::from_track(empty).unwrap_err(),
            PromotionRulesError::EmptyTrack
        );
        assert_eq!(
            PromotionRules::from_track(["P1", "  "]).unwrap_err(),
            PromotionRulesError::BlankCode(1)
        );
        assert_eq!(
            PromotionRules::from_track(["P1", "P2", "P1"]).unwrap_err(),
            PromotionRulesError::DuplicateCode("P1".to_string())
        );
    }
}
