//! Error taxonomy.
//!
//! Input problems are [`ValidationError`]s, rejected before a run starts.
//! An unsatisfiable mandatory rule for one requirement is *not* an error:
//! it is reported as an unresolved requirement. A double reservation in
//! the availability index is a [`ConflictError`] and aborts the run.

use thiserror::Error;

use crate::models::Day;
use crate::validation::ValidationError;

/// Which occupancy table a conflict was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Faculty,
    Room,
    Section,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ResourceKind::Faculty => "faculty",
            ResourceKind::Room => "room",
            ResourceKind::Section => "section",
        })
    }
}

/// A reservation collided with an existing booking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{resource} '{id}' is already booked on {day} at slot {slot_id}")]
pub struct ConflictError {
    pub day: Day,
    pub slot_id: String,
    pub resource: ResourceKind,
    pub id: String,
}

/// Errors surfaced by the scheduler.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid input: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    #[error("availability conflict: {0}")]
    Conflict(#[from] ConflictError),

    #[error("workload limit exceeded for faculty '{faculty_id}': {message}")]
    ConstraintViolation { faculty_id: String, message: String },

    #[error("a generation run is already in progress")]
    RunInProgress,

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ScheduleError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }
}

impl From<Vec<ValidationError>> for ScheduleError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_conflict_message() {
        let err = ScheduleError::from(ConflictError {
            day: Day::Monday,
            slot_id: "t1".into(),
            resource: ResourceKind::Room,
            id: "LH-102".into(),
        });
        assert_eq!(
            err.to_string(),
            "availability conflict: room 'LH-102' is already booked on Monday at slot t1"
        );
    }

    #[test]
    fn test_validation_summary() {
        let errors = vec![
            ValidationError::new(ValidationErrorKind::InvalidNumber, "S1", "bad credits"),
            ValidationError::new(ValidationErrorKind::MissingField, "S2", "no code"),
        ];
        let err = ScheduleError::from(errors);
        assert_eq!(err.to_string(), "invalid input: bad credits (and 1 more)");
    }

    #[test]
    fn test_not_found() {
        let err = ScheduleError::not_found("section", "SEC9");
        assert_eq!(err.to_string(), "section 'SEC9' not found");
    }
}
