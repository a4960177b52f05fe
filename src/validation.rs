//! Input validation for timetabling problems.
//!
//! Checks structural integrity of the entity catalog before any generation
//! run starts. Detects:
//! - Duplicate IDs and duplicate subject/room codes
//! - Missing or numerically invalid fields
//! - Dangling references (eligibility, curriculum, mentor)
//! - A malformed slot grid
//! - Constraint parameters that do not fit their rule kind
//!
//! All problems are collected and returned together.

use std::collections::HashSet;

use crate::constraints::ConstraintRegistry;
use crate::models::{Constraint, Faculty, Room, Section, SlotGrid, Subject};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Offending entity.
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// Two subjects or rooms share the same code.
    DuplicateCode,
    /// A required field is empty.
    MissingField,
    /// A numeric field is out of range.
    InvalidNumber,
    /// A reference points to an entity that doesn't exist.
    InvalidReference,
    /// The slot grid is empty, unordered or has inverted slots.
    InvalidTimeSlot,
    /// Constraint parameters don't deserialize for their kind.
    InvalidParameters,
}

impl ValidationError {
    pub fn new(
        kind: ValidationErrorKind,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }

    /// `Ok(())` when `errors` is empty.
    pub fn collect(errors: Vec<ValidationError>) -> ValidationResult {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Borrowed view of everything a run needs.
#[derive(Debug, Clone, Copy)]
pub struct InputRef<'a> {
    pub faculty: &'a [Faculty],
    pub subjects: &'a [Subject],
    pub rooms: &'a [Room],
    pub sections: &'a [Section],
    pub constraints: &'a [Constraint],
    pub grid: &'a SlotGrid,
}

/// Validates the input data for a timetabling problem.
///
/// Checks:
/// 1. Per-entity field checks
/// 2. No duplicate IDs within an entity family
/// 3. No duplicate subject codes or room codes
/// 4. Eligibility, curriculum and mentor references resolve
/// 5. The slot grid is non-empty, ordered and well-formed
/// 6. Every constraint with a known kind has well-typed parameters
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(input: InputRef<'_>) -> ValidationResult {
    let mut errors = Vec::new();

    let mut entity_errors = |result: ValidationResult| {
        if let Err(mut e) = result {
            errors.append(&mut e);
        }
    };
    input.faculty.iter().for_each(|f| entity_errors(f.validate()));
    input.subjects.iter().for_each(|s| entity_errors(s.validate()));
    input.rooms.iter().for_each(|r| entity_errors(r.validate()));
    input.sections.iter().for_each(|s| entity_errors(s.validate()));
    input
        .constraints
        .iter()
        .for_each(|c| entity_errors(c.validate()));

    let faculty_ids = unique_ids(input.faculty.iter().map(|f| f.id.as_str()), "faculty", &mut errors);
    let subject_ids = unique_ids(input.subjects.iter().map(|s| s.id.as_str()), "subject", &mut errors);
    unique_ids(input.rooms.iter().map(|r| r.id.as_str()), "room", &mut errors);
    unique_ids(input.sections.iter().map(|s| s.id.as_str()), "section", &mut errors);
    unique_ids(input.constraints.iter().map(|c| c.id.as_str()), "constraint", &mut errors);

    let mut subject_codes = HashSet::new();
    for s in input.subjects {
        if !subject_codes.insert(s.code.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateCode,
                &s.id,
                format!("Duplicate subject code: {}", s.code),
            ));
        }
    }
    let mut room_codes = HashSet::new();
    for r in input.rooms {
        if !room_codes.insert(r.code.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateCode,
                &r.id,
                format!("Duplicate room code: {}", r.code),
            ));
        }
    }

    let subject_known = |key: &str| subject_ids.contains(key) || subject_codes.contains(key);

    for s in input.subjects {
        for f in &s.eligible_faculty {
            if !faculty_ids.contains(f.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidReference,
                    &s.id,
                    format!("Subject '{}' lists unknown faculty '{}'", s.code, f),
                ));
            }
        }
    }
    for f in input.faculty {
        for s in &f.eligible_subjects {
            if !subject_known(s) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidReference,
                    &f.id,
                    format!("Faculty '{}' lists unknown subject '{}'", f.name, s),
                ));
            }
        }
    }
    for sec in input.sections {
        for s in &sec.curriculum {
            if !subject_known(s) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidReference,
                    &sec.id,
                    format!("Section '{}' takes unknown subject '{}'", sec.name, s),
                ));
            }
        }
        if let Some(mentor) = &sec.mentor_id {
            if !faculty_ids.contains(mentor.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidReference,
                    &sec.id,
                    format!("Section '{}' has unknown mentor '{}'", sec.name, mentor),
                ));
            }
        }
    }

    validate_grid(input.grid, &mut errors);

    let registry = ConstraintRegistry::builtin();
    for c in input.constraints {
        if let Err(message) = registry.compile(c) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidParameters,
                &c.id,
                message,
            ));
        }
    }

    ValidationError::collect(errors)
}

fn unique_ids<'a>(
    ids: impl Iterator<Item = &'a str>,
    family: &str,
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                id,
                format!("Duplicate {family} ID: {id}"),
            ));
        }
    }
    seen
}

/// Checks the slot grid on its own.
pub fn validate_grid(grid: &SlotGrid, errors: &mut Vec<ValidationError>) {
    if grid.teaching_slot_count() == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidTimeSlot,
            "",
            "slot grid has no teaching slots",
        ));
    }
    let mut ids = HashSet::new();
    let mut previous_end = None;
    for slot in grid.slots() {
        if !ids.insert(slot.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                &slot.id,
                format!("Duplicate time slot ID: {}", slot.id),
            ));
        }
        if slot.end_time <= slot.start_time {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTimeSlot,
                &slot.id,
                format!(
                    "Time slot '{}' ends ({}) before it starts ({})",
                    slot.id, slot.end_time, slot.start_time
                ),
            ));
        }
        if let Some(end) = previous_end {
            if slot.start_time < end {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidTimeSlot,
                    &slot.id,
                    format!("Time slot '{}' starts before the previous slot ends", slot.id),
                ));
            }
        }
        previous_end = Some(slot.end_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ClockTime, ConstraintCategory, ConstraintPriority, RoomType, TimeSlot,
    };
    use serde_json::json;

    struct Fixture {
        faculty: Vec<Faculty>,
        subjects: Vec<Subject>,
        rooms: Vec<Room>,
        sections: Vec<Section>,
        constraints: Vec<Constraint>,
        grid: SlotGrid,
    }

    impl Fixture {
        fn valid() -> Self {
            Self {
                faculty: vec![Faculty::new("F1", "Dr. Mitchell", "CSE").with_subject("CS301")],
                subjects: vec![Subject::new("S1", "CS301")
                    .with_hours(3, 1, 2)
                    .with_faculty("F1")],
                rooms: vec![Room::new("LAB-A1", RoomType::Lab, 40)],
                sections: vec![Section::new("SEC1", "CS-3A", 60)
                    .with_subject("S1")
                    .with_mentor("F1")],
                constraints: vec![Constraint::new(
                    "C1",
                    "Maximum Daily Hours",
                    ConstraintCategory::Faculty,
                    ConstraintPriority::Mandatory,
                )
                .with_parameters(json!({"maxHours": 6}))],
                grid: SlotGrid::institutional(),
            }
        }

        fn check(&self) -> ValidationResult {
            validate_input(InputRef {
                faculty: &self.faculty,
                subjects: &self.subjects,
                rooms: &self.rooms,
                sections: &self.sections,
                constraints: &self.constraints,
                grid: &self.grid,
            })
        }
    }

    fn kinds(result: ValidationResult) -> Vec<ValidationErrorKind> {
        result.unwrap_err().into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_input() {
        assert!(Fixture::valid().check().is_ok());
    }

    #[test]
    fn test_duplicate_ids_and_codes() {
        let mut fx = Fixture::valid();
        fx.faculty.push(Faculty::new("F1", "Dr. Park", "CSE"));
        fx.subjects.push(Subject::new("S2", "CS301"));
        let k = kinds(fx.check());
        assert!(k.contains(&ValidationErrorKind::DuplicateId));
        assert!(k.contains(&ValidationErrorKind::DuplicateCode));
    }

    #[test]
    fn test_negative_credits() {
        let mut fx = Fixture::valid();
        fx.subjects[0].credits = -1;
        let errors = fx.check().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidNumber);
        assert_eq!(errors[0].entity_id, "S1");
    }

    #[test]
    fn test_invalid_references() {
        let mut fx = Fixture::valid();
        fx.subjects[0].eligible_faculty.push("F9".into());
        fx.sections[0].curriculum.push("CS999".into());
        fx.sections[0].mentor_id = Some("F8".into());
        let k = kinds(fx.check());
        assert_eq!(
            k.iter()
                .filter(|k| **k == ValidationErrorKind::InvalidReference)
                .count(),
            3
        );
    }

    #[test]
    fn test_curriculum_by_code_resolves() {
        let mut fx = Fixture::valid();
        fx.sections[0].curriculum = vec!["CS301".into()];
        assert!(fx.check().is_ok());
    }

    #[test]
    fn test_bad_grid() {
        let mut fx = Fixture::valid();
        let t = |s: &str| s.parse::<ClockTime>().unwrap();
        fx.grid = SlotGrid::new(vec![
            TimeSlot::teaching("t1", t("10:00"), t("09:00")),
            TimeSlot::teaching("t1", t("09:30"), t("10:30")),
        ]);
        let k = kinds(fx.check());
        assert!(k.contains(&ValidationErrorKind::InvalidTimeSlot));
        assert!(k.contains(&ValidationErrorKind::DuplicateId));

        fx.grid = SlotGrid::new(Vec::new());
        assert_eq!(kinds(fx.check()), vec![ValidationErrorKind::InvalidTimeSlot]);
    }

    #[test]
    fn test_bad_constraint_parameters() {
        let mut fx = Fixture::valid();
        fx.constraints[0].parameters = json!({"maxHours": "six"});
        let errors = fx.check().unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidParameters);
        assert_eq!(errors[0].entity_id, "C1");
    }

    #[test]
    fn test_unknown_constraint_kind_is_not_an_error() {
        let mut fx = Fixture::valid();
        fx.constraints.push(Constraint::new(
            "C2",
            "Projector Preference",
            ConstraintCategory::Room,
            ConstraintPriority::Optional,
        ));
        assert!(fx.check().is_ok());
    }
}
