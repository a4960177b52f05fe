//! Section model.
//!
//! A section is a student cohort that attends every session together.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use super::{id_string, opt_id_string};
use crate::validation::{ValidationError, ValidationErrorKind, ValidationResult};

/// Lifecycle status of a section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SectionStatus {
    #[default]
    #[serde(alias = "active")]
    Active,
    #[serde(alias = "draft")]
    Draft,
}

/// A student cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// Display name (e.g. "CS-3A").
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub year: i32,
    /// Headcount.
    #[serde(alias = "strength")]
    pub capacity: i32,
    #[serde(default)]
    pub status: SectionStatus,
    #[serde(
        default,
        deserialize_with = "opt_id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub mentor_id: Option<String>,
    /// Subject ids taken by this section. Empty means derived from
    /// department and year.
    #[serde(default, alias = "subjects")]
    pub curriculum: Vec<String>,
}

impl Section {
    pub fn new(id: impl Into<String>, name: impl Into<String>, capacity: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            department: String::new(),
            year: 0,
            capacity,
            status: SectionStatus::Active,
            mentor_id: None,
            curriculum: Vec::new(),
        }
    }

    pub fn with_department(mut self, department: impl Into<String>, year: i32) -> Self {
        self.department = department.into();
        self.year = year;
        self
    }

    pub fn with_status(mut self, status: SectionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_mentor(mut self, faculty_id: impl Into<String>) -> Self {
        self.mentor_id = Some(faculty_id.into());
        self
    }

    /// Adds a subject id to the curriculum.
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.curriculum.push(subject_id.into());
        self
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == SectionStatus::Active
    }

    /// Field-level checks.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        if self.id.trim().is_empty() || self.name.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingField,
                &self.id,
                "section id and name are required",
            ));
        }
        if self.capacity <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidNumber,
                &self.id,
                format!(
                    "section {} capacity must be positive, got {}",
                    self.name, self.capacity
                ),
            ));
        }
        ValidationError::collect(errors)
    }
}

impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Section {}

impl Hash for Section {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_builder() {
        let s = Section::new("SEC1", "CS-3A", 60)
            .with_department("CSE", 3)
            .with_mentor("F1")
            .with_subject("S1");
        assert!(s.is_active());
        assert_eq!(s.curriculum, vec!["S1".to_string()]);
        assert_eq!(s.mentor_id.as_deref(), Some("F1"));
    }

    #[test]
    fn test_section_validation() {
        let errors = Section::new("SEC1", "", -5).validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_section_wire_shape() {
        let json = r#"{"id": 1, "name": "CS-3A", "department": "CSE", "year": 3,
                       "capacity": 60, "status": "DRAFT", "mentorId": 12,
                       "subjects": ["CS301", "CS302"]}"#;
        let s: Section = serde_json::from_str(json).unwrap();
        assert_eq!(s.status, SectionStatus::Draft);
        assert_eq!(s.mentor_id.as_deref(), Some("12"));
        assert_eq!(s.curriculum.len(), 2);
        assert!(!s.is_active());
    }
}
