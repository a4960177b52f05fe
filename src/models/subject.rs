//! Subject model.
//!
//! A subject demands a fixed number of lecture, tutorial and lab contact
//! hours per week from every section that takes it.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use super::{id_string, SessionType};
use crate::validation::{ValidationError, ValidationErrorKind, ValidationResult};

/// A course taught to sections.
///
/// Equality and hashing are by `id` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// Unique subject code (e.g. "CS301").
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub credits: i32,
    #[serde(default)]
    pub lecture_hours_per_week: i32,
    #[serde(default)]
    pub tutorial_hours_per_week: i32,
    #[serde(default)]
    pub lab_hours_per_week: i32,
    #[serde(default, alias = "isElective")]
    pub elective: bool,
    /// Taught jointly across departments.
    #[serde(default)]
    pub common_course: bool,
    /// Target year of study.
    #[serde(default)]
    pub year: i32,
    /// Faculty ids eligible to teach this subject.
    #[serde(default)]
    pub eligible_faculty: Vec<String>,
}

impl Subject {
    /// Creates a subject with no weekly hours.
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: String::new(),
            department: String::new(),
            credits: 0,
            lecture_hours_per_week: 0,
            tutorial_hours_per_week: 0,
            lab_hours_per_week: 0,
            elective: false,
            common_course: false,
            year: 0,
            eligible_faculty: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_department(mut self, department: impl Into<String>, year: i32) -> Self {
        self.department = department.into();
        self.year = year;
        self
    }

    pub fn with_credits(mut self, credits: i32) -> Self {
        self.credits = credits;
        self
    }

    /// Sets lecture / tutorial / lab hours per week.
    pub fn with_hours(mut self, lecture: i32, tutorial: i32, lab: i32) -> Self {
        self.lecture_hours_per_week = lecture;
        self.tutorial_hours_per_week = tutorial;
        self.lab_hours_per_week = lab;
        self
    }

    pub fn with_elective(mut self, elective: bool) -> Self {
        self.elective = elective;
        self
    }

    /// Adds an eligible faculty id.
    pub fn with_faculty(mut self, faculty_id: impl Into<String>) -> Self {
        self.eligible_faculty.push(faculty_id.into());
        self
    }

    /// Weekly contact hours of one session type.
    pub fn hours_for(&self, session_type: SessionType) -> i32 {
        match session_type {
            SessionType::Lecture => self.lecture_hours_per_week,
            SessionType::Tutorial => self.tutorial_hours_per_week,
            SessionType::Lab => self.lab_hours_per_week,
        }
    }

    /// Total weekly contact hours.
    pub fn total_hours(&self) -> i32 {
        self.lecture_hours_per_week + self.tutorial_hours_per_week + self.lab_hours_per_week
    }

    /// Field-level checks.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        if self.id.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingField,
                &self.id,
                "subject id is empty",
            ));
        }
        if self.code.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingField,
                &self.id,
                "subject code is empty",
            ));
        }
        let numbers = [
            ("credits", self.credits),
            ("lectureHoursPerWeek", self.lecture_hours_per_week),
            ("tutorialHoursPerWeek", self.tutorial_hours_per_week),
            ("labHoursPerWeek", self.lab_hours_per_week),
        ];
        for (field, value) in numbers {
            if value < 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidNumber,
                    &self.id,
                    format!("{} {field} must not be negative, got {value}", self.code),
                ));
            }
        }
        ValidationError::collect(errors)
    }
}

impl PartialEq for Subject {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Subject {}

impl Hash for Subject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_hours() {
        let s = Subject::new("S1", "CS301").with_hours(3, 1, 2);
        assert_eq!(s.total_hours(), 6);
        assert_eq!(s.hours_for(SessionType::Lab), 2);
        assert_eq!(s.hours_for(SessionType::Tutorial), 1);
    }

    #[test]
    fn test_subject_negative_numbers_rejected() {
        let errors = Subject::new("S1", "CS301")
            .with_credits(-3)
            .with_hours(3, -1, 2)
            .validate()
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::InvalidNumber));
        assert!(errors[0].message.contains("CS301"));
    }

    #[test]
    fn test_subject_wire_shape() {
        let json = r#"{
            "id": 3,
            "code": "CS305",
            "name": "Machine Learning",
            "department": "CSE",
            "credits": 4,
            "lectureHoursPerWeek": 3,
            "tutorialHoursPerWeek": 0,
            "labHoursPerWeek": 2,
            "isElective": true,
            "year": 3,
            "eligibleFaculty": ["1", "2"]
        }"#;
        let s: Subject = serde_json::from_str(json).unwrap();
        assert_eq!(s.id, "3");
        assert!(s.elective);
        assert_eq!(s.eligible_faculty.len(), 2);
        assert!(s.validate().is_ok());
    }
}
