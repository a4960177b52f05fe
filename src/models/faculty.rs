//! Faculty model.
//!
//! A faculty member teaches sessions. Each member carries daily and weekly
//! contact-hour ceilings and a set of subject codes they are eligible for.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use super::id_string;
use crate::validation::{ValidationError, ValidationErrorKind, ValidationResult};

/// Default daily ceiling in contact hours.
pub const DEFAULT_MAX_HOURS_PER_DAY: i32 = 6;
/// Default weekly ceiling in contact hours.
pub const DEFAULT_MAX_HOURS_PER_WEEK: i32 = 20;

/// A teaching staff member.
///
/// Equality and hashing are by `id` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faculty {
    /// Unique identifier.
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default)]
    pub qualifications: Vec<String>,
    /// Daily contact-hour ceiling (must be positive).
    #[serde(default = "default_max_hours_per_day")]
    pub max_hours_per_day: i32,
    /// Weekly contact-hour ceiling (must be positive).
    #[serde(default = "default_max_hours_per_week")]
    pub max_hours_per_week: i32,
    /// Subject codes (or ids) this member may teach.
    #[serde(default)]
    pub eligible_subjects: Vec<String>,
    #[serde(default = "super::default_true", alias = "isActive")]
    pub active: bool,
}

fn default_max_hours_per_day() -> i32 {
    DEFAULT_MAX_HOURS_PER_DAY
}

fn default_max_hours_per_week() -> i32 {
    DEFAULT_MAX_HOURS_PER_WEEK
}

impl Faculty {
    /// Creates an active faculty member with default hour ceilings.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            department: department.into(),
            designation: String::new(),
            email: None,
            employee_id: None,
            specialization: None,
            qualifications: Vec::new(),
            max_hours_per_day: DEFAULT_MAX_HOURS_PER_DAY,
            max_hours_per_week: DEFAULT_MAX_HOURS_PER_WEEK,
            eligible_subjects: Vec::new(),
            active: true,
        }
    }

    pub fn with_designation(mut self, designation: impl Into<String>) -> Self {
        self.designation = designation.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets daily and weekly contact-hour ceilings.
    pub fn with_max_hours(mut self, per_day: i32, per_week: i32) -> Self {
        self.max_hours_per_day = per_day;
        self.max_hours_per_week = per_week;
        self
    }

    /// Adds an eligible subject code.
    pub fn with_subject(mut self, code: impl Into<String>) -> Self {
        self.eligible_subjects.push(code.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Whether this member lists the subject (by code or id) as eligible.
    pub fn teaches(&self, subject_code: &str, subject_id: &str) -> bool {
        self.eligible_subjects
            .iter()
            .any(|s| s == subject_code || s == subject_id)
    }

    /// Field-level checks.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        if self.id.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingField,
                &self.id,
                "faculty id is empty",
            ));
        }
        if self.name.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingField,
                &self.id,
                "faculty name is empty",
            ));
        }
        if self.max_hours_per_day <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidNumber,
                &self.id,
                format!("maxHoursPerDay must be positive, got {}", self.max_hours_per_day),
            ));
        }
        if self.max_hours_per_week <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidNumber,
                &self.id,
                format!(
                    "maxHoursPerWeek must be positive, got {}",
                    self.max_hours_per_week
                ),
            ));
        }
        ValidationError::collect(errors)
    }
}

impl PartialEq for Faculty {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Faculty {}

impl Hash for Faculty {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
