//! Scheduling rule records.
//!
//! Constraints arrive as data: a category, a priority tier and a parameter
//! bag. The `kind` names the evaluator that interprets the bag; see
//! [`crate::constraints::ConstraintRegistry`] for the typed side.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::id_string;
use crate::validation::{ValidationError, ValidationErrorKind, ValidationResult};

/// Which entity family a constraint is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintCategory {
    Institutional,
    Faculty,
    Room,
    Section,
}

/// Priority tier. Only `Mandatory` blocks a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintPriority {
    Mandatory,
    Preferred,
    Optional,
}

impl ConstraintPriority {
    #[inline]
    pub fn is_hard(self) -> bool {
        self == ConstraintPriority::Mandatory
    }
}

/// A scheduling rule as stored and edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(rename = "type", alias = "category")]
    pub category: ConstraintCategory,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Evaluator name. Empty means derived from `name`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    pub priority: ConstraintPriority,
    #[serde(default = "super::default_true", alias = "isActive")]
    pub active: bool,
    /// Rule parameters. Accepts an object or a JSON-encoded string.
    #[serde(default = "empty_bag", deserialize_with = "parameter_bag")]
    pub parameters: Value,
}

fn empty_bag() -> Value {
    Value::Object(Map::new())
}

fn parameter_bag<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(empty_bag()),
        Value::String(s) if s.trim().is_empty() => Ok(empty_bag()),
        Value::String(s) => serde_json::from_str(&s).map_err(serde::de::Error::custom),
        other => Ok(other),
    }
}

impl Constraint {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ConstraintCategory,
        priority: ConstraintPriority,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            name: name.into(),
            description: String::new(),
            kind: String::new(),
            priority,
            active: true,
            parameters: empty_bag(),
        }
    }

    /// Sets the evaluator name explicitly.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Registry key: `kind` if set, otherwise the name in snake case
    /// ("Lunch Break" becomes `lunch_break`).
    pub fn kind_key(&self) -> String {
        let source = if self.kind.trim().is_empty() {
            &self.name
        } else {
            &self.kind
        };
        slug(source)
    }

    /// Field-level checks. Parameter typing is checked by the registry.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        if self.id.trim().is_empty() || self.name.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingField,
                &self.id,
                "constraint id and name are required",
            ));
        }
        if !self.parameters.is_object() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidParameters,
                &self.id,
                format!("constraint '{}' parameters must be an object", self.name),
            ));
        }
        ValidationError::collect(errors)
    }
}

fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_key() {
        let c = Constraint::new(
            "C2",
            "Lunch Break",
            ConstraintCategory::Institutional,
            ConstraintPriority::Mandatory,
        );
        assert_eq!(c.kind_key(), "lunch_break");

        let c = c.with_kind("Break-Exclusion ");
        assert_eq!(c.kind_key(), "break_exclusion");
    }

    #[test]
    fn test_priority_order() {
        assert!(ConstraintPriority::Mandatory < ConstraintPriority::Preferred);
        assert!(ConstraintPriority::Mandatory.is_hard());
        assert!(!ConstraintPriority::Optional.is_hard());
    }

    #[test]
    fn test_parameters_as_object() {
        let json = r#"{"id":"1","type":"faculty","name":"Maximum Daily Hours",
                       "priority":"mandatory","isActive":true,
                       "parameters":{"maxHours":6}}"#;
        let c: Constraint = serde_json::from_str(json).unwrap();
        assert_eq!(c.parameters, json!({"maxHours": 6}));
        assert_eq!(c.category, ConstraintCategory::Faculty);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_parameters_as_encoded_string() {
        let json = r#"{"id":2,"type":"institutional","name":"Working Hours",
                       "priority":"mandatory",
                       "parameters":"{\"startTime\":\"09:00\",\"endTime\":\"17:00\"}"}"#;
        let c: Constraint = serde_json::from_str(json).unwrap();
        assert_eq!(c.parameters["startTime"], "09:00");
        assert!(c.active);

        let empty = r#"{"id":3,"type":"section","name":"Elective Alignment",
                        "priority":"preferred","parameters":""}"#;
        let c: Constraint = serde_json::from_str(empty).unwrap();
        assert_eq!(c.parameters, json!({}));
    }

    #[test]
    fn test_non_object_parameters_rejected() {
        let c = Constraint::new(
            "C9",
            "Odd",
            ConstraintCategory::Room,
            ConstraintPriority::Optional,
        )
        .with_parameters(json!([1, 2]));
        let errors = c.validate().unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidParameters);
    }
}
