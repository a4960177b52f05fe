//! Rule registry: maps a constraint kind to a typed rule factory.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::rules::{
    BreakExclusion, ElectiveAlignment, EvenDistribution, FacultyMaxHours, LabBlock, WorkingHours,
};
use super::ConstraintRule;
use crate::models::Constraint;

/// Builds a rule from a parameter bag, or explains why it can't.
pub type RuleFactory = fn(&Value) -> Result<Arc<dyn ConstraintRule>, String>;

/// Deserializes the bag straight into the rule type.
pub fn typed<R>(params: &Value) -> Result<Arc<dyn ConstraintRule>, String>
where
    R: ConstraintRule + DeserializeOwned + 'static,
{
    serde_json::from_value::<R>(params.clone())
        .map(|rule| Arc::new(rule) as Arc<dyn ConstraintRule>)
        .map_err(|e| e.to_string())
}

/// Kind name to factory lookup.
#[derive(Clone, Default)]
pub struct ConstraintRegistry {
    factories: HashMap<String, RuleFactory>,
}

impl ConstraintRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rules, under their own names and the names the stock
    /// constraint records use ("Lunch Break", "Maximum Daily Hours", ...).
    pub fn builtin() -> Self {
        Self::new()
            .with("working_hours", typed::<WorkingHours>)
            .with("break_exclusion", typed::<BreakExclusion>)
            .with("lunch_break", typed::<BreakExclusion>)
            .with("short_break", typed::<BreakExclusion>)
            .with("faculty_max_hours", typed::<FacultyMaxHours>)
            .with("maximum_daily_hours", typed::<FacultyMaxHours>)
            .with("max_daily_hours", typed::<FacultyMaxHours>)
            .with("lab_block", typed::<LabBlock>)
            .with("lab_continuous_sessions", typed::<LabBlock>)
            .with("elective_alignment", typed::<ElectiveAlignment>)
            .with("even_distribution", typed::<EvenDistribution>)
    }

    /// Registers a factory under a kind name.
    pub fn with(mut self, kind: impl Into<String>, factory: RuleFactory) -> Self {
        self.register(kind, factory);
        self
    }

    pub fn register(&mut self, kind: impl Into<String>, factory: RuleFactory) {
        self.factories.insert(kind.into(), factory);
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Builds the rule for a constraint.
    ///
    /// `Ok(None)` for kinds nobody registered; `Err` when the parameters
    /// don't fit the registered kind.
    pub fn compile(&self, constraint: &Constraint) -> Result<Option<Arc<dyn ConstraintRule>>, String> {
        let kind = constraint.kind_key();
        match self.factories.get(&kind) {
            None => Ok(None),
            Some(factory) => factory(&constraint.parameters).map(Some).map_err(|e| {
                format!(
                    "constraint '{}' ({kind}) has invalid parameters: {e}",
                    constraint.name
                )
            }),
        }
    }
}

impl std::fmt::Debug for ConstraintRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.factories.keys().collect();
        kinds.sort();
        f.debug_struct("ConstraintRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConstraintCategory, ConstraintPriority};
    use serde_json::json;

    fn constraint(name: &str, params: Value) -> Constraint {
        Constraint::new("C1", name, ConstraintCategory::Institutional, ConstraintPriority::Mandatory)
            .with_parameters(params)
    }

    #[test]
    fn test_stock_names_resolve() {
        let reg = ConstraintRegistry::builtin();
        let cases = [
            ("Working Hours", json!({"startTime": "09:00", "endTime": "17:00"}), "working_hours"),
            ("Lunch Break", json!({"startTime": "12:35", "endTime": "13:30"}), "break_exclusion"),
            ("Maximum Daily Hours", json!({"maxHours": 6}), "faculty_max_hours"),
            ("Lab Continuous Sessions", json!({"minDuration": 2}), "lab_block"),
            ("Elective Alignment", json!({}), "elective_alignment"),
            ("Even Distribution", json!({"maxVariance": 2}), "even_distribution"),
        ];
        for (name, params, rule_name) in cases {
            let rule = reg.compile(&constraint(name, params)).unwrap().unwrap();
            assert_eq!(rule.name(), rule_name, "{name}");
        }
    }

    #[test]
    fn test_unknown_kind() {
        let reg = ConstraintRegistry::builtin();
        let c = constraint("Projector Preference", json!({"need": true}));
        assert!(reg.compile(&c).unwrap().is_none());
    }

    #[test]
    fn test_bad_parameters() {
        let reg = ConstraintRegistry::builtin();
        let c = constraint("Working Hours", json!({"startTime": "nine"}));
        let err = reg.compile(&c).err().unwrap();
        assert!(err.contains("working_hours"));
    }

    #[test]
    fn test_custom_registration() {
        let reg = ConstraintRegistry::new().with("quiet_fridays", typed::<ElectiveAlignment>);
        assert!(reg.contains("quiet_fridays"));
        assert!(!reg.contains("working_hours"));
    }
}
