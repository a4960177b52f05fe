//! Constraint engine.
//!
//! Holds the compiled active constraints of a run and scores candidate
//! placements against them. Mandatory rules are checked first and a
//! failing mandatory rule stops evaluation; soft rules add weighted
//! penalty.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{Candidate, ConstraintRegistry, ConstraintRule, PartialSchedule};
use crate::config::SchedulerConfig;
use crate::models::{Constraint, ConstraintPriority, Violation};
use crate::validation::{ValidationError, ValidationErrorKind};

#[derive(Clone)]
struct CompiledConstraint {
    id: String,
    priority: ConstraintPriority,
    rule: Arc<dyn ConstraintRule>,
}

/// Outcome of scoring one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assessment {
    /// No mandatory rule is violated.
    pub admissible: bool,
    /// Weighted soft-rule penalty.
    pub penalty: u32,
    pub violations: Vec<Violation>,
}

impl Assessment {
    /// Violations of preferred and optional rules.
    pub fn soft_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.priority.is_hard())
    }
}

/// Evaluates candidates against active constraints.
#[derive(Clone, Default)]
pub struct ConstraintEngine {
    constraints: Vec<CompiledConstraint>,
}

impl ConstraintEngine {
    /// Creates an engine with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule directly.
    pub fn with_rule<R: ConstraintRule + 'static>(
        mut self,
        id: impl Into<String>,
        priority: ConstraintPriority,
        rule: R,
    ) -> Self {
        self.push(id.into(), priority, Arc::new(rule));
        self
    }

    fn push(&mut self, id: String, priority: ConstraintPriority, rule: Arc<dyn ConstraintRule>) {
        self.constraints.push(CompiledConstraint { id, priority, rule });
        // mandatory rules first
        self.constraints.sort_by_key(|c| c.priority);
    }

    /// Compiles the active constraints.
    ///
    /// Inactive constraints are left out. Kinds the registry doesn't know
    /// are skipped with a warning. Parameters that don't fit their kind
    /// are returned as validation errors.
    pub fn from_constraints(
        constraints: &[Constraint],
        registry: &ConstraintRegistry,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut engine = Self::new();
        let mut errors = Vec::new();

        for c in constraints.iter().filter(|c| c.active) {
            match registry.compile(c) {
                Ok(Some(rule)) => {
                    debug!(constraint = %c.id, rule = rule.name(), priority = ?c.priority, "rule compiled");
                    engine.push(c.id.clone(), c.priority, rule);
                }
                Ok(None) => {
                    warn!(
                        constraint = %c.id,
                        name = %c.name,
                        kind = %c.kind_key(),
                        "unknown constraint kind, ignoring"
                    );
                }
                Err(message) => errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidParameters,
                    &c.id,
                    message,
                )),
            }
        }

        ValidationError::collect(errors).map(|()| engine)
    }

    /// All violations of a candidate, mandatory first.
    pub fn evaluate(&self, candidate: &Candidate<'_>, schedule: &PartialSchedule<'_>) -> Vec<Violation> {
        self.constraints
            .iter()
            .filter_map(|c| {
                c.rule
                    .evaluate(candidate, schedule)
                    .map(|message| Violation::new(&c.id, c.priority, message))
            })
            .collect()
    }

    /// Scores a candidate. Stops at the first mandatory violation.
    pub fn assess(
        &self,
        candidate: &Candidate<'_>,
        schedule: &PartialSchedule<'_>,
        config: &SchedulerConfig,
    ) -> Assessment {
        let mut assessment = Assessment {
            admissible: true,
            ..Default::default()
        };
        for c in &self.constraints {
            let Some(message) = c.rule.evaluate(candidate, schedule) else {
                continue;
            };
            assessment
                .violations
                .push(Violation::new(&c.id, c.priority, message));
            if c.priority.is_hard() {
                assessment.admissible = false;
                break;
            }
            assessment.penalty += config.weight(c.priority);
        }
        assessment
    }

    /// Whether no mandatory rule objects to the candidate.
    pub fn is_admissible(&self, candidate: &Candidate<'_>, schedule: &PartialSchedule<'_>) -> bool {
        self.constraints
            .iter()
            .take_while(|c| c.priority.is_hard())
            .all(|c| c.rule.evaluate(candidate, schedule).is_none())
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl std::fmt::Debug for ConstraintEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintEngine")
            .field(
                "constraints",
                &self
                    .constraints
                    .iter()
                    .map(|c| format!("{}:{}({:?})", c.id, c.rule.name(), c.priority))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
