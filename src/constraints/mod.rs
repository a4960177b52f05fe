//! Constraint engine for timetable placement.
//!
//! Constraint records are data; each names a rule kind and carries a
//! parameter bag. The [`ConstraintRegistry`] turns a record into a typed
//! [`ConstraintRule`], and the [`ConstraintEngine`] scores candidate
//! placements against every active rule.
//!
//! # Usage
//!
//! ```
//! use u_timetable::constraints::{ConstraintEngine, ConstraintRegistry};
//! use u_timetable::models::{Constraint, ConstraintCategory, ConstraintPriority};
//!
//! let lunch = Constraint::new(
//!     "C2",
//!     "Lunch Break",
//!     ConstraintCategory::Institutional,
//!     ConstraintPriority::Mandatory,
//! )
//! .with_parameters(serde_json::json!({"startTime": "12:35", "endTime": "13:30"}));
//!
//! let engine = ConstraintEngine::from_constraints(&[lunch], &ConstraintRegistry::builtin())
//!     .unwrap();
//! assert_eq!(engine.len(), 1);
//! ```

mod context;
mod engine;
mod registry;
pub mod rules;

pub use context::{Candidate, FacultyLoad, PartialSchedule};
pub use engine::{Assessment, ConstraintEngine};
pub use registry::{typed, ConstraintRegistry, RuleFactory};

use std::fmt::Debug;

/// A rule that judges a candidate placement.
///
/// Rules are pure: they read the candidate and the partial schedule and
/// never mutate either.
pub trait ConstraintRule: Send + Sync + Debug {
    /// Rule kind (e.g. "working_hours").
    fn name(&self) -> &'static str;

    /// Returns a message when the candidate violates the rule.
    fn evaluate(&self, candidate: &Candidate<'_>, schedule: &PartialSchedule<'_>) -> Option<String>;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
