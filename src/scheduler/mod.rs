//! Timetable construction: requirement expansion, backtracking placement
//! and workload balancing.
//!
//! # Algorithm
//!
//! [`Solver`] expands each section's curriculum into session requirements,
//! orders them by scarcity and places them with a bounded backtracking
//! search over (day, slot run, faculty, room). Sections share one
//! [`RunState`], so a room or faculty member booked for one section is
//! unavailable to the next.
//!
//! # Workload
//!
//! [`WorkloadBalancer`] optionally hands sessions to less loaded eligible
//! faculty after placement; [`WorkloadSummary`] reports per-faculty load %
//! and per-department fairness and rejects any limit overrun.
//!
//! # References
//!
//! - Russell & Norvig (2021), "Artificial Intelligence: A Modern Approach", Ch. 6
//! - Schaerf (1999), "A Survey of Automated Timetabling"

mod requirement;
mod solver;
mod state;
mod workload;

pub use requirement::{hostable_rooms, plan_section, Requirement, SectionPlan, StructuralProblem};
pub use solver::{CancelToken, GenerationStatus, SectionResult, Solver, UnresolvedRequirement};
pub use state::RunState;
pub use workload::{DepartmentFairness, FacultyWorkload, WorkloadBalancer, WorkloadSummary};
