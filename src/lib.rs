//! Constraint-based academic timetable scheduler.
//!
//! Places weekly lecture, tutorial and lab sessions for student sections
//! into (day, time slot, room, faculty) combinations without double
//! booking any faculty member, room or section, while honoring
//! institutional rules and faculty workload limits.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Faculty`, `Subject`, `Room`, `Section`,
//!   `TimeSlot`/`SlotGrid`, `Constraint`, `ScheduleSession`, `Timetable`
//! - **`catalog`**: In-memory entity store behind the CRUD surface
//! - **`validation`**: Input integrity checks (duplicate ids, references, parameters)
//! - **`availability`**: Per-(day, slot) occupancy index
//! - **`constraints`**: Rule trait, typed built-in rules, registry and engine
//! - **`scheduler`**: Requirement expansion, backtracking solver, workload balancer
//! - **`orchestrator`**: Run lock, cancellation and atomic commit of generation runs
//! - **`http`** (feature `http-server`): REST boundary
//!
//! # Example
//!
//! ```
//! use u_timetable::{Catalog, Orchestrator, SchedulerConfig};
//!
//! let orchestrator = Orchestrator::new(Catalog::demo(), SchedulerConfig::default()).unwrap();
//! let outcome = orchestrator.regenerate_all().unwrap();
//! assert!(outcome.report.is_complete());
//! assert!(orchestrator.sessions_for_section("sec1").len() > 0);
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

pub mod availability;
pub mod catalog;
pub mod config;
pub mod constraints;
pub mod error;
#[cfg(feature = "http-server")]
pub mod http;
pub mod models;
pub mod orchestrator;
pub mod scheduler;
pub mod validation;

pub use catalog::{Catalog, CatalogData};
pub use config::SchedulerConfig;
pub use error::{ConflictError, ScheduleError};
pub use orchestrator::{GenerationOutcome, GenerationReport, Orchestrator};
