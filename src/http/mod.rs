//! REST boundary for the timetable scheduler.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │  HTTP layer (axum handlers)                   │
//! │  - CRUD for faculty/subjects/rooms/sections   │
//! │  - generation triggers and timetable reads    │
//! └──────────────────────┬────────────────────────┘
//!                        │
//! ┌──────────────────────▼────────────────────────┐
//! │  Orchestrator                                 │
//! │  - run lock, cancellation, atomic commit      │
//! └──────────────────────┬────────────────────────┘
//!                        │
//! ┌──────────────────────▼────────────────────────┐
//! │  Catalog + Solver + Workload balancer         │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Generation runs are CPU-bound and execute on the blocking pool.

pub mod config;
pub mod error;
pub mod handlers;
pub mod resources;
pub mod router;
pub mod state;

pub use config::ServerConfig;
pub use router::create_router;
pub use state::AppState;
