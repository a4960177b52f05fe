//! HTTP handlers for the REST API.
//!
//! Catalog handlers are generic over [`Resource`] and instantiated per
//! entity family in the router. Generation handlers run the solver on the
//! blocking pool and answer once the run has committed.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{debug, info};

use super::error::AppError;
use super::resources::Resource;
use super::state::AppState;
use crate::catalog::CatalogCounts;
use crate::error::ScheduleError;
use crate::models::{ConflictReport, Constraint, ScheduleSession, TimeSlot};
use crate::orchestrator::{GenerationOutcome, GenerationReport};
use crate::scheduler::WorkloadSummary;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub running: bool,
    pub catalog: CatalogCounts,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let catalog = state.orchestrator.catalog().counts();
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        running: state.orchestrator.is_running(),
        catalog,
    }))
}

// =============================================================================
// Catalog CRUD
// =============================================================================

/// GET /{resource}
pub async fn list<R: Resource>(State(state): State<AppState>) -> HandlerResult<Vec<R>> {
    let items = R::list(&state.orchestrator.catalog());
    Ok(Json(items))
}

/// GET /{resource}/{id}
pub async fn get<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<R> {
    R::get(&state.orchestrator.catalog(), &id)
        .map(Json)
        .ok_or_else(|| ScheduleError::not_found(R::KIND, id).into())
}

/// POST /{resource}
///
/// Inserts the entity, replacing any existing one with the same id.
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Json(item): Json<R>,
) -> Result<(StatusCode, Json<R>), AppError> {
    R::upsert(&mut state.orchestrator.catalog_mut(), item.clone())?;
    debug!(kind = R::KIND, id = item.id(), "entity stored");
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /{resource}/{id}
///
/// The path id wins over any id in the body.
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut item): Json<R>,
) -> HandlerResult<R> {
    item.set_id(id);
    {
        let mut catalog = state.orchestrator.catalog_mut();
        if R::get(&catalog, item.id()).is_none() {
            return Err(ScheduleError::not_found(R::KIND, item.id()).into());
        }
        R::upsert(&mut catalog, item.clone())?;
    }
    debug!(kind = R::KIND, id = item.id(), "entity updated");
    Ok(Json(item))
}

/// DELETE /{resource}/{id}
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    R::remove(&state.orchestrator, &id)?;
    debug!(kind = R::KIND, id = %id, "entity removed");
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /constraints/{id}/toggle
pub async fn toggle_constraint(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<Constraint> {
    let constraint = state.orchestrator.catalog_mut().toggle_constraint(&id)?.clone();
    info!(constraint = %constraint.id, active = constraint.active, "constraint toggled");
    Ok(Json(constraint))
}

// =============================================================================
// Time Slots
// =============================================================================

/// GET /time-slots
pub async fn list_time_slots(State(state): State<AppState>) -> HandlerResult<Vec<TimeSlot>> {
    let slots = state.orchestrator.catalog().grid().slots().to_vec();
    Ok(Json(slots))
}

/// PUT /time-slots
pub async fn replace_time_slots(
    State(state): State<AppState>,
    Json(slots): Json<Vec<TimeSlot>>,
) -> HandlerResult<Vec<TimeSlot>> {
    let mut catalog = state.orchestrator.catalog_mut();
    catalog.set_time_slots(slots)?;
    Ok(Json(catalog.grid().slots().to_vec()))
}

// =============================================================================
// Generation
// =============================================================================

/// POST /timetable/generate/{section_id}
///
/// Regenerates one section. Other sections' sessions stay reserved.
pub async fn generate_section(
    State(state): State<AppState>,
    Path(section_id): Path<String>,
) -> HandlerResult<GenerationOutcome> {
    let orchestrator = state.orchestrator.clone();
    let outcome =
        tokio::task::spawn_blocking(move || orchestrator.regenerate_section(&section_id)).await??;
    Ok(Json(outcome))
}

/// POST /timetable/generate-all
pub async fn generate_all(State(state): State<AppState>) -> HandlerResult<GenerationReport> {
    let orchestrator = state.orchestrator.clone();
    let outcome = tokio::task::spawn_blocking(move || orchestrator.regenerate_all()).await??;
    Ok(Json(outcome.report))
}

/// POST /timetable/cancel
///
/// Requests cancellation of the active run, if any.
pub async fn cancel_generation(State(state): State<AppState>) -> HandlerResult<CancelResponse> {
    Ok(Json(CancelResponse {
        cancelled: state.orchestrator.cancel(),
    }))
}

// =============================================================================
// Timetable Reads
// =============================================================================

/// GET /timetable
pub async fn all_sessions(State(state): State<AppState>) -> HandlerResult<Vec<ScheduleSession>> {
    Ok(Json(state.orchestrator.all_sessions()))
}

/// GET /timetable/{section_id}
pub async fn section_sessions(
    State(state): State<AppState>,
    Path(section_id): Path<String>,
) -> HandlerResult<Vec<ScheduleSession>> {
    if state.orchestrator.catalog().get_section(&section_id).is_none() {
        return Err(ScheduleError::not_found("section", section_id).into());
    }
    Ok(Json(state.orchestrator.sessions_for_section(&section_id)))
}

/// GET /timetable/conflicts
pub async fn conflicts(State(state): State<AppState>) -> HandlerResult<Vec<ConflictReport>> {
    Ok(Json(state.orchestrator.conflicts()))
}

/// GET /timetable/workload
pub async fn workload(State(state): State<AppState>) -> HandlerResult<WorkloadSummary> {
    Ok(Json(state.orchestrator.workload()?))
}

/// GET /timetable/report
pub async fn last_report(State(state): State<AppState>) -> HandlerResult<GenerationReport> {
    state
        .orchestrator
        .last_report()
        .map(Json)
        .ok_or_else(|| ScheduleError::not_found("report", "latest").into())
}
