//! Router configuration for the HTTP API.

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;
use crate::models::{Constraint, Faculty, Room, Section, Subject};

/// Create the application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let catalog = Router::new()
        .route("/faculty", get(handlers::list::<Faculty>).post(handlers::create::<Faculty>))
        .route(
            "/faculty/{id}",
            get(handlers::get::<Faculty>)
                .put(handlers::update::<Faculty>)
                .delete(handlers::delete::<Faculty>),
        )
        .route("/subjects", get(handlers::list::<Subject>).post(handlers::create::<Subject>))
        .route(
            "/subjects/{id}",
            get(handlers::get::<Subject>)
                .put(handlers::update::<Subject>)
                .delete(handlers::delete::<Subject>),
        )
        .route("/rooms", get(handlers::list::<Room>).post(handlers::create::<Room>))
        .route(
            "/rooms/{id}",
            get(handlers::get::<Room>)
                .put(handlers::update::<Room>)
                .delete(handlers::delete::<Room>),
        )
        .route("/sections", get(handlers::list::<Section>).post(handlers::create::<Section>))
        .route(
            "/sections/{id}",
            get(handlers::get::<Section>)
                .put(handlers::update::<Section>)
                .delete(handlers::delete::<Section>),
        )
        .route(
            "/constraints",
            get(handlers::list::<Constraint>).post(handlers::create::<Constraint>),
        )
        .route(
            "/constraints/{id}",
            get(handlers::get::<Constraint>)
                .put(handlers::update::<Constraint>)
                .delete(handlers::delete::<Constraint>),
        )
        .route("/constraints/{id}/toggle", patch(handlers::toggle_constraint))
        .route(
            "/time-slots",
            get(handlers::list_time_slots).put(handlers::replace_time_slots),
        );

    // Static segments take precedence over `/timetable/{section_id}`.
    let timetable = Router::new()
        .route("/timetable", get(handlers::all_sessions))
        .route("/timetable/generate/{section_id}", post(handlers::generate_section))
        .route("/timetable/generate-all", post(handlers::generate_all))
        .route("/timetable/cancel", post(handlers::cancel_generation))
        .route("/timetable/conflicts", get(handlers::conflicts))
        .route("/timetable/workload", get(handlers::workload))
        .route("/timetable/report", get(handlers::last_report))
        .route("/timetable/{section_id}", get(handlers::section_sessions));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(catalog)
        .merge(timetable)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
