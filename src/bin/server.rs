//! Timetable HTTP Server Binary
//!
//! Serves the REST API over an in-memory catalog seeded with the demo
//! institution (five faculty, six subjects, six rooms, four sections).
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin timetable-server
//!
//! TIMETABLE_PORT=9000 TIMETABLE_CONFIG=timetable.toml cargo run --bin timetable-server
//! ```
//!
//! # Environment Variables
//!
//! - `TIMETABLE_HOST`: Server host (default: 127.0.0.1)
//! - `TIMETABLE_PORT`: Server port (default: 8080)
//! - `TIMETABLE_LOG`: Log filter when `RUST_LOG` is unset (default: info)
//! - `TIMETABLE_CONFIG`: Path to a TOML scheduler config
//!
//! A `.env` file in the working directory is read first.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use u_timetable::http::{create_router, AppState, ServerConfig};
use u_timetable::{Catalog, Orchestrator};

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level/filter '{log_level}'"))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    init_tracing(&config.log_level)?;

    info!("Starting timetable server");

    let scheduler = config.scheduler()?;
    let orchestrator = Orchestrator::new(Catalog::demo(), scheduler)?;
    let counts = orchestrator.catalog().counts();
    info!(
        faculty = counts.faculty,
        subjects = counts.subjects,
        rooms = counts.rooms,
        sections = counts.sections,
        "catalog loaded"
    );

    let app = create_router(AppState::new(orchestrator));

    let addr = config.socket_addr()?;
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
