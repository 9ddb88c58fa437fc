use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::config::SyncMode;
use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database cannot be reached.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Whether `/sync` batches run in a transaction.
    pub atomic_sync: bool,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = crudsync_db::health_check(&state.pool).await.is_ok();
    if !db_healthy {
        tracing::warn!("Health check could not reach the database");
    }

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        atomic_sync: state.config.sync_mode == SyncMode::Atomic,
    })
}

/// Mount the health route next to the CRUD manager endpoints.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
