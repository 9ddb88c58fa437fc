//! Handlers for the widget's CRUD manager transport (`/load`, `/sync`).
//!
//! Both endpoints answer HTTP 200 for logical failures and report them with
//! `success: false`, which is what the CRUD manager expects.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::engine::dispatcher::SyncDispatcher;
use crate::engine::loader::SnapshotLoader;
use crate::error::{AppError, AppResult};
use crate::response::{LoadResponse, SyncResponse};
use crate::state::AppState;

/// GET /load
///
/// Return a snapshot of every collection served by the deployment variant.
pub async fn load(State(state): State<AppState>) -> Json<LoadResponse> {
    let loader = SnapshotLoader::new(
        state.pool.clone(),
        state.config.variant,
        state.config.project_calendar_id,
    );
    Json(loader.respond().await)
}

/// POST /sync
///
/// Apply a batch of added/updated/removed rows. A body that is not JSON at all
/// has no `requestId` to echo and is rejected with 400; any JSON body gets a
/// protocol envelope.
pub async fn sync(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<SyncResponse>> {
    let Json(body) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let dispatcher = SyncDispatcher::new(state.pool.clone(), state.config.sync_mode);
    Ok(Json(dispatcher.dispatch_body(body).await))
}
