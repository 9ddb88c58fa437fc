//! Route definitions for the CRUD manager transport.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::crud;
use crate::state::AppState;

/// Routes mounted at the root, where the widget's transport config points.
///
/// ```text
/// GET  /load   -> load
/// POST /sync   -> sync
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/load", get(crud::load))
        .route("/sync", post(crud::sync))
}
