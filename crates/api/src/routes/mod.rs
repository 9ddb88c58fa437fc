pub mod crud;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the route tree served at the root.
///
/// ```text
/// GET  /health                                     service and database health
/// GET  /load                                       snapshot of all collections
/// POST /sync                                       apply a change batch
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crud::router())
}
