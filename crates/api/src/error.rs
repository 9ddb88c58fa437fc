use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crudsync_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] for requests that never reach the sync
/// protocol (bodies that are not JSON). Protocol failures are reported
/// in-band through [`AppError::client_message`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `crudsync_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Message safe to show the widget in a `success: false` envelope.
    ///
    /// Validation messages describe the submitted payload and pass through.
    /// Storage errors are replaced by `fallback` so internals never leak.
    pub fn client_message(&self, fallback: &str) -> String {
        match self {
            AppError::Core(CoreError::Validation(msg)) | AppError::BadRequest(msg) => msg.clone(),
            AppError::Database(_) => fallback.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    /// Only unparseable request bodies reach the HTTP layer as errors; the
    /// protocol routes report everything else in-band.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            other => {
                tracing::error!(error = %other, "Unhandled error reached the HTTP layer");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
