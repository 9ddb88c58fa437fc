//! Tests for `AppError` → HTTP response mapping and in-band messages.
//!
//! These call `IntoResponse` directly on `AppError` values and need no
//! database or HTTP server.

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use crudsync_api::engine::dispatcher::SYNC_FAILED_MESSAGE;
use crudsync_api::engine::loader::LOAD_FAILED_MESSAGE;
use crudsync_api::error::AppError;
use crudsync_core::error::CoreError;
use http_body_util::BodyExt;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// HTTP mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("expected value at line 1 column 3".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "expected value at line 1 column 3");
}

#[tokio::test]
async fn database_error_returns_500_and_sanitizes_message() {
    let err = AppError::Database(sqlx::Error::Protocol(
        "password authentication failed for user crudsync".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// In-band messages
// ---------------------------------------------------------------------------

#[test]
fn core_errors_convert_into_app_errors() {
    let err: AppError = CoreError::Validation("bad".into()).into();
    assert_matches!(err, AppError::Core(CoreError::Validation(ref msg)) if msg == "bad");
}

#[test]
fn validation_message_passes_through() {
    let err = AppError::Core(CoreError::Validation("events.startDate: bad date".into()));
    assert_eq!(
        err.client_message(SYNC_FAILED_MESSAGE),
        "events.startDate: bad date"
    );
}

#[test]
fn database_message_uses_fallback() {
    let err = AppError::Database(sqlx::Error::PoolTimedOut);
    assert_eq!(err.client_message(SYNC_FAILED_MESSAGE), SYNC_FAILED_MESSAGE);
    assert_eq!(err.client_message(LOAD_FAILED_MESSAGE), LOAD_FAILED_MESSAGE);
}
