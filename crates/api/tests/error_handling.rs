//! Tests for `AppError` → HTTP response mapping.

use axum::response::IntoResponse;
use http_body_util::BodyExt;
use kiuas_api::error::AppError;
use kiuas_core::ruuvi::DecodeError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (axum::http::StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: decode failures map to 400 with INVALID_PAYLOAD code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn decode_error_returns_400_invalid_payload() {
    let err = AppError::Decode(DecodeError::WrongLength(3));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_PAYLOAD");
    assert!(json["error"].as_str().unwrap().contains("got 3"));
}

#[tokio::test]
async fn unsupported_format_message_names_format() {
    let err = AppError::Decode(DecodeError::UnsupportedFormat(3));

    let (_, json) = error_to_response(err).await;

    assert!(json["error"].as_str().unwrap().contains('3'));
}

// ---------------------------------------------------------------------------
// Test: AppError::BadRequest maps to 400 with BAD_REQUEST code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("Request body is empty".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "Request body is empty");
}
