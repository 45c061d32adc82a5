//! Request verification.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::nonce::NonceStore;

pub const API_KEY_HEADER: &str = "API-Key";
pub const TIMESTAMP_HEADER: &str = "Timestamp";
pub const NONCE_HEADER: &str = "Nonce";
pub const FORWARDED_URI_HEADER: &str = "X-Forwarded-Uri";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Why a request was turned away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("Forbidden")]
    InvalidApiKey,

    #[error("Missing Timestamp")]
    MissingTimestamp,

    #[error("Invalid Timestamp")]
    InvalidTimestamp,

    #[error("Timestamp outside allowed window")]
    TimestampOutsideWindow,

    #[error("Missing Nonce")]
    MissingNonce,

    #[error("Nonce already used")]
    NonceReused,
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidApiKey => StatusCode::FORBIDDEN,
            Self::MissingTimestamp | Self::InvalidTimestamp | Self::MissingNonce => {
                StatusCode::BAD_REQUEST
            }
            Self::TimestampOutsideWindow | Self::NonceReused => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::MissingTimestamp => "MISSING_TIMESTAMP",
            Self::InvalidTimestamp => "INVALID_TIMESTAMP",
            Self::TimestampOutsideWindow => "STALE_TIMESTAMP",
            Self::MissingNonce => "MISSING_NONCE",
            Self::NonceReused => "NONCE_REUSED",
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        (self.status(), axum::Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// ApiKey
// ---------------------------------------------------------------------------

/// The shared secret, kept only as a SHA-256 digest.
///
/// Presented keys are hashed and compared digest-to-digest in constant
/// time, so timing does not depend on how much of the key matched.
#[derive(Clone)]
pub struct ApiKey {
    digest: [u8; 32],
}

impl ApiKey {
    pub fn new(secret: &str) -> Self {
        Self {
            digest: Sha256::digest(secret.as_bytes()).into(),
        }
    }

    pub fn matches(&self, presented: &str) -> bool {
        let presented: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        self.digest.ct_eq(&presented).into()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Gate {
    api_key: ApiKey,
    window: Duration,
    nonces: Arc<NonceStore>,
}

impl Gate {
    pub fn new(api_key: ApiKey, window: Duration, nonces: Arc<NonceStore>) -> Self {
        Self {
            api_key,
            window,
            nonces,
        }
    }

    /// Verify one request's headers at time `now`.
    ///
    /// Checks run in order (key, timestamp, nonce) and the nonce is only
    /// claimed once everything before it has passed. A claimed nonce is
    /// kept until its request timestamp has left the window, which for a
    /// future-dated request is later than `now + window`.
    pub async fn check(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Result<(), GateError> {
        let key = header(headers, API_KEY_HEADER).unwrap_or_default();
        if !self.api_key.matches(key) {
            return Err(GateError::InvalidApiKey);
        }

        let requested_at = header(headers, TIMESTAMP_HEADER)
            .ok_or(GateError::MissingTimestamp)?
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or(GateError::InvalidTimestamp)?;
        if now.timestamp().abs_diff(requested_at.timestamp())
            > self.window.num_seconds().unsigned_abs()
        {
            return Err(GateError::TimestampOutsideWindow);
        }

        let nonce = header(headers, NONCE_HEADER).ok_or(GateError::MissingNonce)?;
        if !self.nonces.claim(nonce, requested_at + self.window).await {
            return Err(GateError::NonceReused);
        }

        Ok(())
    }
}

/// Non-empty header value as a string.
fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// `/auth` (any method): ForwardAuth verdict for the proxied request.
pub async fn authorize(
    State(gate): State<Arc<Gate>>,
    headers: HeaderMap,
) -> Result<StatusCode, GateError> {
    let uri = header(&headers, FORWARDED_URI_HEADER).unwrap_or("<unknown>");

    match gate.check(&headers, Utc::now()).await {
        Ok(()) => {
            tracing::debug!(uri, "Request authorized");
            Ok(StatusCode::OK)
        }
        Err(e) => {
            tracing::warn!(uri, code = e.code(), reason = %e, "Request rejected");
            Err(e)
        }
    }
}
