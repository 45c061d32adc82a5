#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chrono::{FixedOffset, Utc};
use http_body_util::BodyExt;
use kiuas_api::config::{ServiceConfig, TelegramConfig};
use kiuas_api::engine::{Destinations, SaunaEngine};
use kiuas_api::router::build_router;
use kiuas_api::state::AppState;
use kiuas_core::monitor::{Monitor, MonitorConfig};
use kiuas_core::types::{ChatId, Timestamp};
use kiuas_events::{DeliveryError, Notifier};
use tower::ServiceExt;

pub const NOTIFICATION_CHAT: ChatId = -1001;
pub const MAINTENANCE_CHAT: ChatId = 42;

/// Notifier that records every message instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(ChatId, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    /// A notifier whose every send fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        if self.fail {
            Err(DeliveryError::HttpStatus(502))
        } else {
            Ok(())
        }
    }
}

/// Thresholds used across the integration tests.
pub fn test_monitor_config() -> MonitorConfig {
    MonitorConfig {
        ready_threshold: 75.0,
        warming_rate_lower_bound: 0.01,
        reset_threshold: 40.0,
        ..MonitorConfig::default()
    }
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        telegram: TelegramConfig {
            bot_token: "test-token".into(),
            api_url: "http://127.0.0.1:1".into(),
            commands_enabled: false,
        },
        notification_chat_id: NOTIFICATION_CHAT,
        maintenance_chat_id: MAINTENANCE_CHAT,
        monitor: test_monitor_config(),
        watchdog_interval: std::time::Duration::from_secs(60),
        display_offset: utc_plus_3(),
    }
}

pub fn utc_plus_3() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600).unwrap()
}

pub fn test_engine(notifier: Arc<RecordingNotifier>, started_at: Timestamp) -> Arc<SaunaEngine> {
    engine_with(notifier, started_at)
}

pub fn engine_with(notifier: Arc<dyn Notifier>, started_at: Timestamp) -> Arc<SaunaEngine> {
    Arc::new(SaunaEngine::new(
        Monitor::new(test_monitor_config(), started_at),
        notifier,
        Destinations {
            notification: NOTIFICATION_CHAT,
            maintenance: MAINTENANCE_CHAT,
        },
        utc_plus_3(),
    ))
}

/// Build the full application router around a recording notifier.
pub fn build_test_app(notifier: Arc<RecordingNotifier>) -> Router {
    let state = AppState {
        config: Arc::new(test_config()),
        engine: test_engine(notifier, Utc::now()),
    };
    build_router(state)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_bytes(app: Router, uri: &str, body: Vec<u8>) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/octet-stream")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Decode a hex string into bytes.
pub fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}
