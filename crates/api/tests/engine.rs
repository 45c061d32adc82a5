//! Engine-level tests: warming notifications and the staleness watchdog,
//! driven with explicit timestamps.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use common::{RecordingNotifier, MAINTENANCE_CHAT, NOTIFICATION_CHAT};
use kiuas_api::background::watchdog;
use kiuas_core::monitor::ThermalState;
use kiuas_core::notification::Notification;
use kiuas_core::reading::Reading;
use kiuas_core::types::{ChatId, Timestamp};
use kiuas_events::{DeliveryError, Notifier};
use tokio_util::sync::CancellationToken;

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap()
}

fn reading(temperature: f64, at: Timestamp) -> Reading {
    Reading::new(temperature, 12.5, 3000, at)
}

// ---------------------------------------------------------------------------
// Warming
// ---------------------------------------------------------------------------

/// 55 → 57.5 → 60 over six minutes is 5/360 °C/s; 15 °C to go is 1080 s.
#[tokio::test]
async fn warming_notification_shows_local_eta() {
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = common::test_engine(notifier.clone(), t0());

    for (i, t) in [55.0, 57.5, 60.0].into_iter().enumerate() {
        engine
            .ingest(reading(t, t0() + Duration::minutes(3 * i as i64)))
            .await;
    }

    let snapshot = engine.snapshot().await;
    assert_matches!(snapshot.thermal, ThermalState::Warming { .. });

    // 15:06 + 18 min = 15:24 UTC, shown as 18:24 at UTC+3.
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, NOTIFICATION_CHAT);
    assert_eq!(sent[0].1, "🔥*Sauna lämpiää\\!*🔥\nValmis klo 18:24");
}

/// Warming, then ready, then cooling down and warming again.
#[tokio::test]
async fn full_cycle_rearms_after_cool_down() {
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = common::test_engine(notifier.clone(), t0());

    let temps = [
        30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 70.0, 50.0, 35.0, 30.0, 40.0, 50.0,
    ];
    let mut kinds = Vec::new();
    for (i, t) in temps.into_iter().enumerate() {
        let outcome = engine
            .ingest(reading(t, t0() + Duration::minutes(5 * i as i64)))
            .await;
        kinds.extend(outcome.notification);
    }

    assert_eq!(kinds, vec!["warming", "ready", "warming"]);
    assert_eq!(notifier.sent().len(), 3);
}

/// Records sends in completion order, holding the first one back.
#[derive(Default)]
struct SlowFirstNotifier {
    calls: AtomicUsize,
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for SlowFirstNotifier {
    async fn send(&self, _chat_id: ChatId, text: &str) -> Result<(), DeliveryError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn overlapping_ingests_deliver_in_transition_order() {
    let notifier = Arc::new(SlowFirstNotifier::default());
    let engine = common::engine_with(notifier.clone(), t0());
    engine.ingest(reading(55.0, t0())).await;
    engine.ingest(reading(57.5, t0() + Duration::minutes(3))).await;

    let warming = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.ingest(reading(60.0, t0() + Duration::minutes(6))).await }
    });
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let ready = engine.ingest(reading(80.0, t0() + Duration::minutes(9))).await;

    assert_eq!(warming.await.unwrap().notification, Some("warming"));
    assert_eq!(ready.notification, Some("ready"));

    let sent = notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].starts_with("🔥*Sauna lämpiää"));
    assert!(sent[1].starts_with("*Sauna valmis"));
}

// ---------------------------------------------------------------------------
// Watchdog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn watchdog_task_alerts_once_and_stops_on_cancel() {
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = common::test_engine(notifier.clone(), Utc::now() - Duration::hours(2));
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(watchdog::run(
        Arc::clone(&engine),
        std::time::Duration::from_millis(20),
        cancel.clone(),
    ));
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    cancel.cancel();
    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, MAINTENANCE_CHAT);
    assert_eq!(sent[0].1, "No data received for over 1 hour");
    assert!(engine.snapshot().await.stale_alert_outstanding);
}

#[tokio::test]
async fn stale_sensor_alerts_maintenance_once() {
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = common::test_engine(notifier.clone(), t0());
    engine.ingest(reading(22.0, t0())).await;

    assert!(engine
        .watchdog_tick(t0() + Duration::minutes(60))
        .await
        .is_none());
    assert_matches!(
        engine.watchdog_tick(t0() + Duration::minutes(61)).await,
        Some(Notification::DataStale { .. })
    );
    assert!(engine
        .watchdog_tick(t0() + Duration::minutes(62))
        .await
        .is_none());

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, MAINTENANCE_CHAT);
    assert_eq!(sent[0].1, "No data received for over 1 hour");
}

#[tokio::test]
async fn recovery_is_silent_and_rearms() {
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = common::test_engine(notifier.clone(), t0());

    assert!(engine
        .watchdog_tick(t0() + Duration::minutes(61))
        .await
        .is_some());

    let resumed = t0() + Duration::minutes(70);
    engine.ingest(reading(22.0, resumed)).await;
    assert!(engine
        .watchdog_tick(resumed + Duration::minutes(1))
        .await
        .is_none());
    assert!(!engine.snapshot().await.stale_alert_outstanding);

    assert!(engine
        .watchdog_tick(resumed + Duration::minutes(61))
        .await
        .is_some());
    assert_eq!(notifier.sent().len(), 2);
}
