//! Seen-nonce bookkeeping.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Nonces claimed so far, each with the instant after which a request
/// carrying it can no longer pass the timestamp check.
#[derive(Debug, Default)]
pub struct NonceStore {
    seen: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl NonceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `nonce` as used until `expires_at`.
    ///
    /// Returns `false` if it had already been claimed. Check and insert
    /// happen under one lock, so two concurrent requests carrying the same
    /// nonce cannot both succeed.
    pub async fn claim(&self, nonce: &str, expires_at: DateTime<Utc>) -> bool {
        let mut seen = self.seen.lock().await;
        if seen.contains_key(nonce) {
            return false;
        }
        seen.insert(nonce.to_string(), expires_at);
        true
    }

    /// Drop nonces whose expiry is before `now`. Returns how many were
    /// removed.
    ///
    /// Compared in whole seconds, the resolution of the `Timestamp` header.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let now = now.timestamp();
        let mut seen = self.seen.lock().await;
        let before = seen.len();
        seen.retain(|_, expires_at| expires_at.timestamp() >= now);
        before - seen.len()
    }

    pub async fn len(&self) -> usize {
        self.seen.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Periodically purge expired nonces until `cancel` fires.
pub async fn run_cleanup(store: Arc<NonceStore>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Nonce cleanup started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Nonce cleanup stopping");
                break;
            }
            _ = interval.tick() => {
                let purged = store.purge_expired(Utc::now()).await;
                if purged > 0 {
                    tracing::info!(purged, "Purged expired nonces");
                } else {
                    tracing::debug!("No expired nonces to purge");
                }
            }
        }
    }
}
