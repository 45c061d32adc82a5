//! Delivery channels.

pub mod telegram;

use async_trait::async_trait;
use kiuas_core::types::ChatId;

/// Error type for delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    ///
    /// The URL is stripped before wrapping since it embeds the bot token.
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Telegram returned HTTP {0}")]
    HttpStatus(u16),

    /// The API answered `ok: false`.
    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.without_url())
    }
}

/// Something that can push a pre-rendered text message to a chat.
///
/// Implementations must be cheap to share; the service holds one behind an
/// `Arc` and calls it from request handlers and background tasks.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), DeliveryError>;
}
