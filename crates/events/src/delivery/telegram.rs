//! Telegram Bot API client.
//!
//! Only the handful of methods the service needs: `sendMessage`,
//! `getUpdates` (long polling), `getMe` and `setMyCommands`. Every call is a
//! JSON POST to `{base}/bot{token}/{method}`; the response envelope is
//! `{"ok": bool, "result": ..., "error_code": ..., "description": ...}`.

use std::time::Duration;

use async_trait::async_trait;
use kiuas_core::types::ChatId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{DeliveryError, Notifier};

/// Public Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// HTTP request timeout for ordinary (non-polling) calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra slack on top of the long-poll timeout before the HTTP call gives up.
const LONG_POLL_GRACE: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    MarkdownV2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: ChatId,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
}

#[derive(Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Serialize)]
struct SetMyCommands<'a> {
    commands: &'a [BotCommand],
}

// ---------------------------------------------------------------------------
// TelegramClient
// ---------------------------------------------------------------------------

/// Bot API client bound to a single bot token.
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Client against the public Bot API.
    pub fn new(token: impl Into<String>) -> Result<Self, DeliveryError> {
        Self::with_base_url(DEFAULT_API_URL, token)
    }

    /// Client against a custom endpoint (local Bot API server, tests).
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<B, T>(
        &self,
        method: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T, DeliveryError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.method_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        let status = response.status();

        // Telegram reports API errors with a 4xx status and a JSON body; try
        // the body first so the description survives.
        let envelope: Envelope<T> = match response.json().await {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(DeliveryError::HttpStatus(status.as_u16()))
            }
            Err(e) => return Err(e.into()),
        };

        match envelope {
            Envelope {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            Envelope {
                error_code,
                description,
                ..
            } => Err(DeliveryError::Api {
                code: error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description: description.unwrap_or_else(|| "missing result".to_string()),
            }),
        }
    }

    /// Send a text message.
    pub async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), DeliveryError> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode,
        };
        let _: serde_json::Value = self.call("sendMessage", &body, None).await?;
        Ok(())
    }

    /// Long-poll for new messages.
    ///
    /// Blocks server-side for up to `timeout` when there is nothing to
    /// return. `offset` acknowledges every update with a lower id.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, DeliveryError> {
        let body = GetUpdates {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: ["message"],
        };
        self.call("getUpdates", &body, Some(timeout + LONG_POLL_GRACE))
            .await
    }

    pub async fn get_me(&self) -> Result<BotUser, DeliveryError> {
        self.call("getMe", &serde_json::json!({}), None).await
    }

    /// Replace the bot's command menu.
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), DeliveryError> {
        let _: bool = self
            .call("setMyCommands", &SetMyCommands { commands }, None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), DeliveryError> {
        self.send_message(chat_id, text, Some(ParseMode::MarkdownV2))
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
