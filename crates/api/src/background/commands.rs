//! Chat command responder.
//!
//! Long-polls Telegram for messages and answers two commands:
//!
//! - `/kiuas` in any chat: is the sauna on, temperature, humidity.
//! - `/info` in the maintenance chat only: full sensor details.
//!
//! Replies are plain text. Unknown commands and ordinary chatter are ignored.

use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use kiuas_core::monitor::MonitorSnapshot;
use kiuas_core::types::ChatId;
use kiuas_events::{BotCommand, TelegramClient, Update};
use tokio_util::sync::CancellationToken;

use crate::engine::SaunaEngine;

/// Server-side long-poll timeout for `getUpdates`.
const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay before polling again after a failed `getUpdates`.
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Kiuas,
    Info,
}

/// Parse a chat message into a command.
///
/// Accepts `/cmd`, `/cmd@botname` (only when `botname` is this bot, if known)
/// and trailing arguments, which are ignored.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<Command> {
    let word = text.split_whitespace().next()?.strip_prefix('/')?;
    let (name, mention) = match word.split_once('@') {
        Some((name, mention)) => (name, Some(mention)),
        None => (word, None),
    };

    if let (Some(mention), Some(me)) = (mention, bot_username) {
        if !mention.eq_ignore_ascii_case(me) {
            return None;
        }
    }

    match name {
        "kiuas" => Some(Command::Kiuas),
        "info" => Some(Command::Info),
        _ => None,
    }
}

/// Reply text for `/kiuas`.
pub fn status_text(snapshot: &MonitorSnapshot) -> String {
    let on_off = if snapshot.thermal.is_heating() {
        "päällä"
    } else {
        "pois päältä"
    };

    match &snapshot.reading {
        Some(reading) => format!(
            "Sauna on {on_off}\nLämpötila: {:.1} °C\nKosteus: {:.1}%",
            reading.temperature, reading.humidity
        ),
        None => format!("Sauna on {on_off}\nEi mittaustietoja"),
    }
}

/// Reply text for `/info`.
pub fn info_text(snapshot: &MonitorSnapshot, offset: &FixedOffset) -> String {
    let mut lines = vec!["Sauna Info:".to_string()];
    match &snapshot.reading {
        Some(reading) => {
            lines.push(format!("Temperature: {:.1} °C", reading.temperature));
            lines.push(format!("Humidity: {:.1}%", reading.humidity));
            lines.push(format!("Battery: {} mV", reading.battery_mv));
        }
        None => lines.push("No readings since startup".to_string()),
    }
    lines.push(format!("State: {}", snapshot.thermal.label()));
    if let Some(rate) = snapshot.rate_per_sec {
        lines.push(format!("Rate: {rate:.4} °C/s"));
    }
    if snapshot.reading.is_some() {
        lines.push(format!(
            "Last Data Received: {}",
            snapshot
                .last_sample_at
                .with_timezone(offset)
                .format("%Y-%m-%d %H:%M:%S %:z")
        ));
    }
    if snapshot.stale_alert_outstanding {
        lines.push("Sensor data is stale".to_string());
    }
    lines.join("\n")
}

/// Decide the reply for `command` sent from `chat_id`, if any.
pub fn respond(
    command: Command,
    chat_id: ChatId,
    maintenance_chat_id: ChatId,
    snapshot: &MonitorSnapshot,
    offset: &FixedOffset,
) -> Option<String> {
    match command {
        Command::Kiuas => Some(status_text(snapshot)),
        Command::Info if chat_id == maintenance_chat_id => Some(info_text(snapshot, offset)),
        Command::Info => None,
    }
}

/// Register the command menu, then answer commands until `cancel` is
/// triggered.
pub async fn run(engine: Arc<SaunaEngine>, client: TelegramClient, cancel: CancellationToken) {
    let menu = [BotCommand {
        command: "kiuas".into(),
        description: "Näytä saunan tila".into(),
    }];
    if let Err(e) = client.set_my_commands(&menu).await {
        tracing::warn!(error = %e, "Failed to register bot commands");
    }

    let bot_username = match client.get_me().await {
        Ok(me) => me.username,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to look up bot username");
            None
        }
    };

    tracing::info!(
        bot = bot_username.as_deref().unwrap_or("<unknown>"),
        "Command poller started"
    );

    let mut offset = 0;
    loop {
        let polled = tokio::select! {
            _ = cancel.cancelled() => break,
            polled = client.get_updates(offset, LONG_POLL_TIMEOUT) => polled,
        };

        match polled {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    handle_update(&engine, &client, bot_username.as_deref(), update).await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Polling for chat commands failed, retrying");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                }
            }
        }
    }

    tracing::info!("Command poller stopping");
}

async fn handle_update(
    engine: &SaunaEngine,
    client: &TelegramClient,
    bot_username: Option<&str>,
    update: Update,
) {
    let Some(message) = update.message else {
        return;
    };
    let Some(command) = message
        .text
        .as_deref()
        .and_then(|text| parse_command(text, bot_username))
    else {
        return;
    };

    let chat_id = message.chat.id;
    let snapshot = engine.snapshot().await;
    let reply = respond(
        command,
        chat_id,
        engine.destinations().maintenance,
        &snapshot,
        &engine.display_offset(),
    );

    let Some(reply) = reply else {
        tracing::debug!(chat_id, ?command, "Ignoring command from unauthorized chat");
        return;
    };

    if let Err(e) = client.send_message(chat_id, &reply, None).await {
        tracing::error!(chat_id, ?command, error = %e, "Failed to answer chat command");
    }
}
