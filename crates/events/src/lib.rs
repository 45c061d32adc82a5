//! Outbound delivery for sauna notifications.
//!
//! - [`Notifier`]: the seam the service sends through, so tests can record
//!   messages instead of talking to Telegram.
//! - [`TelegramClient`]: Bot API client used both as a [`Notifier`] and by
//!   the command poller (`getUpdates`, `setMyCommands`).

pub mod delivery;

pub use delivery::telegram::{BotCommand, ChatMessage, ParseMode, TelegramClient, Update};
pub use delivery::{DeliveryError, Notifier};
