use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;
use kiuas_core::error::CoreError;
use kiuas_core::monitor::config::{
    MonitorConfig, DEFAULT_READY_THRESHOLD, DEFAULT_RESET_THRESHOLD,
    DEFAULT_STALENESS_TIMEOUT_SECS, DEFAULT_WARMING_RATE_LOWER_BOUND,
    DEFAULT_WARMING_TIMEOUT_SECS,
};
use kiuas_core::types::ChatId;
use kiuas_events::delivery::telegram::DEFAULT_API_URL;

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Monitor(#[from] CoreError),
}

/// Telegram connection settings.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_url: String,
    /// Whether to long-poll for `/kiuas` and `/info` commands.
    pub commands_enabled: bool,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("commands_enabled", &self.commands_enabled)
            .finish()
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `1337`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub telegram: TelegramConfig,
    /// Chat receiving warming / ready / stalled notifications.
    pub notification_chat_id: ChatId,
    /// Chat receiving sensor dropout alerts; also the only chat allowed `/info`.
    pub maintenance_chat_id: ChatId,
    pub monitor: MonitorConfig,
    /// How often the staleness watchdog runs (default: 60 s).
    pub watchdog_interval: Duration,
    /// Offset used for clock times in chat messages (default: UTC+2).
    pub display_offset: FixedOffset,
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                          | Default                    |
    /// |----------------------------------|----------------------------|
    /// | `TELEGRAM_BOT_TOKEN`             | required                   |
    /// | `NOTIFICATION_CHAT_ID`           | required                   |
    /// | `MAINTENANCE_CHAT_ID`            | required                   |
    /// | `TELEGRAM_API_URL`               | `https://api.telegram.org` |
    /// | `TELEGRAM_COMMANDS_ENABLED`      | `true`                     |
    /// | `HOST`                           | `0.0.0.0`                  |
    /// | `SERVER_PORT`                    | `1337`                     |
    /// | `REQUEST_TIMEOUT_SECS`           | `30`                       |
    /// | `SAUNA_READY_THRESHOLD`          | `70.0`                     |
    /// | `SAUNA_WARMING_RATE_LOWER_BOUND` | `0.0123`                   |
    /// | `SAUNA_RESET_THRESHOLD`          | `40.0`                     |
    /// | `SAUNA_WARMING_TIMEOUT_SECS`     | `7200`                     |
    /// | `STALENESS_TIMEOUT_SECS`         | `3600`                     |
    /// | `WATCHDOG_INTERVAL_SECS`         | `60`                       |
    /// | `DISPLAY_UTC_OFFSET_MINUTES`     | `120`                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let telegram = TelegramConfig {
            bot_token: env.required("TELEGRAM_BOT_TOKEN")?,
            api_url: env
                .get("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            commands_enabled: env.parse_or("TELEGRAM_COMMANDS_ENABLED", true)?,
        };

        let monitor = MonitorConfig {
            ready_threshold: env.parse_or("SAUNA_READY_THRESHOLD", DEFAULT_READY_THRESHOLD)?,
            warming_rate_lower_bound: env.parse_or(
                "SAUNA_WARMING_RATE_LOWER_BOUND",
                DEFAULT_WARMING_RATE_LOWER_BOUND,
            )?,
            reset_threshold: env.parse_or("SAUNA_RESET_THRESHOLD", DEFAULT_RESET_THRESHOLD)?,
            warming_timeout: chrono::Duration::seconds(
                env.parse_or("SAUNA_WARMING_TIMEOUT_SECS", DEFAULT_WARMING_TIMEOUT_SECS)?,
            ),
            staleness_timeout: chrono::Duration::seconds(
                env.parse_or("STALENESS_TIMEOUT_SECS", DEFAULT_STALENESS_TIMEOUT_SECS)?,
            ),
        };
        monitor.validate()?;

        let watchdog_secs: u64 = env.parse_or("WATCHDOG_INTERVAL_SECS", 60)?;
        if watchdog_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "WATCHDOG_INTERVAL_SECS",
                value: watchdog_secs.to_string(),
                reason: "must be positive".into(),
            });
        }

        let offset_minutes: i32 = env.parse_or("DISPLAY_UTC_OFFSET_MINUTES", 120)?;
        let display_offset =
            FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| ConfigError::Invalid {
                key: "DISPLAY_UTC_OFFSET_MINUTES",
                value: offset_minutes.to_string(),
                reason: "offset out of range".into(),
            })?;

        Ok(Self {
            host: env.get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: env.parse_or("SERVER_PORT", 1337)?,
            request_timeout_secs: env.parse_or("REQUEST_TIMEOUT_SECS", 30)?,
            telegram,
            notification_chat_id: env.parse_required("NOTIFICATION_CHAT_ID")?,
            maintenance_chat_id: env.parse_required("MAINTENANCE_CHAT_ID")?,
            monitor,
            watchdog_interval: Duration::from_secs(watchdog_secs),
            display_offset,
        })
    }
}

/// Typed accessors over a key lookup. Empty values count as unset.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parse_required<T>(&self, key: &'static str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.required(key)?;
        parse(key, raw)
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            Some(raw) => parse(key, raw),
            None => Ok(default),
        }
    }
}

fn parse<T>(key: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value: raw,
    })
}
