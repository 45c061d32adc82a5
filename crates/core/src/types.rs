/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Telegram chat identifier (may be negative for groups).
pub type ChatId = i64;
