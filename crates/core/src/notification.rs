//! Outbound notifications produced by the monitor.
//!
//! The monitor only decides *that* something should be said; rendering to
//! chat text happens here so the API crate can hand the result straight to a
//! notifier.

use std::fmt;

use chrono::{Duration, FixedOffset};

use crate::markdown::escape;
use crate::types::Timestamp;

/// Where a notification is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The sauna users' chat.
    Notification,
    /// The operator chat (sensor dropouts).
    Maintenance,
}

/// A notification decided by the thermal state machine or the watchdog.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Temperature is climbing fast enough to count as a warming cycle.
    Warming {
        temperature: f64,
        rate_per_sec: f64,
        estimated_ready_at: Timestamp,
    },
    /// Temperature reached the ready threshold.
    Ready { temperature: f64 },
    /// A warming cycle did not reach the ready threshold in time.
    WarmingStalled {
        temperature: f64,
        warming_started_at: Timestamp,
    },
    /// No sample has arrived within the staleness timeout.
    DataStale {
        last_sample_at: Timestamp,
        timeout: Duration,
    },
}

impl Notification {
    /// Short machine-readable name, used in logs and API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Warming { .. } => "warming",
            Self::Ready { .. } => "ready",
            Self::WarmingStalled { .. } => "warming_stalled",
            Self::DataStale { .. } => "data_stale",
        }
    }

    pub fn destination(&self) -> Destination {
        match self {
            Self::DataStale { .. } => Destination::Maintenance,
            _ => Destination::Notification,
        }
    }

    /// Render as a Telegram MarkdownV2 message.
    ///
    /// Clock times are shown in `offset`.
    pub fn render(&self, offset: &FixedOffset) -> String {
        match self {
            Self::Warming {
                estimated_ready_at, ..
            } => format!(
                "🔥*Sauna lämpiää\\!*🔥\nValmis klo {}",
                clock(estimated_ready_at, offset)
            ),
            Self::Ready { temperature } => format!(
                "*Sauna valmis\\!*🔥\nLämpötila: {} °C 🌡️",
                escape(&format!("{temperature:.1}"))
            ),
            Self::WarmingStalled {
                temperature,
                warming_started_at,
            } => format!(
                "⚠️ *Sauna ei valmistunut*\nLämmitys alkoi klo {}, lämpötila nyt {} °C",
                clock(warming_started_at, offset),
                escape(&format!("{temperature:.1}"))
            ),
            Self::DataStale { timeout, .. } => {
                format!("No data received for over {}", escape(&humanize(*timeout)))
            }
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warming {
                temperature,
                rate_per_sec,
                estimated_ready_at,
            } => write!(
                f,
                "warming at {temperature:.1} °C ({rate_per_sec:.4} °C/s), ready around {}",
                estimated_ready_at.to_rfc3339()
            ),
            Self::Ready { temperature } => write!(f, "ready at {temperature:.1} °C"),
            Self::WarmingStalled {
                temperature,
                warming_started_at,
            } => write!(
                f,
                "warming since {} stalled at {temperature:.1} °C",
                warming_started_at.to_rfc3339()
            ),
            Self::DataStale {
                last_sample_at,
                timeout,
            } => write!(
                f,
                "no data for over {} (last sample {})",
                humanize(*timeout),
                last_sample_at.to_rfc3339()
            ),
        }
    }
}

fn clock(at: &Timestamp, offset: &FixedOffset) -> String {
    at.with_timezone(offset).format("%H:%M").to_string()
}

/// Render a duration in the largest whole unit that divides it exactly.
pub fn humanize(duration: Duration) -> String {
    let secs = duration.num_seconds();
    let (value, unit) = if secs != 0 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs != 0 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };

    if value == 1 {
        format!("1 {unit}")
    } else {
        format!("{value} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn helsinki_summer() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    #[test]
    fn ready_text_escapes_temperature() {
        let n = Notification::Ready { temperature: 80.0 };
        assert_eq!(
            n.render(&helsinki_summer()),
            "*Sauna valmis\\!*🔥\nLämpötila: 80\\.0 °C 🌡️"
        );
        assert!(n.to_string().contains("80.0"));
    }

    #[test]
    fn warming_text_uses_display_offset() {
        let n = Notification::Warming {
            temperature: 60.0,
            rate_per_sec: 0.0139,
            estimated_ready_at: Utc.with_ymd_and_hms(2024, 6, 1, 15, 18, 0).unwrap(),
        };
        assert_eq!(
            n.render(&helsinki_summer()),
            "🔥*Sauna lämpiää\\!*🔥\nValmis klo 18:18"
        );
    }

    #[test]
    fn stale_alert_goes_to_maintenance() {
        let n = Notification::DataStale {
            last_sample_at: Utc::now(),
            timeout: Duration::hours(1),
        };
        assert_eq!(n.destination(), Destination::Maintenance);
        assert_eq!(
            n.render(&helsinki_summer()),
            "No data received for over 1 hour"
        );
    }

    #[test]
    fn thermal_notifications_go_to_users() {
        assert_eq!(
            Notification::Ready { temperature: 75.0 }.destination(),
            Destination::Notification
        );
    }

    #[test]
    fn humanize_picks_largest_exact_unit() {
        assert_eq!(humanize(Duration::hours(2)), "2 hours");
        assert_eq!(humanize(Duration::minutes(90)), "90 minutes");
        assert_eq!(humanize(Duration::seconds(45)), "45 seconds");
        assert_eq!(humanize(Duration::minutes(1)), "1 minute");
    }
}
