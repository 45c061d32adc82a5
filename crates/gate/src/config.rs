use std::fmt;
use std::time::Duration;

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} must be a positive integer, got {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Gate configuration loaded from environment variables.
#[derive(Clone)]
pub struct GateConfig {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    /// Maximum allowed clock skew between caller and gate.
    pub timestamp_window: chrono::Duration,
    /// How often nonces whose timestamp has left the window are purged.
    pub cleanup_interval: Duration,
}

impl fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .field("timestamp_window", &self.timestamp_window)
            .field("cleanup_interval", &self.cleanup_interval)
            .finish()
    }
}

impl GateConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                       | Default   |
    /// |-------------------------------|-----------|
    /// | `API_KEY`                     | required  |
    /// | `HOST`                        | `0.0.0.0` |
    /// | `GATE_PORT`                   | `8080`    |
    /// | `TIMESTAMP_WINDOW_SECS`       | `300`     |
    /// | `NONCE_CLEANUP_INTERVAL_SECS` | `300`     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let positive = |key: &'static str, default: u32| -> Result<u32, ConfigError> {
            match get(key) {
                None => Ok(default),
                Some(raw) => match raw.trim().parse::<u32>() {
                    Ok(n) if n > 0 => Ok(n),
                    _ => Err(ConfigError::Invalid { key, value: raw }),
                },
            }
        };

        let port = positive("GATE_PORT", 8080)?;
        let port = u16::try_from(port).map_err(|_| ConfigError::Invalid {
            key: "GATE_PORT",
            value: port.to_string(),
        })?;

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            api_key: get("API_KEY").ok_or(ConfigError::Missing("API_KEY"))?,
            timestamp_window: chrono::Duration::seconds(i64::from(positive(
                "TIMESTAMP_WINDOW_SECS",
                300,
            )?)),
            cleanup_interval: Duration::from_secs(u64::from(positive(
                "NONCE_CLEANUP_INTERVAL_SECS",
                300,
            )?)),
        })
    }
}
