//! `mock-sensor` -- simulated sauna RuuviTag.
//!
//! Posts RAWv2 frames to the ingestion endpoint on a fixed interval while
//! switching the simulated stove on and off every [`TOGGLE_EVERY`] cycles.
//!
//! | Variable             | Required | Default                 | Description                         |
//! |----------------------|----------|-------------------------|-------------------------------------|
//! | `INGEST_URL`         | no       | `http://localhost:1337` | Base URL of the sauna service       |
//! | `MOCK_INTERVAL_SECS` | no       | `10`                    | Seconds between samples             |
//! | `API_KEY`            | no       | --                      | Adds replay-protection headers      |

use std::time::Duration;

use chrono::Utc;
use kiuas_core::ruuvi::RawV2Frame;
use rand::Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_INGEST_URL: &str = "http://localhost:1337";
const DEFAULT_INTERVAL_SECS: u64 = 10;

/// Cycles between stove on/off toggles.
const TOGGLE_EVERY: u32 = 10;

const ROOM_TEMPERATURE: f64 = 20.0;
const MAX_TEMPERATURE: f64 = 90.0;
const MIN_HUMIDITY: f64 = 10.0;
const MAX_HUMIDITY: f64 = 40.0;

const MAC: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];

/// Simulated stove and room.
struct Sauna {
    heating: bool,
    temperature: f64,
    humidity: f64,
    cycle: u32,
    sequence: u16,
}

impl Sauna {
    fn new() -> Self {
        Self {
            heating: false,
            temperature: ROOM_TEMPERATURE,
            humidity: 20.0,
            cycle: 0,
            sequence: 0,
        }
    }

    fn step(&mut self, rng: &mut impl Rng) -> RawV2Frame {
        self.cycle += 1;
        if self.cycle >= TOGGLE_EVERY {
            self.cycle = 0;
            self.heating = !self.heating;
            tracing::info!(heating = self.heating, "Stove toggled");
        }

        if self.heating {
            self.temperature = (self.temperature + rng.random_range(0.5..2.0)).min(MAX_TEMPERATURE);
            self.humidity = (self.humidity + rng.random_range(0.1..1.0)).min(MAX_HUMIDITY);
        } else {
            self.temperature =
                (self.temperature - rng.random_range(0.5..1.5)).max(ROOM_TEMPERATURE);
            self.humidity = (self.humidity - rng.random_range(0.1..0.5)).max(MIN_HUMIDITY);
        }
        self.sequence = self.sequence.wrapping_add(1);

        RawV2Frame {
            temperature: self.temperature,
            humidity: self.humidity,
            battery_mv: 3000,
            pressure_pa: Some(101_325),
            acceleration_mg: Some([0, 0, 1000]),
            tx_power_dbm: Some(4),
            movement_counter: Some(0),
            sequence: Some(self.sequence),
            mac: MAC,
        }
    }
}

/// Random hex nonce, 16 bytes of entropy.
fn nonce(rng: &mut impl Rng) -> String {
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_sensor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url =
        std::env::var("INGEST_URL").unwrap_or_else(|_| DEFAULT_INGEST_URL.to_string());
    let url = format!("{}/api/receive-bt", base_url.trim_end_matches('/'));

    let interval_secs: u64 = std::env::var("MOCK_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_INTERVAL_SECS);

    let api_key = std::env::var("API_KEY").ok().filter(|k| !k.is_empty());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to build HTTP client");
            std::process::exit(1);
        });

    tracing::info!(
        url = %url,
        interval_secs,
        signed = api_key.is_some(),
        "Starting mock sensor"
    );

    let mut sauna = Sauna::new();
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Mock sensor stopping");
                break;
            }
            _ = interval.tick() => {}
        }

        let (frame, nonce) = {
            let mut rng = rand::rng();
            (sauna.step(&mut rng), nonce(&mut rng))
        };

        let mut request = client.post(&url).body(frame.to_bytes().to_vec());
        if let Some(key) = &api_key {
            request = request
                .header("API-Key", key)
                .header("Timestamp", Utc::now().timestamp().to_string())
                .header("Nonce", nonce);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => tracing::info!(
                temperature = format_args!("{:.1}", frame.temperature),
                humidity = format_args!("{:.1}", frame.humidity),
                heating = sauna.heating,
                "Sample sent"
            ),
            Ok(response) => tracing::warn!(
                status = response.status().as_u16(),
                "Service rejected sample"
            ),
            Err(e) => tracing::warn!(error = %e, "Failed to send sample"),
        }
    }
}
