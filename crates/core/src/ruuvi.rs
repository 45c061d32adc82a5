//! RuuviTag RAWv2 (data format 5) payload codec.
//!
//! The sensor relay forwards the BLE manufacturer-specific data verbatim:
//! a two byte company identifier (`0x0499`, little-endian on the wire)
//! followed by the 24 byte format 5 frame. The bare frame is accepted too.
//!
//! ```text
//! offset  size  field
//!  0      1     data format (5)
//!  1      2     temperature      i16  × 0.005 °C
//!  3      2     humidity         u16  × 0.0025 %
//!  5      2     pressure         u16  + 50000 Pa
//!  7      6     acceleration xyz i16  mG
//! 13      2     power info       11 bits battery (+1600 mV), 5 bits tx (×2 − 40 dBm)
//! 15      1     movement counter u8
//! 16      2     sequence number  u16
//! 18      6     MAC address
//! ```

use crate::reading::Reading;
use crate::types::Timestamp;

/// Ruuvi Innovations Bluetooth SIG company identifier.
pub const MANUFACTURER_ID: u16 = 0x0499;

/// The only data format this codec understands.
pub const DATA_FORMAT_RAW_V2: u8 = 5;

/// Length of the format 5 frame without the company identifier.
pub const FRAME_LEN: usize = 24;

/// Length of the manufacturer-specific data block (company id + frame).
pub const PAYLOAD_LEN: usize = FRAME_LEN + 2;

const TEMPERATURE_STEP: f64 = 0.005;
const HUMIDITY_STEP: f64 = 0.0025;
const PRESSURE_OFFSET_PA: u32 = 50_000;
const BATTERY_OFFSET_MV: u16 = 1_600;

const INVALID_I16: i16 = i16::MIN;
const INVALID_U16: u16 = u16::MAX;
const INVALID_U8: u8 = u8::MAX;
const INVALID_BATTERY: u16 = 0x7FF;
const INVALID_TX_POWER: u16 = 0x1F;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Reasons a sensor payload cannot be turned into a [`Reading`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("expected 24 or 26 bytes, got {0}")]
    WrongLength(usize),

    #[error("unknown manufacturer id 0x{0:04x}")]
    UnknownManufacturer(u16),

    #[error("unsupported data format {0}")]
    UnsupportedFormat(u8),

    #[error("sensor reported {0} as not available")]
    NotAvailable(&'static str),
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// A fully decoded format 5 frame.
///
/// Temperature, humidity and battery are mandatory because a [`Reading`]
/// needs them; the remaining fields are `None` when the tag reports them as
/// not available.
#[derive(Debug, Clone, PartialEq)]
pub struct RawV2Frame {
    pub temperature: f64,
    pub humidity: f64,
    pub battery_mv: u16,
    pub pressure_pa: Option<u32>,
    pub acceleration_mg: Option<[i16; 3]>,
    pub tx_power_dbm: Option<i8>,
    pub movement_counter: Option<u8>,
    pub sequence: Option<u16>,
    pub mac: [u8; 6],
}

impl RawV2Frame {
    /// Parse a manufacturer data block or a bare frame.
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        let frame = match bytes.len() {
            PAYLOAD_LEN => {
                let company = u16::from_le_bytes([bytes[0], bytes[1]]);
                if company != MANUFACTURER_ID {
                    return Err(DecodeError::UnknownManufacturer(company));
                }
                &bytes[2..]
            }
            FRAME_LEN => bytes,
            other => return Err(DecodeError::WrongLength(other)),
        };

        if frame[0] != DATA_FORMAT_RAW_V2 {
            return Err(DecodeError::UnsupportedFormat(frame[0]));
        }

        let be_i16 = |at: usize| i16::from_be_bytes([frame[at], frame[at + 1]]);
        let be_u16 = |at: usize| u16::from_be_bytes([frame[at], frame[at + 1]]);

        let raw_temperature = be_i16(1);
        if raw_temperature == INVALID_I16 {
            return Err(DecodeError::NotAvailable("temperature"));
        }

        let raw_humidity = be_u16(3);
        if raw_humidity == INVALID_U16 {
            return Err(DecodeError::NotAvailable("humidity"));
        }

        let power = be_u16(13);
        let raw_battery = power >> 5;
        if raw_battery == INVALID_BATTERY {
            return Err(DecodeError::NotAvailable("battery"));
        }
        let raw_tx = power & 0x1F;

        let raw_pressure = be_u16(5);
        let accel = [be_i16(7), be_i16(9), be_i16(11)];
        let raw_sequence = be_u16(16);

        let mut mac = [0u8; 6];
        mac.copy_from_slice(&frame[18..24]);

        Ok(Self {
            temperature: f64::from(raw_temperature) * TEMPERATURE_STEP,
            humidity: f64::from(raw_humidity) * HUMIDITY_STEP,
            battery_mv: raw_battery + BATTERY_OFFSET_MV,
            pressure_pa: (raw_pressure != INVALID_U16)
                .then(|| u32::from(raw_pressure) + PRESSURE_OFFSET_PA),
            acceleration_mg: (!accel.contains(&INVALID_I16)).then_some(accel),
            tx_power_dbm: (raw_tx != INVALID_TX_POWER).then(|| (raw_tx as i8) * 2 - 40),
            movement_counter: (frame[15] != INVALID_U8).then_some(frame[15]),
            sequence: (raw_sequence != INVALID_U16).then_some(raw_sequence),
            mac,
        })
    }

    /// Encode as a manufacturer data block (company id + frame).
    ///
    /// Out-of-range values saturate at the nearest encodable value.
    pub fn to_bytes(&self) -> [u8; PAYLOAD_LEN] {
        let mut out = [0u8; PAYLOAD_LEN];
        out[0..2].copy_from_slice(&MANUFACTURER_ID.to_le_bytes());

        let f = &mut out[2..];
        f[0] = DATA_FORMAT_RAW_V2;

        let temperature = (self.temperature / TEMPERATURE_STEP)
            .round()
            .clamp(f64::from(INVALID_I16 + 1), f64::from(i16::MAX)) as i16;
        f[1..3].copy_from_slice(&temperature.to_be_bytes());

        let humidity = (self.humidity / HUMIDITY_STEP)
            .round()
            .clamp(0.0, f64::from(INVALID_U16 - 1)) as u16;
        f[3..5].copy_from_slice(&humidity.to_be_bytes());

        let pressure = self
            .pressure_pa
            .map(|pa| pa.saturating_sub(PRESSURE_OFFSET_PA).min(u32::from(INVALID_U16 - 1)) as u16)
            .unwrap_or(INVALID_U16);
        f[5..7].copy_from_slice(&pressure.to_be_bytes());

        let accel = self
            .acceleration_mg
            .unwrap_or([INVALID_I16, INVALID_I16, INVALID_I16]);
        for (i, axis) in accel.iter().enumerate() {
            let at = 7 + i * 2;
            f[at..at + 2].copy_from_slice(&axis.to_be_bytes());
        }

        let battery = self
            .battery_mv
            .saturating_sub(BATTERY_OFFSET_MV)
            .min(INVALID_BATTERY - 1);
        let tx = self
            .tx_power_dbm
            .map(|dbm| ((i16::from(dbm) + 40) / 2).clamp(0, 0x1E) as u16)
            .unwrap_or(INVALID_TX_POWER);
        f[13..15].copy_from_slice(&((battery << 5) | tx).to_be_bytes());

        f[15] = self.movement_counter.unwrap_or(INVALID_U8);
        f[16..18].copy_from_slice(&self.sequence.unwrap_or(INVALID_U16).to_be_bytes());
        f[18..24].copy_from_slice(&self.mac);

        out
    }

    pub fn into_reading(self, observed_at: Timestamp) -> Reading {
        Reading::new(self.temperature, self.humidity, self.battery_mv, observed_at)
    }
}

/// Decode a raw sensor payload into a [`Reading`] stamped with `observed_at`.
pub fn decode(bytes: &[u8], observed_at: Timestamp) -> Result<Reading, DecodeError> {
    RawV2Frame::parse(bytes).map(|frame| frame.into_reading(observed_at))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
