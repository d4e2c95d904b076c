//! Decoded telemetry record

use serde::{Deserialize, Serialize};

use super::IoStatus;

/// East/west indicator of a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    East,
    West,
}

impl Hemisphere {
    /// `"E"` is east; every other value, including empty, is west.
    pub fn from_indicator(indicator: &str) -> Self {
        if indicator == "E" { Hemisphere::East } else { Hemisphere::West }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Hemisphere::East => "East",
            Hemisphere::West => "West",
        }
    }
}

/// A derived field that could not be computed from its raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MalformedField {
    /// Analog data 2 is not valid hexadecimal
    AnalogData2,
    /// Odometer is not a decimal integer while the device is disconnected
    Odometer,
}

/// Telemetry record decoded from a full tracker packet.
///
/// Positional fields are kept verbatim. Derived values are `None` when their
/// source field does not parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub protocol_header: String,
    pub gps_signal_valid: bool,
    /// Tokens 2 and 3 concatenated
    pub latitude: String,
    /// Tokens 4 and 5 concatenated
    pub longitude: String,
    pub speed_knots: String,
    pub course_degrees: String,
    /// Raw `DDMMYY` date token
    pub timestamp: String,
    pub magnetic_variation: String,
    pub hemisphere: Hemisphere,
    pub gps_fix_valid: bool,
    pub horizontal_dilution: String,
    pub altitude_meters: String,
    pub io_status_code: String,
    pub io_status: IoStatus,
    pub analog_data_1: String,
    pub analog_data_2_hex: String,
    pub analog_data_2_decimal: Option<i128>,
    /// External battery voltage, `analog_data_2_decimal * 6 / 1024`
    pub battery_voltage_volts: Option<f64>,
    pub odometer_meters: String,
    pub rfid: String,
    /// Only computed while the device reports a disconnect
    pub total_mileage_km: Option<f64>,
}

impl TelemetryRecord {
    pub fn engine_on(&self) -> bool {
        self.io_status.engine_on()
    }

    pub fn engine_on_door_open(&self) -> bool {
        self.io_status.engine_on_door_open()
    }

    pub fn relay_activated_sos_pressed(&self) -> bool {
        self.io_status.relay_activated_sos_pressed()
    }

    pub fn device_disconnected(&self) -> bool {
        self.io_status.device_disconnected()
    }

    /// Timestamp rendered as `DD/MM/YYYY`.
    ///
    /// The raw token is sliced at character offsets 0..2, 2..4 and 4..6 with
    /// "20" prefixed to the year. No calendar validation happens and short
    /// tokens yield short pieces, so `"1509"` renders as `"15/09/20"`.
    pub fn display_date(&self) -> String {
        let chars: Vec<char> = self.timestamp.chars().collect();
        let slice = |start: usize, end: usize| -> String {
            chars.get(start.min(chars.len())..end.min(chars.len())).unwrap_or(&[]).iter().collect()
        };
        format!("{}/{}/20{}", slice(0, 2), slice(2, 4), slice(4, 6))
    }

    /// Derived fields that degraded to absent because their source was malformed.
    pub fn malformed_fields(&self) -> Vec<MalformedField> {
        let mut fields = Vec::new();
        if self.analog_data_2_decimal.is_none() {
            fields.push(MalformedField::AnalogData2);
        }
        if self.device_disconnected() && self.total_mileage_km.is_none() {
            fields.push(MalformedField::Odometer);
        }
        fields
    }
}
