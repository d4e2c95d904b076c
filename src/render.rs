//! Human readable rendering of decoded packets.
//!
//! The text layout mirrors the tracker vendor's desktop display: one
//! `Label: value` line per field, with "Invalid Data" standing in for derived
//! values that could not be computed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::types::TelemetryRecord;

/// Placeholder shown for derived values that are absent.
pub const INVALID_DATA: &str = "Invalid Data";

/// Output format for rendered records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `Label: value` lines
    #[default]
    Text,
    /// The record serialized as a YAML document
    Yaml,
}

impl OutputFormat {
    /// Render a record in this format.
    pub fn render(self, record: &TelemetryRecord) -> Result<String> {
        match self {
            OutputFormat::Text => Ok(render_text(record)),
            OutputFormat::Yaml => Ok(serde_yaml_ng::to_string(record)?),
        }
    }
}

fn valid(flag: bool) -> &'static str {
    if flag { "Valid" } else { "Invalid" }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// Derived reading shown the way the vendor display prints floats.
///
/// Whole values keep a trailing `.0`. Magnitudes below 1e-4 or from 1e16 up
/// switch to exponent form with a signed, two digit exponent (`1.60934e+20`).
struct Reading(f64);

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if value.is_nan() {
            return f.write_str("nan");
        }
        if value.is_infinite() {
            return f.write_str(if value > 0.0 { "inf" } else { "-inf" });
        }

        let magnitude = value.abs();
        if magnitude == 0.0 || (1e-4..1e16).contains(&magnitude) {
            let text = value.to_string();
            f.write_str(&text)?;
            if !text.contains('.') {
                f.write_str(".0")?;
            }
            return Ok(());
        }

        let text = format!("{value:e}");
        let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        write!(f, "{mantissa}e{sign}{digits:0>2}")
    }
}

/// Render a record as display text.
pub fn render_text(record: &TelemetryRecord) -> String {
    let mut out = String::with_capacity(768);
    // Writing to a String cannot fail
    let _ = write_text(&mut out, record);
    out
}

fn write_text(out: &mut impl fmt::Write, record: &TelemetryRecord) -> fmt::Result {
    writeln!(out, "Received data from GPS Tracker:")?;
    writeln!(out, "Protocol Header: {}", record.protocol_header)?;
    writeln!(out, "GPS Signal Status: {}", valid(record.gps_signal_valid))?;
    writeln!(out, "Latitude: {}", record.latitude)?;
    writeln!(out, "Longitude: {}", record.longitude)?;
    writeln!(out, "Speed (knots): {}", record.speed_knots)?;
    writeln!(out, "Course (degrees): {}", record.course_degrees)?;
    writeln!(out, "Timestamp (DD/MM/YYYY): {}", record.display_date())?;
    writeln!(out, "Magnetic Variation: {}", record.magnetic_variation)?;
    writeln!(out, "East/West Indicator: {}", record.hemisphere.as_str())?;
    writeln!(out, "GPS Fix: {}", valid(record.gps_fix_valid))?;
    writeln!(out, "Horizontal Dilution: {}", record.horizontal_dilution)?;
    writeln!(out, "Altitude (meters): {}", record.altitude_meters)?;
    writeln!(out, "Input/Output Status: {}", record.io_status_code)?;
    writeln!(out, "Engine On: {}", yes_no(record.engine_on()))?;
    writeln!(out, "Engine On and Door Open: {}", yes_no(record.engine_on_door_open()))?;
    writeln!(
        out,
        "Relay Activated and SOS Pressed: {}",
        yes_no(record.relay_activated_sos_pressed())
    )?;
    writeln!(out, "Device Disconnected: {}", yes_no(record.device_disconnected()))?;
    match record.total_mileage_km {
        Some(km) => writeln!(out, "Total Mileage (km): {}", Reading(km))?,
        None => writeln!(out, "Total Mileage: {INVALID_DATA}")?,
    }
    writeln!(out, "Analog Data 1: {}", record.analog_data_1)?;
    writeln!(out, "Analog Data 2 (Hexadecimal): {}", record.analog_data_2_hex)?;
    match record.battery_voltage_volts {
        Some(volts) => writeln!(out, "External Car Battery Voltage: {} Volts", Reading(volts))?,
        None => writeln!(out, "External Car Battery Voltage: {INVALID_DATA}")?,
    }
    writeln!(out, "Odometer (meters): {}", record.odometer_meters)?;
    writeln!(out, "RFID: {}", record.rfid)
}

impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_text(f, self)
    }
}
