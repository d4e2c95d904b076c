//! Packet decoder.
//!
//! Turns one delimited tracker packet into a [`DecodeOutcome`]. The decoder
//! is a pure function: no I/O, no logging, no shared state, so it may be
//! called from any number of tasks at once.
//!
//! # Field layout
//!
//! | Index | Field | Index | Field |
//! |-------|-------|-------|-------|
//! | 0 | protocol header | 10 | east/west indicator |
//! | 1 | GPS signal (`S` = valid) | 11 | GPS fix (`A` = valid) |
//! | 2, 3 | latitude parts | 12 | horizontal dilution |
//! | 4, 5 | longitude parts | 13 | altitude (m) |
//! | 6 | speed (knots) | 14 | IO status code |
//! | 7 | course (degrees) | 15 | analog data 1 |
//! | 8 | date `DDMMYY` | 16 | analog data 2 (hex) |
//! | 9 | magnetic variation | 17 | odometer |
//! | | | 18 | RFID |
//!
//! # Arity
//!
//! - 15 tokens or fewer: [`DecodeOutcome::HeaderOnly`]
//! - 16 to 18 tokens: [`DecodeOutcome::Truncated`]; missing trailing fields
//!   are never filled in
//! - 19 tokens or more: [`DecodeOutcome::Full`], extra tokens ignored

mod fields;
mod tokenize;

pub use fields::{
    BATTERY_ADC_STEPS, BATTERY_REFERENCE_VOLTS, MILEAGE_FACTOR, battery_voltage, parse_decimal,
    parse_hex, total_mileage,
};
pub use tokenize::{is_separator, tokenize};

use crate::types::{DecodeOutcome, Hemisphere, IoStatus, TelemetryRecord};

/// Packets with this many tokens or fewer carry only a protocol header.
pub const HEADER_ONLY_MAX_TOKENS: usize = 15;

/// Tokens needed to extract every positional field.
pub const FULL_PACKET_TOKENS: usize = 19;

/// Decode one packet line.
pub fn decode(line: &str) -> DecodeOutcome {
    let tokens = tokenize(line);
    let protocol_header = tokens.first().copied().unwrap_or_default().to_string();

    if tokens.len() <= HEADER_ONLY_MAX_TOKENS {
        return DecodeOutcome::HeaderOnly { protocol_header };
    }

    let Some(fields) = tokens.first_chunk::<FULL_PACKET_TOKENS>() else {
        return DecodeOutcome::Truncated { protocol_header, token_count: tokens.len() };
    };

    DecodeOutcome::Full(build_record(fields))
}

fn build_record(fields: &[&str; FULL_PACKET_TOKENS]) -> TelemetryRecord {
    let [
        protocol_header,
        gps_signal,
        latitude_head,
        latitude_tail,
        longitude_head,
        longitude_tail,
        speed_knots,
        course_degrees,
        timestamp,
        magnetic_variation,
        east_west,
        gps_fix,
        horizontal_dilution,
        altitude_meters,
        io_status_code,
        analog_data_1,
        analog_data_2_hex,
        odometer_meters,
        rfid,
    ] = *fields;

    let analog_data_2_decimal = parse_hex(analog_data_2_hex);
    let io_status = IoStatus::classify(io_status_code);
    let total_mileage_km = if io_status.device_disconnected() {
        parse_decimal(odometer_meters).map(total_mileage)
    } else {
        None
    };

    TelemetryRecord {
        protocol_header: protocol_header.to_string(),
        gps_signal_valid: gps_signal == "S",
        latitude: [latitude_head, latitude_tail].concat(),
        longitude: [longitude_head, longitude_tail].concat(),
        speed_knots: speed_knots.to_string(),
        course_degrees: course_degrees.to_string(),
        timestamp: timestamp.to_string(),
        magnetic_variation: magnetic_variation.to_string(),
        hemisphere: Hemisphere::from_indicator(east_west),
        gps_fix_valid: gps_fix == "A",
        horizontal_dilution: horizontal_dilution.to_string(),
        altitude_meters: altitude_meters.to_string(),
        io_status_code: io_status_code.to_string(),
        io_status,
        analog_data_1: analog_data_1.to_string(),
        analog_data_2_hex: analog_data_2_hex.to_string(),
        analog_data_2_decimal,
        battery_voltage_volts: analog_data_2_decimal.map(battery_voltage),
        odometer_meters: odometer_meters.to_string(),
        rfid: rfid.to_string(),
        total_mileage_km,
    }
}
