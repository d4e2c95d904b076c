//! Test utilities for building tracker packets
//!
//! Shared by unit tests and the decode benchmark so both exercise the same
//! realistic field values.

#![cfg(any(test, feature = "benchmark"))]

use crate::decoder::FULL_PACKET_TOKENS;

/// Field values of a well-formed packet from a tracker with the engine running.
pub const SAMPLE_FIELDS: [&str; FULL_PACKET_TOKENS] = [
    "$TRK", "S", "2234", "5678", "11345", "6789", "0.5", "120", "150923", "0.0", "E", "A", "1.2",
    "45", "1000", "0001", "3A2", "1000", "RF01",
];

/// Builder for packet lines with individual fields overridden.
///
/// Values must not be empty or contain separators, since either would change
/// the token count.
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    fields: Vec<String>,
}

impl Default for PacketBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketBuilder {
    /// Start from [`SAMPLE_FIELDS`].
    pub fn new() -> Self {
        Self { fields: SAMPLE_FIELDS.iter().map(|field| field.to_string()).collect() }
    }

    /// Override the field at `index`.
    pub fn field(mut self, index: usize, value: &str) -> Self {
        self.fields[index] = value.to_string();
        self
    }

    /// Current value of the field at `index`.
    pub fn get(&self, index: usize) -> &str {
        &self.fields[index]
    }

    pub fn timestamp(self, value: &str) -> Self {
        self.field(8, value)
    }

    pub fn io_status(self, value: &str) -> Self {
        self.field(14, value)
    }

    pub fn analog_data_2(self, value: &str) -> Self {
        self.field(16, value)
    }

    pub fn odometer(self, value: &str) -> Self {
        self.field(17, value)
    }

    /// Join the fields with commas.
    pub fn build(&self) -> String {
        self.fields.join(",")
    }
}

/// A comma separated line of exactly `count` tokens, starting with the
/// sample header.
pub fn fields_line(count: usize) -> String {
    (0..count)
        .map(|index| SAMPLE_FIELDS.get(index).copied().unwrap_or("X").to_string())
        .collect::<Vec<_>>()
        .join(",")
}
