//! Decode outcome

use serde::{Deserialize, Serialize};

use super::TelemetryRecord;
use crate::{Result, TrackerError};

/// Result of decoding one packet.
///
/// Short packets are an expected part of the protocol (keep-alives carry only
/// a header), so they are outcomes rather than errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecodeOutcome {
    /// At least 19 fields; every positional field was extracted
    Full(TelemetryRecord),

    /// 15 fields or fewer. The caller should echo the raw packet back.
    HeaderOnly { protocol_header: String },

    /// 16 to 18 fields: past the header-only threshold but missing trailing fields
    Truncated { protocol_header: String, token_count: usize },
}

impl DecodeOutcome {
    /// Protocol header of the packet, whatever its outcome.
    pub fn protocol_header(&self) -> &str {
        match self {
            DecodeOutcome::Full(record) => &record.protocol_header,
            DecodeOutcome::HeaderOnly { protocol_header }
            | DecodeOutcome::Truncated { protocol_header, .. } => protocol_header,
        }
    }

    /// Whether the raw packet should be sent back to its sender.
    pub fn should_echo(&self) -> bool {
        matches!(self, DecodeOutcome::HeaderOnly { .. })
    }

    pub fn is_full(&self) -> bool {
        matches!(self, DecodeOutcome::Full(_))
    }

    pub fn record(&self) -> Option<&TelemetryRecord> {
        match self {
            DecodeOutcome::Full(record) => Some(record),
            _ => None,
        }
    }

    /// Convert into a record, turning short packets into errors.
    pub fn into_record(self) -> Result<TelemetryRecord> {
        match self {
            DecodeOutcome::Full(record) => Ok(record),
            DecodeOutcome::HeaderOnly { protocol_header } => {
                Err(TrackerError::HeaderOnlyPacket { protocol_header })
            }
            DecodeOutcome::Truncated { protocol_header, token_count } => {
                Err(TrackerError::TruncatedPacket { protocol_header, token_count })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_only_requests_echo() {
        let outcome = DecodeOutcome::HeaderOnly { protocol_header: "$TRK".to_string() };
        assert!(outcome.should_echo());
        assert!(!outcome.is_full());
        assert_eq!(outcome.protocol_header(), "$TRK");
        assert!(outcome.record().is_none());
    }

    #[test]
    fn truncated_converts_to_error() {
        let outcome =
            DecodeOutcome::Truncated { protocol_header: "$TRK".to_string(), token_count: 17 };
        assert!(!outcome.should_echo());
        match outcome.into_record() {
            Err(TrackerError::TruncatedPacket { protocol_header, token_count }) => {
                assert_eq!(protocol_header, "$TRK");
                assert_eq!(token_count, 17);
            }
            other => panic!("Expected TruncatedPacket, got {other:?}"),
        }
    }

    #[test]
    fn header_only_converts_to_error() {
        let outcome = DecodeOutcome::HeaderOnly { protocol_header: String::new() };
        assert!(matches!(outcome.into_record(), Err(TrackerError::HeaderOnlyPacket { .. })));
    }
}
