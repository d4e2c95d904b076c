//! Error types for the tracker listener.
//!
//! Decoding itself never fails: malformed numeric sub-fields degrade to absent
//! values and short packets are reported through [`DecodeOutcome`](crate::DecodeOutcome).
//! The errors here cover everything around the decoder: sockets, capture
//! files, configuration, framing and the decoded-packet queue.
//!
//! ## Error Categories
//!
//! - **Connection Errors**: binding, accepting, or talking to a tracker
//! - **I/O and File Errors**: socket reads/writes and capture file access
//! - **Config Errors**: unreadable or invalid YAML configuration
//! - **Framing Errors**: byte streams that cannot be split into packets
//! - **Packet Errors**: header-only or truncated packets when a full record was required
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use tracklink::TrackerError;
//!
//! let error = TrackerError::connection_failed("tracker reset the connection");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for tracker operations.
pub type Result<T, E = TrackerError> = std::result::Result<T, E>;

/// Main error type for tracker operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TrackerError {
    #[error("Tracker connection failed: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error during {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Capture file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {details}")]
    Config {
        details: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Framing error: {details}")]
    Framing { details: String },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Decoded packet queue closed")]
    ChannelClosed,

    #[error("Packet '{protocol_header}' carries only a protocol header")]
    HeaderOnlyPacket { protocol_header: String },

    #[error("Packet '{protocol_header}' truncated: {token_count} fields, 19 required")]
    TruncatedPacket { protocol_header: String, token_count: usize },
}

impl TrackerError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TrackerError::Connection { .. } => true,
            TrackerError::Timeout { .. } => true,
            TrackerError::Io { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            TrackerError::File { .. } => false,
            TrackerError::Config { .. } => false,
            TrackerError::Framing { .. } => false,
            TrackerError::ChannelClosed => false,
            TrackerError::HeaderOnlyPacket { .. } => false,
            TrackerError::TruncatedPacket { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TrackerError::Connection { .. } => vec![
                "Check that the bind address is free",
                "Verify the tracker is configured with this server's address and port",
                "Check firewall rules for the listening port",
            ],
            TrackerError::Io { .. } => vec![
                "Check network connectivity to the tracker",
                "Wait for the tracker to reconnect",
            ],
            TrackerError::File { .. } => vec![
                "Check file exists and is readable",
                "Verify the capture holds one packet per line",
            ],
            TrackerError::Config { .. } => vec![
                "Check YAML syntax of the configuration file",
                "Compare field names against the documented defaults",
                "Ensure sizes and capacities are greater than zero",
            ],
            TrackerError::Framing { .. } => vec![
                "Switch framing mode if the tracker does not send newlines",
                "Increase max_line_length for long packets",
            ],
            TrackerError::Timeout { .. } => vec![
                "Increase timeout duration",
                "Verify the tracker is sending data",
            ],
            TrackerError::ChannelClosed => vec![
                "Keep the packet consumer alive while the server runs",
            ],
            TrackerError::HeaderOnlyPacket { .. } => vec![
                "Treat header-only packets as keep-alives and echo them back",
            ],
            TrackerError::TruncatedPacket { .. } => vec![
                "Check tracker firmware field configuration",
                "Verify the tracker is not splitting packets across reads",
                "Use line framing if packets arrive in pieces",
            ],
        }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        TrackerError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TrackerError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for I/O errors with operation context.
    pub fn io_error(context: impl Into<String>, source: std::io::Error) -> Self {
        TrackerError::Io { context: context.into(), source }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        TrackerError::File { path, source }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(details: impl Into<String>) -> Self {
        TrackerError::Config { details: details.into(), source: None }
    }

    /// Helper constructor for framing errors.
    pub fn framing_error(details: impl Into<String>) -> Self {
        TrackerError::Framing { details: details.into() }
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        TrackerError::Io { context: "socket operation".to_string(), source: err }
    }
}

impl From<serde_yaml_ng::Error> for TrackerError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        TrackerError::Config { details: err.to_string(), source: Some(Box::new(err)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn error_messages_carry_their_context(
            reason in ".*",
            header in "[A-Z$*]{1,6}",
            token_count in 16usize..19usize,
            details in ".*"
        ) {
            let connection_msg = TrackerError::connection_failed(reason.clone()).to_string();
            prop_assert!(connection_msg.contains(&reason));

            let truncated_msg = TrackerError::TruncatedPacket {
                protocol_header: header.clone(),
                token_count,
            }
            .to_string();
            prop_assert!(truncated_msg.contains(&header));
            prop_assert!(truncated_msg.contains(&token_count.to_string()));

            let framing_msg = TrackerError::framing_error(details.clone()).to_string();
            prop_assert!(framing_msg.contains(&details));
        }

        #[test]
        fn source_chain_preserves_base_message(
            base_message in ".*",
            reasons in prop::collection::vec(".*", 1..4)
        ) {
            let mut current: Box<dyn std::error::Error + Send + Sync> =
                Box::new(std::io::Error::other(base_message.clone()));
            for reason in &reasons {
                current = Box::new(TrackerError::connection_failed_with_source(reason.clone(), current));
            }

            let mut depth = 0;
            let mut found = false;
            let mut next = std::error::Error::source(current.as_ref());
            while let Some(source) = next {
                depth += 1;
                if source.to_string().contains(&base_message) {
                    found = true;
                }
                next = source.source();
            }

            prop_assert_eq!(depth, reasons.len());
            prop_assert!(found, "Base message '{}' not found in chain", base_message);
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<TrackerError>();

        let error = TrackerError::connection_failed("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retry_classification() {
        assert!(TrackerError::connection_failed("reset").is_retryable());
        assert!(TrackerError::Timeout { duration: Duration::from_secs(1) }.is_retryable());
        assert!(!TrackerError::framing_error("line too long").is_retryable());
        assert!(!TrackerError::ChannelClosed.is_retryable());

        let interrupted = std::io::Error::new(std::io::ErrorKind::Interrupted, "signal");
        assert!(TrackerError::io_error("read", interrupted).is_retryable());

        let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(!TrackerError::io_error("read", reset).is_retryable());
    }

    #[test]
    fn every_variant_has_suggestions() {
        let errors = vec![
            TrackerError::connection_failed("x"),
            TrackerError::io_error("read", std::io::Error::other("x")),
            TrackerError::file_error(PathBuf::from("capture.log"), std::io::Error::other("x")),
            TrackerError::config_error("x"),
            TrackerError::framing_error("x"),
            TrackerError::Timeout { duration: Duration::from_millis(5) },
            TrackerError::ChannelClosed,
            TrackerError::HeaderOnlyPacket { protocol_header: "$TRK".to_string() },
            TrackerError::TruncatedPacket { protocol_header: "$TRK".to_string(), token_count: 17 },
        ];

        for error in errors {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty(), "no suggestions for {error}");
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }

    #[test]
    fn from_conversions_work() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        match TrackerError::from(io_err) {
            TrackerError::Io { source, .. } => assert_eq!(source.to_string(), "pipe closed"),
            other => panic!("Expected Io error variant, got {other:?}"),
        }

        let yaml_err = serde_yaml_ng::from_str::<u32>("not: [a number").unwrap_err();
        assert!(matches!(TrackerError::from(yaml_err), TrackerError::Config { source: Some(_), .. }));
    }
}
