//! Listener configuration.
//!
//! Configuration is a YAML document; every field is optional and falls back
//! to the defaults below, which reproduce the behavior of the vendor's
//! single-client listener.
//!
//! ```yaml
//! bind_address: 0.0.0.0:8000
//! framing: chunk
//! read_buffer_size: 1024
//! max_line_length: 1024
//! queue_capacity: 256
//! max_connections: 1
//! echo_header_only: true
//! echo_truncated: false
//! replay_rate_hz: 10
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Result, TrackerError};

/// How a TCP byte stream is split into packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FramingMode {
    /// Every socket read is one packet
    #[default]
    Chunk,
    /// Packets are terminated by `\n` (an optional preceding `\r` is dropped)
    Line,
}

/// Configuration for the telemetry server and replay connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub bind_address: String,
    /// Packet framing on TCP connections
    pub framing: FramingMode,
    /// Largest packet produced by one read in chunk framing
    pub read_buffer_size: usize,
    /// Longest accepted line in line framing
    pub max_line_length: usize,
    /// Capacity of the decoded packet queue shared by all connections
    pub queue_capacity: usize,
    /// Trackers served at once; further connections wait in the accept backlog
    pub max_connections: usize,
    /// Echo header-only packets back to the tracker
    pub echo_header_only: bool,
    /// Echo truncated packets back to the tracker
    pub echo_truncated: bool,
    /// Packets per second when replaying a capture file
    pub replay_rate_hz: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            framing: FramingMode::Chunk,
            read_buffer_size: 1024,
            max_line_length: 1024,
            queue_capacity: 256,
            max_connections: 1,
            echo_header_only: true,
            echo_truncated: false,
            replay_rate_hz: 10.0,
        }
    }
}

impl ServerConfig {
    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ServerConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| TrackerError::file_error(path.to_path_buf(), e))?;
        debug!(path = %path.display(), bytes = yaml.len(), "Loaded configuration file");
        Self::from_yaml_str(&yaml).map_err(|e| match e {
            TrackerError::Config { details, source } => TrackerError::Config {
                details: format!("{}: {}", path.display(), details),
                source,
            },
            other => other,
        })
    }

    /// Reject values that would stall or break the listener.
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.trim().is_empty() {
            return Err(TrackerError::config_error("bind_address must not be empty"));
        }
        let sizes = [
            ("read_buffer_size", self.read_buffer_size),
            ("max_line_length", self.max_line_length),
            ("queue_capacity", self.queue_capacity),
            ("max_connections", self.max_connections),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(TrackerError::config_error(format!("{name} must be greater than zero")));
            }
        }
        self.replay_interval()?;
        Ok(())
    }

    /// Delay between packets when replaying a capture.
    ///
    /// Fails unless `replay_rate_hz` is positive and gives a nonzero,
    /// representable interval.
    pub fn replay_interval(&self) -> Result<Duration> {
        let rate = self.replay_rate_hz;
        (rate.is_finite() && rate > 0.0)
            .then(|| Duration::try_from_secs_f64(1.0 / rate).ok())
            .flatten()
            .filter(|interval| !interval.is_zero())
            .ok_or_else(|| {
                TrackerError::config_error(format!(
                    "replay_rate_hz must be a positive number, got {rate}"
                ))
            })
    }

    /// Echo policy derived from this configuration.
    pub fn echo_policy(&self) -> EchoPolicy {
        EchoPolicy { header_only: self.echo_header_only, truncated: self.echo_truncated }
    }
}

/// Which short packets are echoed back to their sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoPolicy {
    pub header_only: bool,
    pub truncated: bool,
}

impl Default for EchoPolicy {
    fn default() -> Self {
        Self { header_only: true, truncated: false }
    }
}
