//! Decoder and TCP listener for GPS tracker telemetry.
//!
//! Trackers report position, motion, IO state and a handful of analog
//! readings as one delimited text packet per report. Tracklink decodes those
//! packets into typed [`TelemetryRecord`]s and serves trackers over TCP,
//! echoing header-only packets back to their sender.
//!
//! # Features
//!
//! - **Pure decoder**: [`decode`] turns one packet line into a [`DecodeOutcome`]
//! - **Listener**: [`TelemetryServer`] accepts trackers and queues decoded packets
//! - **Replay**: [`ReplayConnection`] feeds a capture file through the same pipeline
//! - **Rendering**: the vendor's text display layout, or YAML
//!
//! ## Example (decode)
//!
//! ```rust
//! use tracklink::{DecodeOutcome, decode};
//!
//! let line = "$TRK,S,2234,5678,11345,6789,0.5,120,150923,0.0,E,A,1.2,45,1000,0001,FF,1000,RF01";
//! match decode(line) {
//!     DecodeOutcome::Full(record) => assert!(record.engine_on()),
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```
//!
//! ## Example (listener)
//!
//! ```rust,no_run
//! use tracklink::{ServerConfig, Tracklink};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> tracklink::Result<()> {
//!     let mut server = Tracklink::listen(ServerConfig::default()).await?;
//!     let mut packets = server.packets();
//!
//!     while let Some(packet) = packets.next().await {
//!         if let Some(record) = packet.outcome.record() {
//!             println!("{record}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Decoding and presentation
pub mod config;
pub mod decoder;
pub mod render;

// Stream-based listener architecture
pub mod codec;
pub mod connection;
pub mod driver;
pub mod provider;
pub mod providers;

// Core exports
pub use error::*;
pub use types::*;

pub use codec::PacketCodec;
pub use config::{EchoPolicy, FramingMode, ServerConfig};
pub use decoder::decode;
pub use driver::{DecodedPacket, DriverSummary};
pub use render::{INVALID_DATA, OutputFormat};

pub use connection::listener::TelemetryServer;
pub use connection::replay::ReplayConnection;

/// Unified entry point for tracker connections.
///
/// Both connection kinds hand out the same [`DecodedPacket`]s, so consumers
/// can switch between a live listener and a capture replay freely.
pub struct Tracklink;

impl Tracklink {
    /// Listen for trackers.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The bind address cannot be bound
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use tracklink::{ServerConfig, Tracklink};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> tracklink::Result<()> {
    /// let server = Tracklink::listen(ServerConfig::default()).await?;
    /// println!("listening on {}", server.local_addr());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn listen(config: ServerConfig) -> Result<TelemetryServer> {
        TelemetryServer::bind(config).await
    }

    /// Replay a capture file with one packet per line.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the file cannot
    /// be read.
    pub async fn replay<P: AsRef<std::path::Path>>(
        path: P,
        config: &ServerConfig,
    ) -> Result<ReplayConnection> {
        ReplayConnection::open(path, config).await
    }
}
