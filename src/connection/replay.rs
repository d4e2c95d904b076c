//! Replay connection for capture files

use std::path::Path;

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::driver::{DecodedPacket, Driver, DriverSummary};
use crate::providers::replay::ReplayProvider;
use crate::{Result, TrackerError};

/// Replay connection from a capture file
///
/// Packets pass through the same decode and echo path as a live tracker,
/// paced at `replay_rate_hz`.
pub struct ReplayConnection {
    /// Decoded packet receiver
    packets: ReceiverStream<DecodedPacket>,

    /// Driver task, taken by `finish`
    driver: Option<JoinHandle<DriverSummary>>,

    /// Packets in the capture
    total: usize,

    /// Cancellation token for stopping the driver
    cancel: CancellationToken,
}

impl ReplayConnection {
    /// Open a capture file for replay.
    pub async fn open<P: AsRef<Path>>(path: P, config: &ServerConfig) -> Result<Self> {
        let path = path.as_ref();
        config.validate()?;
        info!("Opening capture file: {}", path.display());

        let provider = ReplayProvider::open(path, config.replay_interval()?).await?;
        Ok(Self::from_provider(provider, config))
    }

    /// Start replaying an already loaded capture.
    pub fn from_provider(provider: ReplayProvider, config: &ServerConfig) -> Self {
        let total = provider.total_packets();
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let cancel = CancellationToken::new();
        let driver = Driver::spawn(provider, tx, config.echo_policy(), cancel.clone());

        info!(packets = total, rate_hz = config.replay_rate_hz, "Replay started");
        Self { packets: ReceiverStream::new(rx), driver: Some(driver), total, cancel }
    }

    /// Packets in the capture
    pub fn total_packets(&self) -> usize {
        self.total
    }

    /// Wait for the next decoded packet.
    ///
    /// Returns `None` at the end of the capture.
    pub async fn recv(&mut self) -> Option<DecodedPacket> {
        self.packets.as_mut().recv().await
    }

    /// Decoded packets as a stream
    pub fn packets(&mut self) -> impl Stream<Item = DecodedPacket> + Unpin + '_ {
        &mut self.packets
    }

    /// Stop the replay early
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait for the replay to end and return its counters.
    ///
    /// Packets not yet received are drained and discarded.
    pub async fn finish(mut self) -> Result<DriverSummary> {
        while self.packets.as_mut().recv().await.is_some() {}

        let driver = self.driver.take().ok_or(TrackerError::ChannelClosed)?;
        driver.await.map_err(|e| {
            TrackerError::connection_failed_with_source("replay task failed", Box::new(e))
        })
    }
}

impl Drop for ReplayConnection {
    fn drop(&mut self) {
        debug!("Dropping replay connection");
        self.cancel.cancel();
    }
}
