//! Replay provider for packet capture files

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::provider::Provider;
use crate::types::RawPacket;
use crate::{Result, TrackerError};

/// Replay provider that feeds a capture file one line per packet.
///
/// Blank lines are skipped. Packets are paced at a fixed rate so downstream
/// consumers see the same flow they would from a live tracker.
pub struct ReplayProvider {
    /// Remaining packets, terminators removed
    pending: VecDeque<Vec<u8>>,

    /// Packet pacing interval
    interval: Interval,

    /// Packets emitted so far
    sequence: u64,

    /// Total packets in the capture
    total: usize,

    /// Source label
    label: Arc<str>,
}

impl ReplayProvider {
    /// Load a capture file.
    pub async fn open<P: AsRef<Path>>(path: P, pace: Duration) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read(path)
            .await
            .map_err(|e| TrackerError::file_error(path.to_path_buf(), e))?;
        let label = format!("replay:{}", path.display());
        let provider = Self::from_bytes(&contents, pace, label)?;
        info!(path = %path.display(), packets = provider.total, ?pace, "Opened capture file");
        Ok(provider)
    }

    /// Build a provider from in-memory capture contents.
    ///
    /// `pace` is the delay between packets and must be nonzero.
    pub fn from_bytes(contents: &[u8], pace: Duration, label: impl Into<Arc<str>>) -> Result<Self> {
        if pace.is_zero() {
            return Err(TrackerError::config_error("replay interval must be greater than zero"));
        }

        let pending: VecDeque<Vec<u8>> = contents
            .split(|b| *b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
            .map(<[u8]>::to_vec)
            .collect();
        let total = pending.len();

        let mut interval = interval(pace);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(Self { pending, interval, sequence: 0, total, label: label.into() })
    }

    /// Total packets in the capture
    pub fn total_packets(&self) -> usize {
        self.total
    }
}

#[async_trait::async_trait]
impl Provider for ReplayProvider {
    async fn next_packet(&mut self) -> Result<Option<RawPacket>> {
        let Some(bytes) = self.pending.pop_front() else {
            debug!(source = %self.label, packets = self.sequence, "Reached end of capture");
            return Ok(None);
        };

        self.interval.tick().await;
        self.sequence += 1;
        trace!(source = %self.label, sequence = self.sequence, total = self.total, "Replaying packet");
        Ok(Some(RawPacket::new(bytes, self.sequence, Arc::clone(&self.label))))
    }

    async fn echo(&mut self, packet: &RawPacket) -> Result<()> {
        trace!(source = %self.label, sequence = packet.sequence, "Echo discarded during replay");
        Ok(())
    }

    fn source(&self) -> &str {
        &self.label
    }
}
