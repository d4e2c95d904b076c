//! Provider trait for packet sources

use crate::Result;
use crate::types::RawPacket;

/// Trait for tracker packet sources
///
/// Providers abstract over where packets come from (a tracker's TCP
/// connection, a capture file) and handle their own framing and pacing.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Get the next raw packet
    ///
    /// Returns:
    /// - `Ok(Some(packet))` - New packet available
    /// - `Ok(None)` - Source ended (peer closed, end of capture)
    /// - `Err(e)` - Error occurred
    async fn next_packet(&mut self) -> Result<Option<RawPacket>>;

    /// Send a packet's bytes back to where it came from
    ///
    /// Sources without a peer accept and discard the echo.
    async fn echo(&mut self, packet: &RawPacket) -> Result<()>;

    /// Label identifying this source in logs and decoded packets
    fn source(&self) -> &str;
}
