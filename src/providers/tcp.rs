//! TCP provider for a connected tracker

use std::net::SocketAddr;
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::FramedRead;
use tracing::{debug, trace};

use crate::codec::PacketCodec;
use crate::provider::Provider;
use crate::types::RawPacket;
use crate::{Result, TrackerError};

/// Provider reading framed packets from one tracker connection
pub struct TcpProvider {
    /// Framed read half of the socket
    reader: FramedRead<OwnedReadHalf, PacketCodec>,

    /// Write half used for echoes
    writer: OwnedWriteHalf,

    /// Remote tracker address
    peer: SocketAddr,

    /// Source label (peer address as text)
    label: Arc<str>,

    /// Packets read so far
    sequence: u64,
}

impl TcpProvider {
    /// Wrap an accepted connection
    pub fn new(stream: TcpStream, peer: SocketAddr, codec: PacketCodec) -> Self {
        let (read_half, writer) = stream.into_split();
        let reader = FramedRead::new(read_half, codec);
        Self { reader, writer, peer, label: Arc::from(peer.to_string()), sequence: 0 }
    }
}

#[async_trait::async_trait]
impl Provider for TcpProvider {
    async fn next_packet(&mut self) -> Result<Option<RawPacket>> {
        match self.reader.next().await {
            Some(Ok(bytes)) => {
                self.sequence += 1;
                trace!(peer = %self.peer, sequence = self.sequence, bytes = bytes.len(), "Packet read");
                Ok(Some(RawPacket::new(&bytes[..], self.sequence, Arc::clone(&self.label))))
            }
            Some(Err(e)) => Err(e),
            None => {
                debug!(peer = %self.peer, packets = self.sequence, "Tracker closed connection");
                Ok(None)
            }
        }
    }

    async fn echo(&mut self, packet: &RawPacket) -> Result<()> {
        self.writer
            .write_all(&packet.bytes)
            .await
            .map_err(|e| TrackerError::io_error(format!("echo to {}", self.peer), e))?;
        trace!(peer = %self.peer, sequence = packet.sequence, "Packet echoed");
        Ok(())
    }

    fn source(&self) -> &str {
        &self.label
    }
}
