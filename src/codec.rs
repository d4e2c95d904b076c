//! Packet framing for TCP byte streams

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::config::{FramingMode, ServerConfig};
use crate::{Result, TrackerError};

/// Splits a tracker byte stream into raw packets.
///
/// In [`FramingMode::Chunk`] whatever bytes one read delivered (up to
/// `max_chunk` bytes) form a packet. In [`FramingMode::Line`] packets end at
/// `\n`; the terminator stays on the packet so echoes are byte-exact.
#[derive(Debug, Clone)]
pub struct PacketCodec {
    mode: FramingMode,
    max_chunk: usize,
    max_line_length: usize,
    /// Bytes already scanned for a newline in line mode
    scanned: usize,
}

impl PacketCodec {
    pub fn new(mode: FramingMode, max_chunk: usize, max_line_length: usize) -> Self {
        Self { mode, max_chunk, max_line_length, scanned: 0 }
    }

    pub fn chunked(max_chunk: usize) -> Self {
        Self::new(FramingMode::Chunk, max_chunk, max_chunk)
    }

    pub fn lines(max_line_length: usize) -> Self {
        Self::new(FramingMode::Line, max_line_length, max_line_length)
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.framing, config.read_buffer_size, config.max_line_length)
    }

    fn decode_chunk(&mut self, src: &mut BytesMut) -> Option<Bytes> {
        if src.is_empty() {
            return None;
        }
        let len = src.len().min(self.max_chunk);
        Some(src.split_to(len).freeze())
    }

    fn decode_line(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        match src[self.scanned..].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                let end = self.scanned + offset + 1;
                self.scanned = 0;
                // Length limit excludes the terminator
                let content_len = if end >= 2 && src[end - 2] == b'\r' { end - 2 } else { end - 1 };
                if content_len > self.max_line_length {
                    return Err(TrackerError::framing_error(format!(
                        "line of {} bytes exceeds limit of {}",
                        content_len, self.max_line_length
                    )));
                }
                Ok(Some(src.split_to(end).freeze()))
            }
            None => {
                self.scanned = src.len();
                if src.len() > self.max_line_length + 1 {
                    return Err(TrackerError::framing_error(format!(
                        "no line terminator within {} bytes",
                        self.max_line_length
                    )));
                }
                Ok(None)
            }
        }
    }
}

impl Decoder for PacketCodec {
    type Item = Bytes;
    type Error = TrackerError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        match self.mode {
            FramingMode::Chunk => Ok(self.decode_chunk(src)),
            FramingMode::Line => self.decode_line(src),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        if let Some(packet) = self.decode(src)? {
            return Ok(Some(packet));
        }
        // An unterminated final line is still a packet
        self.scanned = 0;
        Ok(self.decode_chunk(src))
    }
}
