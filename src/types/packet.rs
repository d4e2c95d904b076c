//! Raw packet type flowing from providers to the decoder

use std::borrow::Cow;
use std::sync::Arc;

/// Raw tracker packet as received from a provider.
///
/// The bytes are kept verbatim so header-only packets can be echoed back to
/// the sender exactly as they arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    /// Packet bytes (cheap to clone via Arc)
    pub bytes: Arc<[u8]>,

    /// Per-source packet counter, starting at 1
    pub sequence: u64,

    /// Source label, e.g. the peer address or `replay:<path>`
    pub source: Arc<str>,
}

impl RawPacket {
    /// Create a new raw packet
    pub fn new(bytes: impl Into<Arc<[u8]>>, sequence: u64, source: Arc<str>) -> Self {
        Self { bytes: bytes.into(), sequence, source }
    }

    /// Packet text for the decoder.
    ///
    /// Invalid UTF-8 sequences become U+FFFD and one trailing `\n` or `\r\n`
    /// is removed.
    pub fn text(&self) -> Cow<'_, str> {
        let mut bytes: &[u8] = &self.bytes;
        if let Some(rest) = bytes.strip_suffix(b"\n") {
            bytes = rest.strip_suffix(b"\r").unwrap_or(rest);
        }
        String::from_utf8_lossy(bytes)
    }

    /// Number of bytes in the packet
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the packet carries no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(bytes: &[u8]) -> RawPacket {
        RawPacket::new(bytes.to_vec(), 1, Arc::from("test"))
    }

    #[test]
    fn text_strips_one_line_terminator() {
        assert_eq!(packet(b"$TRK,S\r\n").text(), "$TRK,S");
        assert_eq!(packet(b"$TRK,S\n").text(), "$TRK,S");
        assert_eq!(packet(b"$TRK,S\n\n").text(), "$TRK,S\n");
        assert_eq!(packet(b"$TRK,S\r").text(), "$TRK,S\r");
    }

    #[test]
    fn text_replaces_invalid_utf8() {
        let text = packet(b"$TR\xffK,S").text().into_owned();
        assert_eq!(text, "$TR\u{FFFD}K,S");
    }

    #[test]
    fn clones_share_bytes() {
        let original = packet(b"$TRK");
        let cloned = original.clone();
        assert!(Arc::ptr_eq(&original.bytes, &cloned.bytes));
        assert_eq!(cloned.len(), 4);
        assert!(!cloned.is_empty());
    }
}
