//! Driver spawns and manages per-source decode tasks

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::EchoPolicy;
use crate::decoder::decode;
use crate::provider::Provider;
use crate::types::{DecodeOutcome, RawPacket};

/// Consecutive retryable errors tolerated before a source is abandoned
const MAX_ERRORS: u32 = 10;

/// A raw packet together with how it decoded.
#[derive(Debug, Clone)]
pub struct DecodedPacket {
    pub raw: RawPacket,
    pub outcome: DecodeOutcome,
    /// Whether the raw bytes were sent back to the source
    pub echoed: bool,
}

/// Counters reported when a driver task ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverSummary {
    pub packets: u64,
    pub full: u64,
    pub header_only: u64,
    pub truncated: u64,
    pub echoed: u64,
    pub errors: u64,
}

impl DriverSummary {
    fn count(&mut self, outcome: &DecodeOutcome) {
        self.packets += 1;
        match outcome {
            DecodeOutcome::Full(_) => self.full += 1,
            DecodeOutcome::HeaderOnly { .. } => self.header_only += 1,
            DecodeOutcome::Truncated { .. } => self.truncated += 1,
        }
    }
}

/// Driver runs the read → decode → echo → sink loop for one provider
///
/// Decoded packets are pushed into a bounded queue, so a slow consumer
/// pauses reading from the source instead of buffering without limit.
pub struct Driver;

impl Driver {
    /// Spawn a driver task for the given provider
    ///
    /// The task ends when the source ends, the sink is dropped, `cancel`
    /// fires, or the provider fails with a non-retryable error.
    pub fn spawn<P>(
        provider: P,
        sink: mpsc::Sender<DecodedPacket>,
        echo: EchoPolicy,
        cancel: CancellationToken,
    ) -> JoinHandle<DriverSummary>
    where
        P: Provider,
    {
        tokio::spawn(Self::run(provider, sink, echo, cancel))
    }

    /// Run the driver loop on the current task
    pub async fn run<P>(
        mut provider: P,
        sink: mpsc::Sender<DecodedPacket>,
        echo: EchoPolicy,
        cancel: CancellationToken,
    ) -> DriverSummary
    where
        P: Provider,
    {
        let source = provider.source().to_string();
        info!(source = %source, "Driver started");
        let mut summary = DriverSummary::default();
        let mut error_count = 0u32;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!(source = %source, "Driver cancelled during read");
                    break;
                }
                result = provider.next_packet() => result,
            };

            match result {
                Ok(Some(packet)) => {
                    error_count = 0;
                    let outcome = {
                        let text = packet.text();
                        debug!(source = %source, sequence = packet.sequence, text = %text, "Packet received");
                        decode(&text)
                    };
                    summary.count(&outcome);

                    let wants_echo = match &outcome {
                        DecodeOutcome::Full(record) => {
                            trace!(
                                source = %source,
                                sequence = packet.sequence,
                                header = %record.protocol_header,
                                io_status = ?record.io_status,
                                "Full telemetry packet"
                            );
                            for field in record.malformed_fields() {
                                debug!(source = %source, sequence = packet.sequence, ?field, "Derived field unavailable");
                            }
                            false
                        }
                        DecodeOutcome::HeaderOnly { protocol_header } => {
                            info!(source = %source, header = %protocol_header, "Protocol header only received");
                            echo.header_only
                        }
                        DecodeOutcome::Truncated { protocol_header, token_count } => {
                            warn!(
                                source = %source,
                                header = %protocol_header,
                                token_count,
                                "Truncated packet, trailing fields missing"
                            );
                            echo.truncated
                        }
                    };

                    let mut echoed = false;
                    if wants_echo {
                        match provider.echo(&packet).await {
                            Ok(()) => {
                                echoed = true;
                                summary.echoed += 1;
                            }
                            Err(e) => warn!(source = %source, "Echo failed: {}", e),
                        }
                    }

                    let decoded = DecodedPacket { raw: packet, outcome, echoed };
                    let sent = tokio::select! {
                        _ = cancel.cancelled() => {
                            info!(source = %source, "Driver cancelled while queue was full");
                            break;
                        }
                        sent = sink.send(decoded) => sent,
                    };
                    if sent.is_err() {
                        debug!(source = %source, "Packet receiver dropped, shutting down");
                        break;
                    }
                }
                Ok(None) => {
                    info!(source = %source, packets = summary.packets, "Source ended");
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    summary.errors += 1;

                    if !e.is_retryable() {
                        warn!(source = %source, "Source failed: {}", e);
                        break;
                    }

                    error!(source = %source, "Source error ({}/{}): {}", error_count, MAX_ERRORS, e);
                    if error_count >= MAX_ERRORS {
                        error!(source = %source, "Too many source errors, shutting down");
                        break;
                    }

                    // Exponential backoff: 50ms, 100ms, 200ms, ... capped at 1.6s
                    let backoff = Duration::from_millis(50 << (error_count - 1).min(5));
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        info!(
            source = %source,
            packets = summary.packets,
            full = summary.full,
            header_only = summary.header_only,
            truncated = summary.truncated,
            "Driver ended"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{PacketBuilder, fields_line};
    use crate::{Result, TrackerError};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Scripted provider recording every echo
    struct ScriptedProvider {
        script: VecDeque<Result<Option<RawPacket>>>,
        echoes: Arc<Mutex<Vec<u64>>>,
        sequence: u64,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<Option<RawPacket>>>) -> (Self, Arc<Mutex<Vec<u64>>>) {
            let echoes = Arc::new(Mutex::new(Vec::new()));
            (Self { script: script.into(), echoes: Arc::clone(&echoes), sequence: 0 }, echoes)
        }
    }

    fn packet(line: &str) -> Result<Option<RawPacket>> {
        Ok(Some(RawPacket::new(line.as_bytes().to_vec(), 0, Arc::from("scripted"))))
    }

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        async fn next_packet(&mut self) -> Result<Option<RawPacket>> {
            match self.script.pop_front() {
                Some(Ok(Some(mut packet))) => {
                    self.sequence += 1;
                    packet.sequence = self.sequence;
                    Ok(Some(packet))
                }
                Some(other) => other,
                None => Ok(None),
            }
        }

        async fn echo(&mut self, packet: &RawPacket) -> Result<()> {
            self.echoes.lock().unwrap().push(packet.sequence);
            Ok(())
        }

        fn source(&self) -> &str {
            "scripted"
        }
    }

    async fn drain(mut rx: mpsc::Receiver<DecodedPacket>) -> Vec<DecodedPacket> {
        let mut out = Vec::new();
        while let Some(packet) = rx.recv().await {
            out.push(packet);
        }
        out
    }

    /// Log sink shared with a test subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn raw_packet_text_logged_at_debug() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (provider, _) = ScriptedProvider::new(vec![packet("$TRK,S,42\r\n")]);
        let (tx, rx) = mpsc::channel(4);
        let handle = Driver::spawn(provider, tx, EchoPolicy::default(), CancellationToken::new());
        drain(rx).await;
        handle.await.unwrap();

        let logs = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = logs.lines().find(|line| line.contains("Packet received")).expect("debug line");
        assert!(line.contains("DEBUG"), "{line}");
        assert!(line.contains("text=$TRK,S,42"), "{line}");
        assert!(line.contains("sequence=1"), "{line}");
    }

    #[tokio::test]
    async fn decodes_and_echoes_header_only() {
        let (provider, echoes) = ScriptedProvider::new(vec![
            packet(&PacketBuilder::new().build()),
            packet("$TRK,S\n"),
            packet(&fields_line(17)),
        ]);
        let (tx, rx) = mpsc::channel(8);

        let summary =
            Driver::spawn(provider, tx, EchoPolicy::default(), CancellationToken::new()).await.unwrap();
        let packets = drain(rx).await;

        assert_eq!(packets.len(), 3);
        assert!(packets[0].outcome.is_full());
        assert!(!packets[0].echoed);
        assert!(matches!(packets[1].outcome, DecodeOutcome::HeaderOnly { .. }));
        assert!(packets[1].echoed);
        assert!(matches!(packets[2].outcome, DecodeOutcome::Truncated { token_count: 17, .. }));
        assert!(!packets[2].echoed);

        assert_eq!(*echoes.lock().unwrap(), vec![2]);
        assert_eq!(
            summary,
            DriverSummary { packets: 3, full: 1, header_only: 1, truncated: 1, echoed: 1, errors: 0 }
        );
    }

    #[tokio::test]
    async fn echo_policy_controls_truncated_and_header_only() {
        let (provider, echoes) =
            ScriptedProvider::new(vec![packet("$TRK"), packet(&fields_line(16))]);
        let (tx, rx) = mpsc::channel(8);
        let policy = EchoPolicy { header_only: false, truncated: true };

        let summary = Driver::spawn(provider, tx, policy, CancellationToken::new()).await.unwrap();
        drain(rx).await;

        assert_eq!(*echoes.lock().unwrap(), vec![2]);
        assert_eq!(summary.echoed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_retryable_errors_then_continues() {
        let (provider, _) = ScriptedProvider::new(vec![
            Err(TrackerError::connection_failed("blip")),
            Err(TrackerError::Timeout { duration: Duration::from_millis(10) }),
            packet(&PacketBuilder::new().build()),
        ]);
        let (tx, rx) = mpsc::channel(8);

        let summary =
            Driver::spawn(provider, tx, EchoPolicy::default(), CancellationToken::new()).await.unwrap();
        assert_eq!(drain(rx).await.len(), 1);
        assert_eq!(summary.errors, 2);
        assert_eq!(summary.full, 1);
    }

    #[tokio::test]
    async fn stops_on_non_retryable_error() {
        let (provider, _) = ScriptedProvider::new(vec![
            Err(TrackerError::framing_error("line too long")),
            packet(&PacketBuilder::new().build()),
        ]);
        let (tx, rx) = mpsc::channel(8);

        let summary =
            Driver::spawn(provider, tx, EchoPolicy::default(), CancellationToken::new()).await.unwrap();
        assert!(drain(rx).await.is_empty());
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.packets, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_errors() {
        let script = (0..MAX_ERRORS + 2).map(|_| Err(TrackerError::connection_failed("down"))).collect();
        let (provider, _) = ScriptedProvider::new(script);
        let (tx, _rx) = mpsc::channel(8);

        let summary =
            Driver::spawn(provider, tx, EchoPolicy::default(), CancellationToken::new()).await.unwrap();
        assert_eq!(summary.errors, MAX_ERRORS as u64);
    }

    #[tokio::test]
    async fn stops_when_receiver_dropped() {
        let script = (0..5).map(|_| packet(&PacketBuilder::new().build())).collect();
        let (provider, _) = ScriptedProvider::new(script);
        let (tx, rx) = mpsc::channel(8);
        drop(rx);

        let summary =
            Driver::spawn(provider, tx, EchoPolicy::default(), CancellationToken::new()).await.unwrap();
        assert_eq!(summary.packets, 1);
    }

    #[tokio::test]
    async fn cancellation_unblocks_full_queue() {
        let script = (0..5).map(|_| packet(&PacketBuilder::new().build())).collect();
        let (provider, _) = ScriptedProvider::new(script);
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let handle = Driver::spawn(provider, tx, EchoPolicy::default(), cancel.clone());
        // Queue holds one packet; the driver blocks sending the second
        let first = rx.recv().await.unwrap();
        assert_eq!(first.raw.sequence, 1);
        cancel.cancel();

        let summary = handle.await.unwrap();
        assert!(summary.packets < 5);
    }
}
