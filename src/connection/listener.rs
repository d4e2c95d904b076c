//! TCP listener serving connected trackers

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::Stream;
use tokio::net::TcpListener;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::PacketCodec;
use crate::config::ServerConfig;
use crate::driver::{DecodedPacket, Driver, DriverSummary};
use crate::providers::tcp::TcpProvider;
use crate::{Result, TrackerError};

/// Pause after a failed accept before trying again
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Listening server fanning every tracker connection into one packet queue
pub struct TelemetryServer {
    /// Address actually bound (resolves port 0)
    local_addr: SocketAddr,

    /// Decoded packets from all connections
    packets: ReceiverStream<DecodedPacket>,

    /// Trackers currently being served
    active: Arc<AtomicUsize>,

    /// Cancellation token for the accept loop and every driver
    cancel: CancellationToken,
}

impl TelemetryServer {
    /// Bind the configured address and start accepting trackers.
    ///
    /// At most `max_connections` trackers are served at once; further
    /// connections wait in the listen backlog until a slot frees up.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(config.bind_address.as_str()).await.map_err(|e| {
            TrackerError::connection_failed_with_source(
                format!("failed to bind {}", config.bind_address),
                Box::new(e),
            )
        })?;
        let local_addr =
            listener.local_addr().map_err(|e| TrackerError::io_error("reading bound address", e))?;

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let active = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        info!(
            addr = %local_addr,
            framing = ?config.framing,
            max_connections = config.max_connections,
            "Listening for trackers"
        );

        tokio::spawn(accept_loop(listener, config, tx, Arc::clone(&active), cancel.clone()));

        Ok(Self { local_addr, packets: ReceiverStream::new(rx), active, cancel })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Trackers currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Wait for the next decoded packet from any tracker.
    ///
    /// Returns `None` once the server has shut down and the queue is drained.
    pub async fn recv(&mut self) -> Option<DecodedPacket> {
        self.packets.as_mut().recv().await
    }

    /// Decoded packets as a stream
    pub fn packets(&mut self) -> impl Stream<Item = DecodedPacket> + Unpin + '_ {
        &mut self.packets
    }

    /// Stop accepting and close every tracker connection
    pub fn shutdown(&self) {
        info!(addr = %self.local_addr, "Shutting down listener");
        self.cancel.cancel();
    }

    /// Token cancelled when the server shuts down
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for TelemetryServer {
    fn drop(&mut self) {
        debug!("Dropping telemetry server");
        self.cancel.cancel();
    }
}

async fn accept_loop(
    listener: TcpListener,
    config: ServerConfig,
    sink: mpsc::Sender<DecodedPacket>,
    active: Arc<AtomicUsize>,
    cancel: CancellationToken,
) {
    let echo = config.echo_policy();
    let slots = Arc::new(Semaphore::new(config.max_connections));

    loop {
        // Hold a slot before accepting so excess trackers stay in the backlog
        let permit = tokio::select! {
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&slots).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let accepted = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer)) => {
                let connected = active.fetch_add(1, Ordering::Relaxed) + 1;
                info!(peer = %peer, connected, "Tracker connected");
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(peer = %peer, "Failed to set TCP_NODELAY: {}", e);
                }
                let provider = TcpProvider::new(stream, peer, PacketCodec::from_config(&config));
                let driver = Driver::spawn(provider, sink.clone(), echo, cancel.child_token());
                tokio::spawn(release_on_exit(peer, driver, permit, Arc::clone(&active)));
            }
            Err(e) => {
                drop(permit);
                warn!("Accept failed: {}", e);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                }
            }
        }
    }

    debug!("Accept loop ended");
}

/// Hold a connection slot until the tracker's driver finishes.
async fn release_on_exit(
    peer: SocketAddr,
    driver: JoinHandle<DriverSummary>,
    permit: OwnedSemaphorePermit,
    active: Arc<AtomicUsize>,
) {
    match driver.await {
        Ok(summary) => info!(
            peer = %peer,
            packets = summary.packets,
            echoed = summary.echoed,
            "Tracker disconnected"
        ),
        Err(e) => warn!(peer = %peer, "Driver task failed: {}", e),
    }
    active.fetch_sub(1, Ordering::Relaxed);
    drop(permit);
}
