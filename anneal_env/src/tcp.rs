//! Multi-process transport over TCP.

use async_trait::async_trait;
use crate::error::EnvError;
use crate::frame::{read_frame, write_frame};
use crate::network::{ensure_in_ring, RingTransport};
use crate::types::{Envelope, Rank};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Connection settings for a TCP ring.
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Attempts to reach a lower-ranked peer that may still be starting
    pub connect_attempts: u32,

    /// Pause between connect attempts
    pub retry_delay: Duration,

    /// Envelopes buffered per source before the reader stops draining its socket
    pub inbox_capacity: usize,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            connect_attempts: 100,
            retry_delay: Duration::from_millis(100),
            inbox_capacity: 64,
        }
    }
}

/// Transport for one rank of a ring whose ranks live in separate processes.
///
/// Each pair of distinct ranks shares one socket: the higher rank connects,
/// the lower rank accepts, and the connector announces its rank in a 4-byte
/// big-endian handshake. A reader task per socket demultiplexes incoming
/// frames into a per-source inbox. Sends to self go through a loopback
/// channel.
pub struct TcpTransport {
    /// This rank
    rank: Rank,

    /// Write halves indexed by destination (`None` at our own index)
    writers: Vec<Option<Mutex<OwnedWriteHalf>>>,

    /// Self-sends
    loopback: mpsc::Sender<Envelope>,

    /// Receivers indexed by source rank
    inboxes: Vec<Mutex<mpsc::Receiver<Envelope>>>,

    /// Socket reader tasks
    readers: Vec<JoinHandle<()>>,
}

impl TcpTransport {
    /// Binds `peers[rank]` and connects the full mesh.
    pub async fn connect(
        rank: Rank,
        peers: &[SocketAddr],
        config: &TcpConfig,
    ) -> Result<Self, EnvError> {
        ensure_in_ring(rank, peers.len())?;
        let listener = TcpListener::bind(peers[rank.index()]).await?;
        Self::establish(rank, listener, peers, config).await
    }

    /// Connects the full mesh using an already-bound listener for this rank.
    pub async fn establish(
        rank: Rank,
        listener: TcpListener,
        peers: &[SocketAddr],
        config: &TcpConfig,
    ) -> Result<Self, EnvError> {
        let size = peers.len();
        ensure_in_ring(rank, size)?;

        let mut streams: Vec<Option<TcpStream>> = (0..size).map(|_| None).collect();

        for (peer, addr) in peers.iter().enumerate().take(rank.index()) {
            let mut stream = connect_with_retry(*addr, config).await?;
            stream.set_nodelay(true)?;
            stream.write_all(&(rank.index() as u32).to_be_bytes()).await?;
            debug!(rank = rank.index(), peer, "connected");
            streams[peer] = Some(stream);
        }

        for _ in rank.index() + 1..size {
            let (mut stream, addr) = listener.accept().await?;
            let mut handshake = [0u8; 4];
            stream.read_exact(&mut handshake).await?;
            let peer = u32::from_be_bytes(handshake) as usize;
            if peer <= rank.index() || peer >= size || streams[peer].is_some() {
                return Err(EnvError::Connect(format!(
                    "unexpected handshake from {} claiming rank {}",
                    addr, peer
                )));
            }
            stream.set_nodelay(true)?;
            debug!(rank = rank.index(), peer, "accepted");
            streams[peer] = Some(stream);
        }

        let capacity = config.inbox_capacity.max(1);
        let mut writers = Vec::with_capacity(size);
        let mut inboxes = Vec::with_capacity(size);
        let mut readers = Vec::new();
        let mut loopback = None;

        for (peer, stream) in streams.into_iter().enumerate() {
            let (tx, rx) = mpsc::channel(capacity);
            inboxes.push(Mutex::new(rx));

            match stream {
                Some(stream) => {
                    let (mut read_half, write_half) = stream.into_split();
                    writers.push(Some(Mutex::new(write_half)));
                    readers.push(tokio::spawn(async move {
                        loop {
                            match read_frame(&mut read_half).await {
                                Ok(Some(envelope)) => {
                                    if tx.send(envelope).await.is_err() {
                                        break;
                                    }
                                }
                                Ok(None) => {
                                    debug!(peer, "peer closed connection");
                                    break;
                                }
                                Err(e) => {
                                    warn!(peer, "dropping link: {}", e);
                                    break;
                                }
                            }
                        }
                    }));
                }
                None => {
                    writers.push(None);
                    loopback = Some(tx);
                }
            }
        }

        let loopback = loopback
            .ok_or_else(|| EnvError::Connect("no loopback slot for own rank".to_string()))?;

        Ok(Self {
            rank,
            writers,
            loopback,
            inboxes,
            readers,
        })
    }
}

async fn connect_with_retry(addr: SocketAddr, config: &TcpConfig) -> Result<TcpStream, EnvError> {
    let attempts = config.connect_attempts.max(1);
    let mut last_error = None;
    for attempt in 1..=attempts {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!(%addr, attempt, "connect failed: {}", e);
                last_error = Some(e);
                tokio::time::sleep(config.retry_delay).await;
            }
        }
    }
    Err(EnvError::Connect(format!(
        "{} unreachable after {} attempts: {}",
        addr,
        attempts,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        for reader in &self.readers {
            reader.abort();
        }
    }
}

#[async_trait]
impl RingTransport for TcpTransport {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.writers.len()
    }

    async fn send(&self, to: Rank, envelope: Envelope) -> Result<(), EnvError> {
        ensure_in_ring(to, self.size())?;
        match &self.writers[to.index()] {
            Some(writer) => {
                let mut writer = writer.lock().await;
                write_frame(&mut *writer, &envelope).await.map_err(|e| match e {
                    EnvError::Io(_) => EnvError::PeerClosed(to),
                    other => other,
                })
            }
            None => self
                .loopback
                .send(envelope)
                .await
                .map_err(|_| EnvError::PeerClosed(to)),
        }
    }

    async fn recv(&self, from: Rank) -> Result<Envelope, EnvError> {
        ensure_in_ring(from, self.size())?;
        let mut rx = self.inboxes[from.index()].lock().await;
        rx.recv().await.ok_or(EnvError::PeerClosed(from))
    }
}
