//! In-process transport: a full mesh of bounded channels.

use async_trait::async_trait;
use crate::error::EnvError;
use crate::network::{ensure_in_ring, RingTransport};
use crate::types::{Envelope, Rank};
use tokio::sync::{mpsc, Mutex};

/// Default per-link capacity in envelopes.
pub const DEFAULT_LINK_CAPACITY: usize = 16;

/// Channel-backed transport for one rank of an in-process ring.
///
/// Every ordered pair `(from, to)` has its own channel, self-pairs
/// included, so a single-rank ring exchanges halos with itself.
pub struct MemoryTransport {
    /// This rank
    rank: Rank,

    /// Senders indexed by destination rank
    outboxes: Vec<mpsc::Sender<Envelope>>,

    /// Receivers indexed by source rank (behind tokio mutex for async)
    inboxes: Vec<Mutex<mpsc::Receiver<Envelope>>>,
}

impl MemoryTransport {
    /// Builds a mesh of `size` connected transports, one per rank, in rank order.
    pub fn mesh(size: usize, capacity: usize) -> Vec<MemoryTransport> {
        let capacity = capacity.max(1);

        // outboxes[from][to], inboxes[to][from]
        let mut outboxes: Vec<Vec<mpsc::Sender<Envelope>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut inboxes: Vec<Vec<Option<mpsc::Receiver<Envelope>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

        for (from, row) in outboxes.iter_mut().enumerate() {
            for to_inboxes in inboxes.iter_mut() {
                let (tx, rx) = mpsc::channel(capacity);
                row.push(tx);
                to_inboxes[from] = Some(rx);
            }
        }

        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| MemoryTransport {
                rank: Rank(rank),
                outboxes,
                inboxes: inboxes.into_iter().flatten().map(Mutex::new).collect(),
            })
            .collect()
    }
}

#[async_trait]
impl RingTransport for MemoryTransport {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    async fn send(&self, to: Rank, envelope: Envelope) -> Result<(), EnvError> {
        ensure_in_ring(to, self.size())?;
        self.outboxes[to.index()]
            .send(envelope)
            .await
            .map_err(|_| EnvError::PeerClosed(to))
    }

    async fn recv(&self, from: Rank) -> Result<Envelope, EnvError> {
        ensure_in_ring(from, self.size())?;
        let mut rx = self.inboxes[from.index()].lock().await;
        rx.recv().await.ok_or(EnvError::PeerClosed(from))
    }
}
