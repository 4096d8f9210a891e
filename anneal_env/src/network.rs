//! Ring transport abstraction for automaton workers.

use async_trait::async_trait;
use crate::error::EnvError;
use crate::types::{Envelope, MessageTag, Rank};
use tracing::trace;

/// Abstraction for blocking point-to-point message passing between ranks.
///
/// # Implementations
///
/// - **In-process**: `MemoryTransport` - one bounded channel per ordered rank pair
/// - **Multi-process**: `TcpTransport` - one socket per rank pair, framed
///
/// # Matching
///
/// Receives are addressed by source rank, and envelopes between one ordered
/// pair of ranks arrive in the order they were sent. A send on `a -> b`
/// therefore matches exactly the next `recv(a)` issued by `b`:
///
/// ```text
/// rank r                       rank r+1
///   |-- send(r+1, bottom) ------->|
///   |                             |-- recv(r) -> top halo
/// ```
#[async_trait]
pub trait RingTransport: Send + Sync + 'static {
    /// Returns this worker's rank.
    fn rank(&self) -> Rank;

    /// Returns the number of ranks in the ring.
    fn size(&self) -> usize;

    /// Sends an envelope to `to`.
    ///
    /// Completes once the envelope is handed to the transport; blocks while
    /// the link to `to` is full.
    ///
    /// # Returns
    /// * `Err(EnvError::PeerClosed)` - the destination is gone
    async fn send(&self, to: Rank, envelope: Envelope) -> Result<(), EnvError>;

    /// Receives the next envelope sent by `from`.
    ///
    /// Blocks until one arrives. There is no timeout: a peer that never
    /// sends stalls the caller, a peer that dies fails it with `PeerClosed`.
    async fn recv(&self, from: Rank) -> Result<Envelope, EnvError>;

    /// Receives the next envelope from `from` and checks its protocol step.
    async fn recv_tagged(&self, from: Rank, expected: MessageTag) -> Result<Vec<u8>, EnvError> {
        let envelope = self.recv(from).await?;
        if envelope.tag != expected {
            return Err(EnvError::UnexpectedTag {
                from,
                expected,
                got: envelope.tag,
            });
        }
        Ok(envelope.payload)
    }

    /// Blocks until every rank has entered the barrier.
    ///
    /// Non-coordinators check in with rank 0, which releases everyone once
    /// all have arrived.
    async fn barrier(&self) -> Result<(), EnvError> {
        let me = self.rank();
        if me.is_coordinator() {
            for peer in 1..self.size() {
                self.recv_tagged(Rank(peer), MessageTag::Barrier).await?;
            }
            for peer in 1..self.size() {
                self.send(Rank(peer), Envelope::control(MessageTag::Barrier)).await?;
            }
        } else {
            self.send(Rank::COORDINATOR, Envelope::control(MessageTag::Barrier))
                .await?;
            self.recv_tagged(Rank::COORDINATOR, MessageTag::Barrier).await?;
        }
        trace!(rank = me.index(), "left barrier");
        Ok(())
    }
}

/// Checks that `rank` addresses a member of a ring of `size`.
pub fn ensure_in_ring(rank: Rank, size: usize) -> Result<(), EnvError> {
    if rank.index() < size {
        Ok(())
    } else {
        Err(EnvError::RankOutOfRange { rank, size })
    }
}
