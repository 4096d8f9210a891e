//! Per-rank driver: halo exchange and transition, in strict alternation.

use crate::error::CoreError;
use crate::grid::LocalGrid;
use crate::partition::Assignment;
use crate::rule;
use anneal_env::{Envelope, MessageTag, Rank, RingTransport};
use std::sync::Arc;
use tracing::trace;

/// One rank's partition and the transport to its ring neighbours.
///
/// Holds two buffers: `current` is read-only during a transition and
/// `next` receives the new generation, after which they swap roles.
pub struct Worker<T: RingTransport> {
    transport: Arc<T>,
    assignment: Assignment,
    current: LocalGrid,
    next: LocalGrid,
    generation: u64,
}

impl<T: RingTransport> Worker<T> {
    /// Wraps an already populated partition.
    pub fn new(
        transport: Arc<T>,
        assignment: Assignment,
        initial: LocalGrid,
    ) -> Result<Self, CoreError> {
        let next = LocalGrid::new(initial.width(), initial.rows())?;
        Ok(Self {
            transport,
            assignment,
            current: initial,
            next,
            generation: 0,
        })
    }

    /// Waits for this rank's rows from the coordinator.
    pub async fn receive_initial(
        transport: Arc<T>,
        assignment: Assignment,
        width: usize,
    ) -> Result<Self, CoreError> {
        let mut grid = LocalGrid::new(width, assignment.rows)?;
        let block = transport
            .recv_tagged(Rank::COORDINATOR, MessageTag::Scatter)
            .await?;
        grid.load_authoritative(&block)?;
        trace!(rank = assignment.rank.index(), rows = assignment.rows, "received partition");
        Self::new(transport, assignment, grid)
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// The current generation's partition.
    pub fn grid(&self) -> &LocalGrid {
        &self.current
    }

    /// Generations computed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Refreshes both halo rows from the ring neighbours.
    ///
    /// Guards are synchronised first because rows travel with their guard
    /// columns. Every rank runs the same two phases, so each send is matched
    /// by the neighbour's receive in the same phase:
    ///
    /// 1. bottom row down, top halo from up
    /// 2. top row up, bottom halo from down
    pub async fn exchange_halos(&mut self) -> Result<(), CoreError> {
        let rows = self.current.rows();
        let Assignment { up, down, .. } = self.assignment;

        self.current.sync_columns();

        let bottom = self.current.row(rows).to_vec();
        self.transport
            .send(down, Envelope::new(MessageTag::HaloFromUp, bottom))
            .await?;
        let top_halo = self.transport.recv_tagged(up, MessageTag::HaloFromUp).await?;
        self.current.load_row(0, &top_halo)?;

        let top = self.current.row(1).to_vec();
        self.transport
            .send(up, Envelope::new(MessageTag::HaloFromDown, top))
            .await?;
        let bottom_halo = self.transport.recv_tagged(down, MessageTag::HaloFromDown).await?;
        self.current.load_row(rows + 1, &bottom_halo)?;

        Ok(())
    }

    /// Computes the next generation and swaps buffers.
    pub fn transition(&mut self) {
        rule::step(&self.current, &mut self.next);
        std::mem::swap(&mut self.current, &mut self.next);
        self.generation += 1;
    }

    /// Runs `iterations` rounds of exchange then transition.
    ///
    /// There is no convergence check; the full count always runs.
    pub async fn run(&mut self, iterations: u64) -> Result<(), CoreError> {
        for _ in 0..iterations {
            self.exchange_halos().await?;
            self.transition();
            trace!(rank = self.assignment.rank.index(), generation = self.generation, "step");
        }
        Ok(())
    }

    /// Ships the final rows to the coordinator. Non-coordinators only.
    pub async fn send_final(self) -> Result<(), CoreError> {
        if self.assignment.rank.is_coordinator() {
            return Err(CoreError::CoordinatorSendsFinal(self.assignment.rank));
        }
        let block = self.current.authoritative().to_vec();
        self.transport
            .send(Rank::COORDINATOR, Envelope::new(MessageTag::Gather, block))
            .await?;
        Ok(())
    }
}
