//! Rank-0 aggregation: seeding, scatter, gather and fingerprinting.
//!
//! The [`GlobalGrid`] can only be built by a [`Coordinator`], and a
//! coordinator can only be built on rank 0. Other ranks have no path to the
//! full grid.

use crate::error::{CoreError, GridError};
use crate::fingerprint::Fingerprint;
use crate::grid::{allocate_cells, check_cells, LocalGrid, ALIVE};
use crate::partition::RingLayout;
use crate::source::{random_cell, SeededUniform};
use anneal_env::{Envelope, MessageTag, Rank, RingTransport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// How the coordinator fills the global grid before scatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InitialState {
    /// Every cell independently alive with probability one half.
    Random { seed: u64 },

    /// All dead except the listed `(x, y)` cells, zero-based.
    Alive(Vec<(usize, usize)>),
}

/// The full automaton, all rows in order, guard columns included and no
/// halo rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalGrid {
    width: usize,
    rows: usize,
    cells: Vec<u8>,
}

impl GlobalGrid {
    fn populate(width: usize, rows: usize, initial: &InitialState) -> Result<Self, GridError> {
        let too_large = GridError::Allocation {
            what: "global grid",
            bytes: usize::MAX,
        };
        let stride = width.checked_add(2).ok_or_else(|| too_large.clone())?;
        let len = rows.checked_mul(stride).ok_or(too_large)?;
        let mut grid = Self {
            width,
            rows,
            cells: allocate_cells(len, "global grid")?,
        };

        match initial {
            InitialState::Random { seed } => {
                let mut source = SeededUniform::new(*seed);
                for row in grid.cells.chunks_exact_mut(stride) {
                    for cell in &mut row[1..=width] {
                        *cell = random_cell(&mut source);
                    }
                }
            }
            InitialState::Alive(cells) => {
                for &(x, y) in cells {
                    if x >= width || y >= rows {
                        return Err(GridError::OutOfBounds { x, y, width, rows });
                    }
                    grid.cells[y * stride + x + 1] = ALIVE;
                }
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Cell at zero-based `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[y * (self.width + 2) + x + 1]
    }

    /// `rank`'s rows as one wire block.
    fn partition(&self, layout: &RingLayout, rank: Rank) -> &[u8] {
        let stride = self.width + 2;
        let start = layout.first_row(rank) * stride;
        &self.cells[start..start + layout.rows(rank) * stride]
    }

    fn partition_mut(&mut self, layout: &RingLayout, rank: Rank) -> &mut [u8] {
        let stride = self.width + 2;
        let start = layout.first_row(rank) * stride;
        &mut self.cells[start..start + layout.rows(rank) * stride]
    }

    /// Row-major cell bytes with the guard columns stripped.
    pub fn cell_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.width * self.rows);
        for row in self.cells.chunks_exact(self.width + 2) {
            bytes.extend_from_slice(&row[1..=self.width]);
        }
        bytes
    }

    pub fn alive_count(&self) -> usize {
        self.cells
            .chunks_exact(self.width + 2)
            .map(|row| row[1..=self.width].iter().filter(|&&c| c == ALIVE).count())
            .sum()
    }

    /// Fingerprint of [`GlobalGrid::cell_bytes`].
    pub fn fingerprint<F: Fingerprint + ?Sized>(&self, fingerprint: &F) -> String {
        fingerprint.digest(&self.cell_bytes())
    }
}

/// Rank 0's view of the run.
pub struct Coordinator<T: RingTransport> {
    transport: Arc<T>,
    layout: RingLayout,
    grid: GlobalGrid,
}

impl<T: RingTransport> Coordinator<T> {
    /// Builds and fills the global grid. Fails on any rank but 0.
    pub fn new(
        transport: Arc<T>,
        layout: RingLayout,
        width: usize,
        initial: &InitialState,
    ) -> Result<Self, CoreError> {
        let rank = transport.rank();
        if !rank.is_coordinator() {
            return Err(CoreError::NotCoordinator(rank));
        }
        if transport.size() != layout.workers() {
            return Err(CoreError::RingSize {
                expected: layout.workers(),
                actual: transport.size(),
            });
        }
        let grid = GlobalGrid::populate(width, layout.total_rows(), initial)?;
        Ok(Self {
            transport,
            layout,
            grid,
        })
    }

    pub fn grid(&self) -> &GlobalGrid {
        &self.grid
    }

    /// Sends every other rank its rows and returns rank 0's own partition.
    pub async fn scatter(&self) -> Result<LocalGrid, CoreError> {
        for rank in self.layout.ranks().skip(1) {
            let block = self.grid.partition(&self.layout, rank).to_vec();
            debug!(to = rank.index(), bytes = block.len(), "scatter");
            self.transport
                .send(rank, Envelope::new(MessageTag::Scatter, block))
                .await?;
        }

        let mut own = LocalGrid::new(self.grid.width, self.layout.rows(Rank::COORDINATOR))?;
        own.load_authoritative(self.grid.partition(&self.layout, Rank::COORDINATOR))?;
        Ok(own)
    }

    /// Collects every rank's final rows, in rank order, into the global grid.
    pub async fn gather(&mut self, own: &LocalGrid) -> Result<&GlobalGrid, CoreError> {
        let layout = self.layout;
        self.grid
            .partition_mut(&layout, Rank::COORDINATOR)
            .copy_from_slice(own.authoritative());

        for rank in layout.ranks().skip(1) {
            let block = self.transport.recv_tagged(rank, MessageTag::Gather).await?;
            let slot = self.grid.partition_mut(&layout, rank);
            if block.len() != slot.len() {
                return Err(GridError::PayloadSize {
                    expected: slot.len(),
                    got: block.len(),
                }
                .into());
            }
            check_cells(&block)?;
            slot.copy_from_slice(&block);
            debug!(from = rank.index(), bytes = block.len(), "gather");
        }
        Ok(&self.grid)
    }
}
