//! One rank's complete lifecycle.

use crate::config::RunConfig;
use crate::coordinator::{Coordinator, InitialState};
use crate::error::CoreError;
use crate::fingerprint::Fingerprint;
use crate::grid::ALIVE;
use crate::worker::Worker;
use anneal_env::RingTransport;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// What the coordinator knows at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Fingerprint of the final grid
    pub fingerprint: String,

    /// Fingerprint of the grid as seeded, before any generation
    pub initial_fingerprint: String,

    /// Fingerprint algorithm name
    pub algorithm: String,

    pub rows: usize,
    pub width: usize,
    pub workers: usize,
    pub iterations: u64,

    /// Live cells in the final grid
    pub alive_cells: usize,

    /// Wall time from seeding to the end of the gather
    pub elapsed_ms: u64,
}

/// Runs one rank from scatter to barrier.
///
/// Every rank of the ring must call this with the same `config` and
/// `initial`. Rank 0 seeds the grid, scatters it, runs its own partition,
/// gathers and fingerprints; the others receive, run and send back. All
/// ranks then meet at a barrier. Returns the report on rank 0 only.
///
/// Any error is fatal: the caller is expected to tear the whole ring down.
pub async fn run_rank<T, F>(
    transport: Arc<T>,
    config: &RunConfig,
    initial: &InitialState,
    fingerprint: &F,
) -> Result<Option<RunReport>, CoreError>
where
    T: RingTransport,
    F: Fingerprint + ?Sized,
{
    config.validate()?;
    let layout = config.layout()?;
    if transport.size() != layout.workers() {
        return Err(CoreError::RingSize {
            expected: layout.workers(),
            actual: transport.size(),
        });
    }

    let rank = transport.rank();
    let assignment = layout.assignment(rank)?;
    debug!(
        rank = rank.index(),
        rows = assignment.rows,
        first_row = assignment.first_row,
        up = assignment.up.index(),
        down = assignment.down.index(),
        "assigned"
    );

    let report = if rank.is_coordinator() {
        let started = Instant::now();
        let mut coordinator = Coordinator::new(transport.clone(), layout, config.width, initial)?;
        let initial_fingerprint = coordinator.grid().fingerprint(fingerprint);

        let own = coordinator.scatter().await?;
        let mut worker = Worker::new(transport.clone(), assignment, own)?;
        worker.run(config.iterations).await?;

        let cells = coordinator.gather(worker.grid()).await?.cell_bytes();
        let alive_cells = cells.iter().filter(|&&c| c == ALIVE).count();
        info!(
            workers = layout.workers(),
            generations = worker.generation(),
            alive = alive_cells,
            "gathered final grid"
        );
        Some(RunReport {
            fingerprint: fingerprint.digest(&cells),
            initial_fingerprint,
            algorithm: fingerprint.algorithm().to_string(),
            rows: layout.total_rows(),
            width: config.width,
            workers: layout.workers(),
            iterations: config.iterations,
            alive_cells,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    } else {
        let mut worker =
            Worker::receive_initial(transport.clone(), assignment, config.width).await?;
        worker.run(config.iterations).await?;
        worker.send_final().await?;
        None
    };

    transport.barrier().await?;
    debug!(rank = rank.index(), "finished");
    Ok(report)
}
