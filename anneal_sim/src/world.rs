//! SimWorld - every rank of a ring as a task of this process.

use anneal_core::{
    run_rank, CoreError, Fingerprint, InitialState, RunConfig, RunReport, Sha256Fingerprint,
};
use anneal_env::{MemoryTransport, DEFAULT_LINK_CAPACITY};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Failures of an in-process run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("rank task failed: {0}")]
    TaskFailed(String),

    #[error("coordinator finished without a report")]
    NoReport,
}

/// Outcome of comparing a decomposition with the single-worker reference.
#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub reference: RunReport,
    pub distributed: RunReport,
    pub matches: bool,
}

/// Container for an in-process run.
pub struct SimWorld<F: Fingerprint = Sha256Fingerprint> {
    /// Configuration
    config: RunConfig,

    /// Envelopes buffered per rank pair
    link_capacity: usize,

    /// Fingerprint shared by the coordinator task
    fingerprint: Arc<F>,
}

impl SimWorld<Sha256Fingerprint> {
    /// Creates a world fingerprinting with SHA-256.
    pub fn new(config: RunConfig) -> Self {
        Self::with_fingerprint(config, Sha256Fingerprint)
    }
}

impl<F: Fingerprint + 'static> SimWorld<F> {
    pub fn with_fingerprint(config: RunConfig, fingerprint: F) -> Self {
        Self {
            config,
            link_capacity: DEFAULT_LINK_CAPACITY,
            fingerprint: Arc::new(fingerprint),
        }
    }

    /// Sets the per-link channel capacity.
    pub fn with_link_capacity(mut self, capacity: usize) -> Self {
        self.link_capacity = capacity;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs the configured seeded fill.
    pub async fn run(&self) -> Result<RunReport, SimError> {
        self.run_with(&self.config.initial_state()).await
    }

    /// Runs from an explicit initial state.
    ///
    /// The first rank to fail aborts every other rank and its error is
    /// returned; a half-dead ring is never left waiting.
    pub async fn run_with(&self, initial: &InitialState) -> Result<RunReport, SimError> {
        self.config.validate().map_err(CoreError::from)?;

        let mut ranks = JoinSet::new();
        for transport in MemoryTransport::mesh(self.config.workers, self.link_capacity) {
            let config = self.config.clone();
            let initial = initial.clone();
            let fingerprint = Arc::clone(&self.fingerprint);
            ranks.spawn(async move {
                run_rank(Arc::new(transport), &config, &initial, &*fingerprint).await
            });
        }
        debug!(workers = self.config.workers, "spawned ranks");

        let mut report = None;
        while let Some(joined) = ranks.join_next().await {
            match joined {
                Ok(Ok(Some(r))) => report = Some(r),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    error!("rank failed, aborting run: {}", e);
                    ranks.abort_all();
                    return Err(e.into());
                }
                Err(e) => {
                    error!("rank task failed, aborting run: {}", e);
                    ranks.abort_all();
                    return Err(SimError::TaskFailed(e.to_string()));
                }
            }
        }

        report.ok_or(SimError::NoReport)
    }

    /// Runs the configured decomposition and a single-worker reference and
    /// compares their fingerprints.
    pub async fn verify(&self) -> Result<Verification, SimError> {
        let reference = SimWorld {
            config: self.config.with_workers(1),
            link_capacity: self.link_capacity,
            fingerprint: Arc::clone(&self.fingerprint),
        }
        .run()
        .await?;
        let distributed = self.run().await?;

        let matches = reference.fingerprint == distributed.fingerprint;
        info!(
            workers = distributed.workers,
            matches,
            "verified against single-worker reference"
        );
        Ok(Verification {
            reference,
            distributed,
            matches,
        })
    }
}
