//! Error types for the automaton core.

use anneal_env::{EnvError, Rank};
use std::path::PathBuf;
use thiserror::Error;

/// Invalid row decomposition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("row count must be at least 1")]
    NoRows,

    #[error("{workers} workers cannot share {rows} rows")]
    TooManyWorkers { rows: usize, workers: usize },

    #[error("{rank} is not part of a ring of {workers}")]
    RankOutOfRange { rank: Rank, workers: usize },
}

/// Grid buffer failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Buffer could not be reserved. Fatal for the whole run.
    #[error("could not allocate {bytes} bytes for {what}")]
    Allocation { what: &'static str, bytes: usize },

    /// A block received from a peer does not match the wire contract
    #[error("payload of {got} bytes, expected {expected}")]
    PayloadSize { expected: usize, got: usize },

    /// A block received from a peer holds a byte that is not a cell state
    #[error("invalid cell byte {value} at offset {offset}")]
    InvalidCell { offset: usize, value: u8 },

    #[error("cell ({x}, {y}) outside {width}x{rows} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        rows: usize,
    },
}

/// Rejected startup parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid width must be at least 1")]
    NoWidth,

    #[error("a {width}x{rows} grid cannot be addressed")]
    TooLarge { width: usize, rows: usize },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Any failure during a run. Every variant is fatal.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("transport: {0}")]
    Env(#[from] EnvError),

    #[error("layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("grid: {0}")]
    Grid(#[from] GridError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// Only rank 0 may hold the global grid
    #[error("{0} cannot act as coordinator")]
    NotCoordinator(Rank),

    /// Rank 0 gathers its own rows locally and never ships them
    #[error("{0} is the coordinator and has no final block to send")]
    CoordinatorSendsFinal(Rank),

    #[error("transport has {actual} ranks but the run is configured for {expected}")]
    RingSize { expected: usize, actual: usize },
}
