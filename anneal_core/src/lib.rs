//! Anneal Core - Ring-Partitioned Cellular Automaton
//!
//! A toroidal grid of `width x rows` cells is split by rows over a ring of
//! workers. Every generation, each worker
//! 1. wraps its guard columns and swaps boundary rows with its two ring
//!    neighbours (halo exchange), then
//! 2. applies the 10-entry annealing table to every owned cell.
//!
//! Rank 0 seeds the grid, scatters it, gathers it back after the last
//! generation and fingerprints it, so a distributed run can be checked
//! against a single-worker run by comparing one string.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod fingerprint;
pub mod grid;
pub mod partition;
pub mod rule;
pub mod run;
pub mod source;
pub mod worker;

// Re-export key types for convenience
pub use config::RunConfig;
pub use coordinator::{Coordinator, GlobalGrid, InitialState};
pub use error::{ConfigError, CoreError, GridError, LayoutError};
pub use fingerprint::{Fingerprint, Sha256Fingerprint};
pub use grid::{LocalGrid, ALIVE, DEAD, DEFAULT_WIDTH};
pub use partition::{Assignment, RingLayout};
pub use run::{run_rank, RunReport};
pub use source::{SeededUniform, UniformSource, DEFAULT_SEED};
pub use worker::Worker;
