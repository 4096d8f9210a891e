//! Anneal Harness
//!
//! Runs the ring-partitioned automaton either with every rank as a task of
//! one process ([`SimWorld`]) or with one process per rank over TCP (the
//! `anneal worker` subcommand), and checks distributed runs against the
//! single-worker reference.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        SimWorld                           │
//! │   ┌────────┐  halo rows  ┌────────┐  halo rows  ┌────────┐ │
//! │   │ rank 0 │◄───────────►│ rank 1 │◄───────────►│ rank 2 │ │
//! │   └───┬────┘             └────────┘             └───┬────┘ │
//! │       ▲      wrap-around halo rows (ring closes)    │      │
//! │       └─────────────────────────────────────────────┘      │
//! │   rank 0: seed ─► scatter ─► ... ─► gather ─► fingerprint   │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use anneal_core::RunConfig;
//! use anneal_sim::SimWorld;
//!
//! let config = RunConfig { rows: 512, iterations: 50, workers: 4, ..Default::default() };
//! let report = SimWorld::new(config).run().await?;
//! println!("hash: {}", report.fingerprint);
//! ```

mod runner;
pub mod scenarios;
mod world;

pub use runner::{ScenarioResult, ScenarioRunner};
pub use world::{SimError, SimWorld, Verification};
