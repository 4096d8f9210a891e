//! Scenario runner - executes the self-check scenarios.

use crate::scenarios::ScenarioId;
use crate::world::{SimError, SimWorld};

use anneal_core::{Fingerprint, InitialState, RunConfig, Sha256Fingerprint};
use tracing::{debug, info};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Fingerprint the scenario settled on, if it got that far
    pub fingerprint: Option<String>,

    /// Failure message if any
    pub failure_reason: Option<String>,
}

impl ScenarioResult {
    fn pass(scenario: ScenarioId, seed: u64, fingerprint: String) -> Self {
        Self {
            scenario,
            seed,
            passed: true,
            fingerprint: Some(fingerprint),
            failure_reason: None,
        }
    }

    fn fail(scenario: ScenarioId, seed: u64, reason: impl Into<String>) -> Self {
        Self {
            scenario,
            seed,
            passed: false,
            fingerprint: None,
            failure_reason: Some(reason.into()),
        }
    }
}

/// Outer error: the run could not complete. Inner error: an assertion failed.
type Outcome = Result<Result<String, String>, SimError>;

/// Runs scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Largest ring to try
    workers: usize,

    /// Rows in the scenario grid
    rows: usize,

    /// Generations per run
    iterations: u64,

    /// Cells per row
    width: usize,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64, workers: usize) -> Self {
        Self {
            seed,
            workers: workers.max(1),
            rows: 61,
            iterations: 20,
            width: 64,
        }
    }

    /// Sets the grid height.
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    /// Sets the generation count.
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the grid width.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    fn config(&self, workers: usize) -> RunConfig {
        RunConfig {
            rows: self.rows,
            iterations: self.iterations,
            width: self.width,
            seed: self.seed,
            workers,
        }
    }

    /// Runs a scenario and returns the result.
    pub async fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let outcome = match scenario {
            ScenarioId::LoneCell => self.run_lone_cell().await,
            ScenarioId::ZeroIterations => self.run_zero_iterations().await,
            ScenarioId::Determinism => self.run_determinism().await,
            ScenarioId::Decomposition => self.run_decomposition().await,
            ScenarioId::Lockstep => self.run_lockstep().await,
        };

        match outcome {
            Ok(Ok(fingerprint)) => ScenarioResult::pass(scenario, self.seed, fingerprint),
            Ok(Err(reason)) => ScenarioResult::fail(scenario, self.seed, reason),
            Err(e) => ScenarioResult::fail(scenario, self.seed, format!("run aborted: {}", e)),
        }
    }

    /// Single live cell in the middle of a 4x4 torus, one worker, one generation.
    async fn run_lone_cell(&self) -> Outcome {
        let config = RunConfig {
            rows: 4,
            iterations: 1,
            width: 4,
            seed: self.seed,
            workers: 1,
        };
        let report = SimWorld::new(config)
            .run_with(&InitialState::Alive(vec![(2, 2)]))
            .await?;

        let all_dead = Sha256Fingerprint.digest(&[0u8; 16]);
        if report.alive_cells == 0 && report.fingerprint == all_dead {
            Ok(Ok(report.fingerprint))
        } else {
            Ok(Err(format!("{} cells still alive", report.alive_cells)))
        }
    }

    async fn run_zero_iterations(&self) -> Outcome {
        let config = RunConfig {
            iterations: 0,
            ..self.config(self.workers.min(self.rows))
        };
        let report = SimWorld::new(config).run().await?;

        if report.fingerprint == report.initial_fingerprint {
            Ok(Ok(report.fingerprint))
        } else {
            Ok(Err(format!(
                "final {} differs from seeded {}",
                report.fingerprint, report.initial_fingerprint
            )))
        }
    }

    async fn run_determinism(&self) -> Outcome {
        let config = self.config(self.workers.min(self.rows));
        let first = SimWorld::new(config.clone()).run().await?;
        let second = SimWorld::new(config).run().await?;

        if first.fingerprint == second.fingerprint {
            Ok(Ok(first.fingerprint))
        } else {
            Ok(Err(format!("{} != {}", first.fingerprint, second.fingerprint)))
        }
    }

    async fn run_decomposition(&self) -> Outcome {
        let reference = SimWorld::new(self.config(1)).run().await?;

        for workers in 2..=self.workers.min(self.rows) {
            let report = SimWorld::new(self.config(workers)).run().await?;
            debug!(workers, fingerprint = %report.fingerprint, "decomposition");
            if report.fingerprint != reference.fingerprint {
                return Ok(Err(format!(
                    "{} workers produced {}, reference {}",
                    workers, report.fingerprint, reference.fingerprint
                )));
            }
        }
        Ok(Ok(reference.fingerprint))
    }

    async fn run_lockstep(&self) -> Outcome {
        let config = self.config(self.workers.min(self.rows));
        let buffered = SimWorld::new(config.clone()).run().await?;
        let lockstep = SimWorld::new(config).with_link_capacity(1).run().await?;

        if buffered.fingerprint == lockstep.fingerprint {
            Ok(Ok(buffered.fingerprint))
        } else {
            Ok(Err(format!("{} != {}", lockstep.fingerprint, buffered.fingerprint)))
        }
    }
}
