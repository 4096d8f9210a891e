//! Anneal CLI
//!
//! Run the ring-partitioned automaton in-process or across processes, and
//! check distributed runs against the single-worker reference.

use anneal_core::{run_rank, RunConfig, RunReport, Sha256Fingerprint};
use anneal_env::{Rank, TcpConfig, TcpTransport};
use anneal_sim::scenarios::ScenarioId;
use anneal_sim::{ScenarioResult, ScenarioRunner, SimWorld};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Distributed annealing cellular automaton
#[derive(Parser, Debug)]
#[command(name = "anneal")]
#[command(about = "Run and verify the ring-partitioned annealing automaton", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

/// Grid parameters shared by the run-style subcommands.
#[derive(Args, Debug, Clone)]
struct GridArgs {
    /// Total rows in the grid
    #[arg(short, long)]
    rows: Option<usize>,

    /// Generations to compute
    #[arg(short, long)]
    iterations: Option<u64>,

    /// Cells per row
    #[arg(long)]
    width: Option<usize>,

    /// Seed for the initial configuration
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON file supplying any parameter not given on the command line
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl GridArgs {
    /// Layers defaults, the config file and flags, then validates.
    fn resolve(&self, workers: Option<usize>) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None => RunConfig::default(),
        };
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(workers) = workers {
            config.workers = workers;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every rank as a task of this process
    Run {
        #[command(flatten)]
        grid: GridArgs,

        /// Number of workers in the ring
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Run one rank of a multi-process ring over TCP
    Worker {
        #[command(flatten)]
        grid: GridArgs,

        /// This process's rank
        #[arg(long)]
        rank: usize,

        /// Listen addresses of all ranks, in rank order
        #[arg(long, value_delimiter = ',', required = true)]
        peers: Vec<SocketAddr>,

        /// Attempts to reach a peer that is still starting
        #[arg(long, default_value = "100")]
        connect_attempts: u32,
    },

    /// Compare a decomposition against the single-worker reference
    Verify {
        #[command(flatten)]
        grid: GridArgs,

        /// Number of workers in the ring
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Run self-check scenarios
    ///
    /// lone_cell, zero_iterations, determinism, decomposition, lockstep or all
    Scenarios {
        /// Scenario to run
        #[arg(short = 'S', long, default_value = "all")]
        scenario: String,

        /// Base seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Largest ring to try
        #[arg(short, long, default_value = "4")]
        workers: usize,

        /// Number of consecutive seeds to test
        #[arg(long, default_value = "1")]
        seeds: usize,
    },
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        info!(
            "{} rows x {} cells, {} workers, {} generations, {} alive, {} ms",
            report.rows,
            report.width,
            report.workers,
            report.iterations,
            report.alive_cells,
            report.elapsed_ms
        );
        println!("hash: {}", report.fingerprint);
    }
    Ok(())
}

async fn run_scenarios(
    scenario: &str,
    seed: u64,
    workers: usize,
    seeds: usize,
    json: bool,
) -> Result<bool> {
    let scenarios: Vec<ScenarioId> = if scenario == "all" {
        ScenarioId::all()
    } else {
        vec![scenario.parse().map_err(anyhow::Error::msg)?]
    };

    let mut results: Vec<ScenarioResult> = Vec::new();
    for offset in 0..seeds {
        let runner = ScenarioRunner::new(seed.wrapping_add(offset as u64), workers);
        for scenario in &scenarios {
            let result = runner.run(*scenario).await;
            if !json {
                if result.passed {
                    info!("✓ {} (seed={}) PASSED", scenario.name(), result.seed);
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        result.seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }
            results.push(result);
        }
    }

    let failed = results.iter().filter(|r| !r.passed).count();
    if json {
        let summary = serde_json::json!({
            "total": results.len(),
            "passed": results.len() - failed,
            "failed": failed,
            "results": results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "fingerprint": r.fingerprint,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if failed == 0 {
        info!("All {} scenario runs passed", results.len());
    } else {
        error!("{}/{} scenario runs failed", failed, results.len());
    }
    Ok(failed == 0)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for results
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run { grid, workers } => {
            let config = grid.resolve(workers)?;
            info!(
                rows = config.rows,
                width = config.width,
                workers = config.workers,
                iterations = config.iterations,
                seed = config.seed,
                "starting in-process run"
            );
            let report = SimWorld::new(config).run().await.context("run aborted")?;
            print_report(&report, cli.json)?;
        }

        Command::Worker {
            grid,
            rank,
            peers,
            connect_attempts,
        } => {
            let config = grid.resolve(Some(peers.len()))?;
            let tcp = TcpConfig {
                connect_attempts,
                ..Default::default()
            };
            let transport = TcpTransport::connect(Rank(rank), &peers, &tcp)
                .await
                .with_context(|| format!("rank {} could not join the ring", rank))?;
            info!(rank, workers = peers.len(), "joined ring");

            let report = run_rank(
                Arc::new(transport),
                &config,
                &config.initial_state(),
                &Sha256Fingerprint,
            )
            .await
            .with_context(|| format!("rank {} aborted", rank))?;

            if let Some(report) = report {
                print_report(&report, cli.json)?;
            }
        }

        Command::Verify { grid, workers } => {
            let config = grid.resolve(workers)?;
            let verification = SimWorld::new(config)
                .verify()
                .await
                .context("verification aborted")?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&verification)?);
            } else {
                println!("reference (1 worker): {}", verification.reference.fingerprint);
                println!(
                    "distributed ({} workers): {}",
                    verification.distributed.workers, verification.distributed.fingerprint
                );
            }
            if !verification.matches {
                error!("fingerprints differ");
                std::process::exit(1);
            }
        }

        Command::Scenarios {
            scenario,
            seed,
            workers,
            seeds,
        } => {
            if !run_scenarios(&scenario, seed, workers, seeds, cli.json).await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn run_args(args: &[&str]) -> (GridArgs, Option<usize>) {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Run { grid, workers } => (grid, workers),
            other => panic!("expected run, got {:?}", other),
        }
    }

    fn write_config(name: &str, json: &str) -> PathBuf {
        let file = format!("anneal-{}-{}.json", name, std::process::id());
        let path = std::env::temp_dir().join(file);
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config_file() {
        let path = write_config("override", r#"{ "rows": 64, "iterations": 7, "workers": 2 }"#);
        let file = path.to_str().unwrap();

        let (grid, workers) = run_args(&["anneal", "run", "--config", file, "--rows", "8"]);
        let config = grid.resolve(workers).unwrap();
        std::fs::remove_file(&path).unwrap();

        // flag beats file
        assert_eq!(config.rows, 8);
        // file beats defaults
        assert_eq!(config.iterations, 7);
        assert_eq!(config.workers, 2);
        // missing from the file
        assert_eq!(config.width, 1024);
        assert_eq!(config.seed, 424243);
    }

    #[test]
    fn test_workers_flag_overrides_file() {
        let path = write_config("workers", r#"{ "rows": 16, "workers": 2 }"#);
        let file = path.to_str().unwrap();

        let (grid, workers) = run_args(&["anneal", "run", "-c", file, "-w", "4", "-s", "9"]);
        let config = grid.resolve(workers).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.workers, 4);
        assert_eq!(config.seed, 9);
        assert_eq!(config.rows, 16);
    }

    #[test]
    fn test_defaults_without_config() {
        let (grid, workers) = run_args(&["anneal", "run"]);
        assert_eq!(grid.resolve(workers).unwrap(), RunConfig::default());
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let (grid, workers) = run_args(&["anneal", "run", "--rows", "2", "--workers", "3"]);
        assert!(grid.resolve(workers).is_err());

        let (grid, workers) = run_args(&["anneal", "run", "--width", "18446744073709551615"]);
        assert!(grid.resolve(workers).is_err());
    }

    #[test]
    fn test_worker_peers_set_ring_size() {
        let cli = Cli::try_parse_from([
            "anneal",
            "worker",
            "--rank",
            "1",
            "--peers",
            "127.0.0.1:7000,127.0.0.1:7001,127.0.0.1:7002",
            "--rows",
            "12",
        ])
        .unwrap();

        match cli.command {
            Command::Worker { grid, rank, peers, .. } => {
                assert_eq!(rank, 1);
                assert_eq!(peers.len(), 3);
                let config = grid.resolve(Some(peers.len())).unwrap();
                assert_eq!(config.workers, 3);
                assert_eq!(config.rows, 12);
            }
            other => panic!("expected worker, got {:?}", other),
        }
    }
}
