//! netsim CLI
//!
//! Run node-churn scenarios against the in-memory simulated network.

use clap::Parser;
use netsim::scenarios::ScenarioId;
use netsim::{ScenarioResult, ScenarioRunner, SimContext};
use netsim_env::NetsimContext;
use serde::Serialize;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// netsim node registry scenario runner
#[derive(Parser, Debug)]
#[command(name = "netsim")]
#[command(about = "Run node registry scenarios on a simulated network", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of nodes spawned per scenario
    #[arg(short, long, default_value = "6")]
    nodes: usize,

    /// Scenario to run (stop_random, churn, pivot_survival, drain, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Service attached to every node (repeatable)
    #[arg(long = "service")]
    services: Vec<String>,

    /// Rounds for iterative scenarios
    #[arg(short, long, default_value = "10")]
    rounds: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,
}

/// Machine-readable run summary.
#[derive(Serialize)]
struct Summary<'a> {
    total: usize,
    passed: usize,
    failed: usize,
    results: &'a [ScenarioResult],
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if !args.json {
        info!("netsim scenario runner v{}", env!("CARGO_PKG_VERSION"));
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(scenario) => vec![scenario],
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Available scenarios: stop_random, churn, pivot_survival, drain, all");
                std::process::exit(1);
            }
        }
    };

    // Determine base seed
    let base_seed = if args.seed == 0 {
        SimContext::from_time().seed()
    } else {
        args.seed
    };

    let mut all_results: Vec<ScenarioResult> = Vec::new();

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);

        let runner = ScenarioRunner::new(seed, args.nodes)
            .with_services(args.services.clone())
            .with_rounds(args.rounds);

        for scenario in &scenarios {
            let result = runner.run(*scenario);

            if !args.json {
                if result.passed {
                    info!(
                        "✓ {} (seed={}) PASSED: {}/{} up after {} ops",
                        scenario.name(),
                        seed,
                        result.up_nodes,
                        result.total_nodes,
                        result.operations
                    );
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();
    let failed_count = all_results.iter().filter(|r| !r.passed).count();

    if args.json {
        let summary = Summary {
            total,
            passed: total - failed_count,
            failed: failed_count,
            results: &all_results,
        };
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize summary: {}", e);
                std::process::exit(2);
            }
        }
    } else if failed_count == 0 {
        info!("All {} scenario runs passed!", total);
    } else {
        error!("{}/{} scenario runs failed!", failed_count, total);
        for result in all_results.iter().filter(|r| !r.passed) {
            error!(
                "  - {} seed={}: {}",
                result.scenario.name(),
                result.seed,
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
