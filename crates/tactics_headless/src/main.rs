//! Headless hex tactics runner.
//!
//! This binary runs battles without graphics, controlled via JSON on
//! stdin/stdout or played out by the agent controller on both sides.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p tactics_headless -- run --scenario duel
//!
//! # Play one battle to the end and print the final board
//! cargo run -p tactics_headless -- simulate --scenario skirmish --seed 7 --render
//!
//! # Run a batch of seeded battles
//! cargo run -p tactics_headless -- batch --scenario skirmish --count 200 --output results/
//!
//! # Check that a seed replays identically
//! cargo run -p tactics_headless -- verify --scenario skirmish --seed 12345 --runs 5
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tactics_headless::{
    ascii_visualizer::{render_board, AsciiConfig},
    batch::{run_batch, verify_determinism, BatchConfig},
    game_runner::{run_game, GameConfig},
    runner::{HeadlessConfig, HeadlessRunner},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "tactics_headless")]
#[command(about = "Headless hex tactics runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single interactive battle over stdin/stdout
    Run {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Output state after every tick command
        #[arg(long)]
        auto_state: bool,
    },

    /// Play one battle with agents on both sides
    Simulate {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Seed override (defaults to the scenario's seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Tick limit (0 = scenario limit)
        #[arg(long, default_value = "0")]
        max_ticks: u64,

        /// Print the final board as ASCII
        #[arg(long)]
        render: bool,
    },

    /// Run a batch of battles
    Batch {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Number of battles to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel battles (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick limit per battle (0 = scenario limit)
        #[arg(long, default_value = "0")]
        max_ticks: u64,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Tick limit per run (0 = scenario limit)
        #[arg(long, default_value = "0")]
        max_ticks: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            auto_state,
        }) => cmd_run(&scenario, auto_state),
        Some(Commands::Simulate {
            scenario,
            seed,
            max_ticks,
            render,
        }) => cmd_simulate(&scenario, seed, max_ticks, render),
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
            max_ticks,
        }) => cmd_batch(scenario, count, parallel, output, seed, max_ticks),
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
            max_ticks,
        }) => cmd_verify(&scenario, seed, runs, max_ticks),
        None => {
            // Default: interactive mode
            cmd_run("duel", false);
        }
    }
}

fn load_scenario(name: &str) -> Scenario {
    match Scenario::resolve(name) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Failed to load scenario '{}': {}", name, e);
            std::process::exit(1);
        }
    }
}

/// Run a single interactive battle
fn cmd_run(scenario: &str, auto_state: bool) {
    tracing::info!("Starting interactive session");

    let config = HeadlessConfig {
        auto_state_output: auto_state,
    };
    let mut runner = match HeadlessRunner::with_config(load_scenario(scenario), config) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Failed to build scenario: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    if let Err(e) = runner.run(stdin.lock(), io::stdout().lock()) {
        tracing::error!(error = %e, "Session I/O failed");
        std::process::exit(1);
    }
}

/// Play one autoplay battle and report it
fn cmd_simulate(scenario: &str, seed: Option<u64>, max_ticks: u64, render: bool) {
    let scenario = load_scenario(scenario);
    let seed = seed.unwrap_or(scenario.seed);
    let config = GameConfig::new(scenario.clone(), seed).with_max_ticks(max_ticks);

    let result = match run_game(config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Battle failed: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&result.metrics) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to serialize metrics"),
    }
    eprintln!(
        "{} ticks ({:.1}s simulated) in {:.3}s wall clock",
        result.metrics.duration_ticks, result.metrics.duration_seconds, result.wall_seconds
    );

    if render {
        // Replay the same seed to obtain the final board.
        let mut sim = match scenario.with_autopilot().build_with_seed(seed) {
            Ok(sim) => sim,
            Err(e) => {
                eprintln!("Failed to rebuild scenario: {}", e);
                std::process::exit(1);
            }
        };
        while sim.get_tick() < result.metrics.duration_ticks {
            sim.tick();
        }
        eprintln!(
            "{}",
            render_board(sim.board(), sim.now(), &AsciiConfig::default())
        );
    }
}

/// Run a batch of battles
fn cmd_batch(
    scenario: String,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
    max_ticks: u64,
) {
    let batch_start = Instant::now();

    tracing::info!(
        scenario = %scenario,
        count = count,
        parallel = parallel,
        seed = seed,
        output = %output.display(),
        max_ticks = max_ticks,
        "Batch configuration"
    );

    if let Err(e) = std::fs::create_dir_all(&output) {
        tracing::error!(error = %e, path = %output.display(), "Failed to create output directory");
        eprintln!(
            "FATAL: Cannot create output directory '{}': {}",
            output.display(),
            e
        );
        std::process::exit(1);
    }

    let config = BatchConfig::new(&scenario, count)
        .with_output(output.clone())
        .with_seed(seed)
        .with_max_ticks(max_ticks)
        .with_parallelism(parallel);

    let results = match run_batch(config) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        games_completed = results.games.len(),
        games_failed = results.errors.len(),
        total_duration_secs = format!("{:.1}", batch_start.elapsed().as_secs_f64()),
        "Batch execution finished"
    );

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        tracing::error!(error = %e, path = %results_path.display(), "Failed to save results");
        eprintln!("FATAL: Failed to save results: {}", e);
        std::process::exit(1);
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Battles played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Battles FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Victories / defeats / timeouts: {} / {} / {}",
        summary.victories, summary.defeats, summary.timeouts
    );
    eprintln!("Player win rate: {:.1}%", summary.player_win_rate * 100.0);
    eprintln!("Average length: {:.0} ticks", summary.avg_duration_ticks);
    eprintln!(
        "Damage per attack: {:.2} ({:.1}% blocked)",
        summary.avg_damage_per_attack,
        summary.blocked_attack_rate * 100.0
    );

    for error in results.errors.iter().take(10) {
        eprintln!(
            "  Battle {} (seed {}): {}",
            error.game_index, error.seed, error.message
        );
    }

    eprintln!("\nResults saved to: {}", results_path.display());
}

/// Verify determinism
fn cmd_verify(scenario: &str, seed: u64, runs: u32, max_ticks: u64) {
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario,
        seed,
        runs
    );

    let report = match verify_determinism(&load_scenario(scenario), seed, runs, max_ticks) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("FAIL: {}", e);
            std::process::exit(1);
        }
    };

    if report.is_deterministic() {
        eprintln!("PASS: All {} runs produced identical results", runs);
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        for (i, (hash, tick)) in report.hashes.iter().zip(&report.ticks).enumerate() {
            eprintln!("  run {}: tick {} hash {:016x}", i, tick, hash);
        }
        std::process::exit(1);
    }
}
