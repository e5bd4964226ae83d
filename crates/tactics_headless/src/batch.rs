//! Batch battle runner.
//!
//! Runs many battles of one scenario in parallel using rayon, one
//! [`Simulation`](tactics_core::simulation::Simulation) per task with nothing
//! shared between them.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::game_runner::{run_game, GameConfig};
use crate::metrics::{BatchSummary, GameMetrics};
use crate::scenario::{Scenario, ScenarioError};

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario name or path, as given to [`Scenario::resolve`]
    pub scenario: String,
    /// Number of battles to run
    pub game_count: u32,
    /// Maximum parallel battles (0 = use rayon default)
    pub parallel_games: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Starting seed; battle `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Maximum ticks per battle (0 = scenario limit)
    pub max_ticks: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "skirmish".to_string(),
            game_count: 100,
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            max_ticks: 0,
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario
    pub fn new(scenario: &str, game_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            game_count,
            ..Default::default()
        }
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the per-battle tick limit
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Set the number of worker threads
    pub fn with_parallelism(mut self, threads: u32) -> Self {
        self.parallel_games = threads;
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual battle metrics, in seed order
    pub games: Vec<GameMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Battle index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Completion counter shared by the workers.
#[derive(Debug)]
pub struct BatchProgress {
    /// Total battles
    pub total: u32,
    completed: AtomicU32,
    started: Instant,
}

impl BatchProgress {
    /// Create new progress tracker
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            started: Instant::now(),
        }
    }

    /// Record a completed battle, returning the new count
    pub fn record_completion(&self) -> u32 {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get current completion count
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        f64::from(self.current()) / f64::from(self.total.max(1)) * 100.0
    }

    /// Seconds since the batch started
    pub fn elapsed_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// Run a batch of battles.
///
/// Fails only if the scenario cannot be resolved or built; individual
/// battle failures land in [`BatchResults::errors`].
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, ScenarioError> {
    let scenario = Scenario::resolve(&config.scenario)?;
    // Surface setup errors once instead of once per battle.
    scenario.board()?;

    info!(
        "Starting batch run: {} games of '{}'",
        config.game_count, scenario.name
    );

    let progress = BatchProgress::new(config.game_count);
    let play = || -> Vec<Result<GameMetrics, BatchError>> {
        (0..config.game_count)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_start.wrapping_add(u64::from(i));
                let game = GameConfig::new(scenario.clone(), seed).with_max_ticks(config.max_ticks);
                match run_game(game) {
                    Ok(result) => {
                        let completed = progress.record_completion();
                        if completed % 10 == 0 {
                            debug!(
                                "Progress: {}/{} ({:.0}%)",
                                completed,
                                config.game_count,
                                progress.percentage()
                            );
                        }
                        Ok(result.metrics)
                    }
                    Err(e) => {
                        warn!("Game {} failed: {}", i, e);
                        Err(BatchError {
                            game_index: i,
                            seed,
                            message: e.to_string(),
                        })
                    }
                }
            })
            .collect()
    };

    let results = if config.parallel_games > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build()
        {
            Ok(pool) => pool.install(play),
            Err(e) => {
                warn!("Could not build a {}-thread pool: {}", config.parallel_games, e);
                play()
            }
        }
    } else {
        play()
    };

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameMetrics> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = progress.elapsed_seconds();

    info!(
        "Batch complete: {} games in {:.1}s ({:.1} games/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    Ok(BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    })
}

/// Outcome of replaying one seed several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterminismReport {
    /// Seed replayed
    pub seed: u64,
    /// Final state hash of every run, in order
    pub hashes: Vec<u64>,
    /// Final tick of every run, in order
    pub ticks: Vec<u64>,
}

impl DeterminismReport {
    /// Whether every run ended in the same state
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1]) && self.ticks.windows(2).all(|w| w[0] == w[1])
    }
}

/// Verify determinism by running the same seed multiple times.
pub fn verify_determinism(
    scenario: &Scenario,
    seed: u64,
    runs: u32,
    max_ticks: u64,
) -> Result<DeterminismReport, ScenarioError> {
    let mut report = DeterminismReport {
        seed,
        hashes: Vec::with_capacity(runs as usize),
        ticks: Vec::with_capacity(runs as usize),
    };
    for _ in 0..runs {
        let game = GameConfig::new(scenario.clone(), seed).with_max_ticks(max_ticks);
        let metrics = run_game(game)?.metrics;
        report.hashes.push(metrics.final_state_hash);
        report.ticks.push(metrics.duration_ticks);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert_eq!(config.game_count, 100);
        assert_eq!(config.scenario, "skirmish");
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new("duel", 500)
            .with_output(PathBuf::from("/tmp/results"))
            .with_seed(12345)
            .with_max_ticks(600)
            .with_parallelism(2);

        assert_eq!(config.scenario, "duel");
        assert_eq!(config.game_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.max_ticks, 600);
        assert_eq!(config.parallel_games, 2);
    }

    #[test]
    fn test_progress_tracking() {
        let progress = BatchProgress::new(4);
        assert_eq!(progress.current(), 0);
        assert_eq!(progress.record_completion(), 1);
        assert_eq!(progress.record_completion(), 2);
        assert!((progress.percentage() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_run_batch_small() {
        let config = BatchConfig::new("duel", 6).with_max_ticks(400).with_parallelism(2);
        let results = run_batch(config).unwrap();

        assert_eq!(results.games.len(), 6);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 6);
        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_unknown_scenario_fails_up_front() {
        let err = run_batch(BatchConfig::new("no/such/scenario.ron", 3)).unwrap_err();
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }

    #[test]
    fn test_verify_determinism() {
        let report = verify_determinism(&Scenario::duel(), 12345, 3, 800).unwrap();
        assert_eq!(report.hashes.len(), 3);
        assert!(report.is_deterministic());
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(BatchConfig::new("duel", 3).with_max_ticks(200)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.json");

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games, results.games);
        assert_eq!(loaded.config.scenario, "duel");
    }
}
