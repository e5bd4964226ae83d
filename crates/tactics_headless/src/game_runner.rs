//! Unattended battle execution.
//!
//! Runs one scenario with every unit under the agent controller until a side
//! is wiped out or the tick limit is reached, collecting [`GameMetrics`].
//!
//! All loops are bounded by `max_ticks`; progress is logged at fixed
//! intervals.

use std::time::Instant;

use tracing::{debug, info};

use crate::metrics::{GameMetrics, MetricsCollector};
use crate::scenario::{Scenario, ScenarioError};

/// Tick limit when neither the caller nor the scenario sets one
/// (thirty minutes at the stock tick rate).
pub const DEFAULT_MAX_TICKS: u64 = 20 * 60 * 30;

/// Ticks between progress log lines.
const PROGRESS_INTERVAL: u64 = 20 * 60;

/// Configuration for a single battle run.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Random seed for the agent controller.
    pub seed: u64,
    /// Maximum ticks before timeout; 0 uses the scenario's limit.
    pub max_ticks: u64,
    /// Scenario to play.
    pub scenario: Scenario,
    /// Game ID for tracking.
    pub game_id: String,
}

impl GameConfig {
    /// Play `scenario` with `seed`.
    pub fn new(scenario: Scenario, seed: u64) -> Self {
        Self {
            seed,
            max_ticks: 0,
            game_id: format!("game_{seed}"),
            scenario,
        }
    }

    /// Override the tick limit.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    fn tick_limit(&self) -> u64 {
        if self.max_ticks > 0 {
            self.max_ticks
        } else {
            self.scenario.max_ticks.unwrap_or(DEFAULT_MAX_TICKS)
        }
    }
}

/// Result of a completed battle.
#[derive(Debug, Clone)]
pub struct GameResult {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// Wall-clock time spent simulating, in seconds.
    pub wall_seconds: f64,
}

/// Run a battle to completion or timeout.
pub fn run_game(config: GameConfig) -> Result<GameResult, ScenarioError> {
    let started = Instant::now();
    let max_ticks = config.tick_limit();
    let scenario = config.scenario.with_autopilot();
    let mut sim = scenario.build_with_seed(config.seed)?;
    let mut collector = MetricsCollector::new(config.game_id.clone(), scenario.name.clone(), config.seed, sim.board());

    debug!(
        game_id = %config.game_id,
        seed = config.seed,
        max_ticks,
        "Battle starting"
    );

    while sim.get_tick() < max_ticks && !sim.outcome().is_decided() {
        let events = sim.tick();
        collector.record_tick(&events);
        if events.tick % PROGRESS_INTERVAL == 0 {
            debug!(
                game_id = %config.game_id,
                tick = events.tick,
                units = sim.board().len(),
                "Battle progress"
            );
        }
    }

    let metrics = collector.finish(&sim);
    info!(
        game_id = %metrics.game_id,
        ticks = metrics.duration_ticks,
        outcome = ?metrics.outcome,
        "Battle finished"
    );
    Ok(GameResult {
        metrics,
        wall_seconds: started.elapsed().as_secs_f64(),
    })
}
