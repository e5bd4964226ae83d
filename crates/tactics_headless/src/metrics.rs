//! Battle metrics collection for batch analysis.
//!
//! A [`MetricsCollector`] watches the event stream of one battle and tallies
//! per-faction counters; [`BatchSummary`] aggregates many battles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tactics_core::board::Board;
use tactics_core::simulation::{BattleOutcome, SimEvent, Simulation, TickEvents};
use tactics_core::unit::{Faction, UnitId};

/// Complete metrics for a single battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Random seed used.
    pub seed: u64,
    /// Total battle duration in ticks.
    pub duration_ticks: u64,
    /// Simulated seconds at the end of the battle.
    pub duration_seconds: f64,
    /// How the battle ended; `InProgress` means the tick limit was hit.
    pub outcome: BattleOutcome,
    /// Winning faction (None = undecided).
    pub winner: Option<Faction>,
    /// Per-faction metrics keyed by faction name.
    pub factions: BTreeMap<String, FactionMetrics>,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Metrics for one faction, if it took part.
    pub fn faction(&self, faction: Faction) -> Option<&FactionMetrics> {
        self.factions.get(faction.name())
    }

    /// Whether the battle ran out of ticks before either side fell.
    pub fn timed_out(&self) -> bool {
        !self.outcome.is_decided()
    }
}

/// Metrics for a single faction in a battle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionMetrics {
    /// Units at the start of the battle.
    pub units_start: u32,
    /// Units still alive at the end.
    pub units_remaining: u32,
    /// Moves made.
    pub moves: u32,
    /// Attacks made.
    pub attacks: u32,
    /// Attacks that dealt no damage.
    pub blocked_attacks: u32,
    /// Attacks that earned any backstab bonus.
    pub backstabs: u32,
    /// Total damage dealt (before health clamping).
    pub damage_dealt: u64,
    /// Total damage received.
    pub damage_taken: u64,
    /// Opponents killed.
    pub kills: u32,
    /// Tick of the faction's first attack.
    pub first_attack_tick: Option<u64>,
}

/// Tallies a battle's events into [`GameMetrics`].
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    metrics: GameMetrics,
    roster: BTreeMap<UnitId, Faction>,
}

impl MetricsCollector {
    /// Start collecting for a battle on `board`.
    pub fn new(game_id: impl Into<String>, scenario: impl Into<String>, seed: u64, board: &Board) -> Self {
        let mut factions = BTreeMap::new();
        let mut roster = BTreeMap::new();
        for unit in board.units() {
            roster.insert(unit.id, unit.faction);
            factions
                .entry(unit.faction.name().to_string())
                .or_insert_with(FactionMetrics::default)
                .units_start += 1;
        }
        Self {
            metrics: GameMetrics {
                game_id: game_id.into(),
                scenario: scenario.into(),
                seed,
                duration_ticks: 0,
                duration_seconds: 0.0,
                outcome: BattleOutcome::InProgress,
                winner: None,
                factions,
                final_state_hash: 0,
            },
            roster,
        }
    }

    /// Record one tick's events.
    pub fn record_tick(&mut self, tick: &TickEvents) {
        for event in &tick.events {
            self.record_event(tick.tick, event);
        }
    }

    /// Record one event observed at `tick`.
    pub fn record_event(&mut self, tick: u64, event: &SimEvent) {
        match event {
            SimEvent::Moved(moved) => {
                if let Some(side) = self.side_mut(moved.unit) {
                    side.moves += 1;
                }
            }
            SimEvent::Attacked(outcome) => {
                if let Some(side) = self.side_mut(outcome.attacker) {
                    side.attacks += 1;
                    side.damage_dealt += u64::from(outcome.damage);
                    if outcome.damage == 0 {
                        side.blocked_attacks += 1;
                    }
                    if outcome.backstab_bonus > 0 {
                        side.backstabs += 1;
                    }
                    side.first_attack_tick.get_or_insert(tick);
                }
                if let Some(side) = self.side_mut(outcome.defender) {
                    side.damage_taken += u64::from(outcome.damage);
                }
            }
            SimEvent::Died { unit, .. } => {
                let opponent = self.roster.get(unit).map(|f| f.opponent());
                if let Some(opponent) = opponent {
                    self.metrics
                        .factions
                        .entry(opponent.name().to_string())
                        .or_default()
                        .kills += 1;
                }
            }
        }
    }

    /// Close the books on a finished (or timed-out) battle.
    pub fn finish(mut self, sim: &Simulation) -> GameMetrics {
        let outcome = sim.outcome();
        self.metrics.duration_ticks = sim.get_tick();
        self.metrics.duration_seconds = sim.now().to_num();
        self.metrics.outcome = outcome;
        self.metrics.winner = match outcome {
            BattleOutcome::Victory { .. } => Some(Faction::Player),
            BattleOutcome::Defeat { .. } => Some(Faction::Hostile),
            BattleOutcome::InProgress => None,
        };
        self.metrics.final_state_hash = sim.state_hash();
        for (name, side) in &mut self.metrics.factions {
            side.units_remaining = sim
                .board()
                .units()
                .filter(|u| u.faction.name() == name)
                .count() as u32;
        }
        self.metrics
    }

    fn side_mut(&mut self, unit: UnitId) -> Option<&mut FactionMetrics> {
        let faction = *self.roster.get(&unit)?;
        self.metrics.factions.get_mut(faction.name())
    }
}

/// Aggregate statistics over many battles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Battles included.
    pub total_games: u32,
    /// Battles won by the player side.
    pub victories: u32,
    /// Battles won by the hostile side.
    pub defeats: u32,
    /// Battles that hit the tick limit.
    pub timeouts: u32,
    /// Victories over all battles.
    pub player_win_rate: f64,
    /// Mean duration in ticks.
    pub avg_duration_ticks: f64,
    /// Mean damage per attack across all battles and factions.
    pub avg_damage_per_attack: f64,
    /// Share of attacks that dealt no damage.
    pub blocked_attack_rate: f64,
}

impl BatchSummary {
    /// Summarize a set of battles.
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }
        let mut summary = Self {
            total_games: games.len() as u32,
            ..Self::default()
        };
        let mut ticks = 0u64;
        let mut attacks = 0u64;
        let mut blocked = 0u64;
        let mut damage = 0u64;

        for game in games {
            match game.outcome {
                BattleOutcome::Victory { .. } => summary.victories += 1,
                BattleOutcome::Defeat { .. } => summary.defeats += 1,
                BattleOutcome::InProgress => summary.timeouts += 1,
            }
            ticks += game.duration_ticks;
            for side in game.factions.values() {
                attacks += u64::from(side.attacks);
                blocked += u64::from(side.blocked_attacks);
                damage += side.damage_dealt;
            }
        }

        let n = f64::from(summary.total_games);
        summary.player_win_rate = f64::from(summary.victories) / n;
        summary.avg_duration_ticks = ticks as f64 / n;
        if attacks > 0 {
            summary.avg_damage_per_attack = damage as f64 / attacks as f64;
            summary.blocked_attack_rate = blocked as f64 / attacks as f64;
        }
        summary
    }
}
