//! Autonomous controller for agent-driven units.
//!
//! Each tick the simulation asks the controller once per agent unit, in id
//! order. The controller:
//! 1. Skips dead or missing units
//! 2. Waits out a short random pause after the unit becomes able to act
//! 3. Attacks an adjacent opponent if it can, preferring the one in front
//! 4. Otherwise holds position next to an opponent, or steps toward one
//!
//! All randomness comes from one seeded [`ChaCha8Rng`], so a simulation
//! replays identically from the same seed.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::actions::{AttackReport, MoveOutcome};
use crate::board::Board;
use crate::combat::CombatRules;
use crate::error::Result;
use crate::hex::HexCoord;
use crate::math::{Fixed, Vec2Fixed, HALF};
use crate::unit::UnitId;

/// Default chance, in percent, that a move picks a random candidate tile.
pub const DEFAULT_RANDOM_MOVE_PERCENT: u32 = 40;

/// Agent tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Wait a random delay after a unit becomes ready before it acts.
    pub decision_pause: bool,
    /// Chance in percent that a move ignores facing and picks at random.
    pub random_move_percent: u32,
}

impl AgentConfig {
    /// Configuration without the pacing delay, for headless and test runs.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            decision_pause: false,
            random_move_percent: DEFAULT_RANDOM_MOVE_PERCENT,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            decision_pause: true,
            random_move_percent: DEFAULT_RANDOM_MOVE_PERCENT,
        }
    }
}

/// What an agent chose to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Step onto the tile.
    Move(HexCoord),
    /// Strike the unit on the tile.
    Attack(HexCoord),
}

/// Committed result of an agent action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionReport {
    /// The unit moved.
    Moved(MoveOutcome),
    /// The unit attacked.
    Attacked(AttackReport),
}

#[derive(Debug, Clone, Copy, Default)]
struct Pacing {
    pause_until: Option<Fixed>,
}

/// Decision procedure for every agent-controlled unit on a board.
#[derive(Debug, Clone)]
pub struct AgentController {
    config: AgentConfig,
    turn_duration: Fixed,
    rng: ChaCha8Rng,
    pacing: BTreeMap<UnitId, Pacing>,
}

impl AgentController {
    /// Create a controller with its own seeded random stream.
    #[must_use]
    pub fn new(config: AgentConfig, turn_duration: Fixed, seed: u64) -> Self {
        Self {
            config,
            turn_duration,
            rng: ChaCha8Rng::seed_from_u64(seed),
            pacing: BTreeMap::new(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Forget all per-unit pacing state.
    pub fn clear_memory(&mut self) {
        self.pacing.clear();
    }

    /// Choose an action for one unit, or `None` to do nothing this tick.
    pub fn decide(&mut self, board: &Board, id: UnitId, now: Fixed) -> Option<Decision> {
        let unit = board.unit(id)?;
        if unit.is_dead() {
            return None;
        }

        if self.config.decision_pause && self.is_pausing(board, id, now) {
            return None;
        }

        let origin = unit.position.world_position();
        let forward = unit.facing.world_vector();

        let targets = board.legal_attack_tiles(id, now);
        if let Some(target) = choose_front_tile(origin, forward, &targets) {
            tracing::trace!(unit = id, target = %target, "Agent attacks");
            return Some(Decision::Attack(target));
        }

        if !unit.can_move_now(now) {
            return None;
        }
        if !board.opponent_tiles(unit.faction, unit.position).is_empty() {
            // Hold the line until the attack comes off cooldown.
            return None;
        }

        let mut candidates = board.legal_move_tiles(id, now);
        if candidates.is_empty() {
            return None;
        }
        let engaging: Vec<HexCoord> = candidates
            .iter()
            .copied()
            .filter(|&tile| !board.opponent_tiles(unit.faction, tile).is_empty())
            .collect();
        if !engaging.is_empty() {
            candidates = engaging;
        }

        let target = if self.rng.gen_range(0..100) < self.config.random_move_percent {
            candidates[self.rng.gen_range(0..candidates.len())]
        } else {
            choose_front_tile(origin, forward, &candidates)?
        };
        tracing::trace!(unit = id, target = %target, "Agent moves");
        Some(Decision::Move(target))
    }

    /// Decide and apply through the same commands a player uses.
    ///
    /// # Errors
    ///
    /// Propagates command errors. A decision is always legal when it is
    /// made, so an error here means the board changed in between.
    pub fn act(
        &mut self,
        board: &mut Board,
        id: UnitId,
        now: Fixed,
        rules: &CombatRules,
    ) -> Result<Option<ActionReport>> {
        let report = match self.decide(board, id, now) {
            None => None,
            Some(Decision::Move(target)) => Some(ActionReport::Moved(board.move_to(
                id,
                target,
                now,
                self.turn_duration,
            )?)),
            Some(Decision::Attack(target)) => Some(ActionReport::Attacked(board.attack_to(
                id,
                target,
                now,
                self.turn_duration,
                rules,
            )?)),
        };
        Ok(report)
    }

    /// Track readiness transitions and report whether the unit must wait.
    fn is_pausing(&mut self, board: &Board, id: UnitId, now: Fixed) -> bool {
        if !board.is_ready(id, now) {
            self.pacing.remove(&id);
            return false;
        }
        let pause_until = match self.pacing.get(&id).and_then(|p| p.pause_until) {
            Some(until) => until,
            None => {
                let until = now.saturating_add(self.draw_pause());
                self.pacing.insert(
                    id,
                    Pacing {
                        pause_until: Some(until),
                    },
                );
                until
            }
        };
        now < pause_until
    }

    /// Uniform delay in `[min(1, turn/2), turn/2]` seconds.
    fn draw_pause(&mut self) -> Fixed {
        let high = self.turn_duration * HALF;
        let low = high.min(Fixed::ONE);
        Fixed::from_bits(self.rng.gen_range(low.to_bits()..=high.to_bits()))
    }
}

/// Pick the candidate needing the least rotation from `direction`.
///
/// Angles are compared through their cosine, so the largest cosine wins.
/// Ties go to the earliest candidate. A candidate at `origin` itself counts
/// as straight ahead.
#[must_use]
pub fn choose_front_tile(
    origin: Vec2Fixed,
    direction: Vec2Fixed,
    candidates: &[HexCoord],
) -> Option<HexCoord> {
    let mut best: Option<(Fixed, HexCoord)> = None;
    for &tile in candidates {
        let offset = tile.world_position() - origin;
        let cos = if offset.is_zero() {
            Fixed::ONE
        } else {
            offset.cos_angle_to(direction).unwrap_or(-Fixed::ONE)
        };
        if best.map_or(true, |(top, _)| cos > top) {
            best = Some((cos, tile));
        }
    }
    best.map(|(_, tile)| tile)
}
