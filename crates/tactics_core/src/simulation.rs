//! Core simulation loop.
//!
//! The simulation owns the board, the clock and the agent controller, and
//! advances them at a fixed tick rate. Players act through
//! [`Simulation::issue`]; agent units act inside [`Simulation::tick`]. Both
//! paths end in the same board commands.
//!
//! # Determinism
//!
//! - Time is fixed-point and advanced by whole scaled ticks
//! - Units are visited in ascending id order
//! - The only randomness is the agent's seeded stream
//!
//! Two simulations built from the same board, configuration and seed
//! produce the same [`state_hash`](Simulation::state_hash) after every tick.
//!
//! # Example
//!
//! ```
//! use tactics_core::config::SimConfig;
//! use tactics_core::hex::HexCoord;
//! use tactics_core::simulation::{Simulation, UnitCommand};
//! use tactics_core::unit::{Faction, UnitSpawn};
//!
//! let mut sim = Simulation::new(SimConfig::default(), 7).unwrap();
//! let guard = sim
//!     .spawn(UnitSpawn {
//!         position: HexCoord::new(3, 3),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! sim.issue(guard, UnitCommand::MoveTo(HexCoord::new(3, 4))).unwrap();
//! sim.tick();
//! assert_eq!(sim.unit_at(HexCoord::new(3, 4)).map(|u| u.id), Some(guard));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::actions::{AttackReport, MoveOutcome};
use crate::agent::{ActionReport, AgentController};
use crate::board::Board;
use crate::combat::AttackOutcome;
use crate::config::SimConfig;
use crate::error::{GameError, Result};
use crate::hex::HexCoord;
use crate::math::{fixed_serde, Fixed};
use crate::unit::{Faction, Unit, UnitId, UnitSpawn};

/// Fastest accepted game speed multiplier.
pub const MAX_TIME_SCALE: i32 = 100;

pub use crate::config::TICK_RATE;

/// Something observable that happened on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    /// A unit stepped to a neighboring tile.
    Moved(MoveOutcome),
    /// A unit attacked.
    Attacked(AttackOutcome),
    /// A unit's hit points reached zero and it left the board.
    Died {
        /// The dead unit.
        unit: UnitId,
        /// Tile it died on.
        at: HexCoord,
    },
}

/// Events generated during one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Tick number after advancing.
    pub tick: u64,
    /// Simulation time after advancing, in seconds.
    #[serde(with = "fixed_serde")]
    pub now: Fixed,
    /// Agent actions in the order they happened.
    pub events: Vec<SimEvent>,
}

/// A player order for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitCommand {
    /// Step onto an adjacent free tile.
    MoveTo(HexCoord),
    /// Attack the opponent on an adjacent tile.
    AttackTo(HexCoord),
}

/// State of the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BattleOutcome {
    /// Both sides still have units.
    InProgress,
    /// No hostile unit is left.
    Victory {
        /// Player units still alive.
        survivors: usize,
    },
    /// No player unit is left.
    Defeat {
        /// Hostile units still alive.
        survivors: usize,
    },
}

impl BattleOutcome {
    /// Whether the match is over.
    #[must_use]
    pub const fn is_decided(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// The tactics simulation.
///
/// # System Execution Order
///
/// Each tick:
/// 1. **Clock** - advance by one tick times the time scale
/// 2. **History** - drop expired recent hits on every unit
/// 3. **Agents** - each agent unit decides and acts, in id order; later
///    units see earlier units' actions
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    board: Board,
    agent: AgentController,
    seed: u64,
    tick: u64,
    /// Elapsed ticks weighted by the time scale at each tick.
    scaled_ticks: Fixed,
    time_scale: Fixed,
}

impl Simulation {
    /// Create a simulation with an empty board.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the configuration does not
    /// validate.
    pub fn new(config: SimConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let board = Board::from_config(&config.board)?;
        Ok(Self::assemble(board, config, seed))
    }

    /// Create a simulation around an already populated board.
    ///
    /// The board's own dimensions win over `config.board`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the configuration does not
    /// validate.
    pub fn with_board(board: Board, config: SimConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(board, config, seed))
    }

    fn assemble(board: Board, config: SimConfig, seed: u64) -> Self {
        let agent = AgentController::new(config.agent, config.turn_duration(), seed);
        Self {
            config,
            board,
            agent,
            seed,
            tick: 0,
            scaled_ticks: Fixed::ZERO,
            time_scale: Fixed::ONE,
        }
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Current simulation time in seconds.
    #[must_use]
    pub fn now(&self) -> Fixed {
        self.scaled_ticks / Fixed::from_num(self.config.tick_rate)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Seed the agent stream was created from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Read access to the board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Place a unit on the board.
    ///
    /// # Errors
    ///
    /// Same as [`Board::spawn`].
    pub fn spawn(&mut self, spawn: UnitSpawn) -> Result<UnitId> {
        self.board.spawn(spawn)
    }

    /// Game speed multiplier.
    #[must_use]
    pub const fn time_scale(&self) -> Fixed {
        self.time_scale
    }

    /// Change how much simulation time one tick covers. Zero pauses the
    /// clock; ticks still run.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] for a negative scale or one above
    /// [`MAX_TIME_SCALE`].
    pub fn set_time_scale(&mut self, scale: Fixed) -> Result<()> {
        if scale < Fixed::ZERO || scale > Fixed::from_num(MAX_TIME_SCALE) {
            return Err(GameError::InvalidConfig(format!(
                "time scale must be between 0 and {MAX_TIME_SCALE}, got {scale}"
            )));
        }
        tracing::debug!(scale = %scale, "Time scale changed");
        self.time_scale = scale;
        Ok(())
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> TickEvents {
        self.tick += 1;
        // The clock stops at the end of the fixed-point range.
        self.scaled_ticks = self.scaled_ticks.saturating_add(self.time_scale);
        let now = self.now();
        let turn = self.config.turn_duration();

        for unit in self.board.units_mut() {
            unit.advance_time(now, turn);
        }

        let mut events = Vec::new();
        for id in self.board.sorted_ids() {
            // Skips units killed earlier in this tick.
            let Some(unit) = self.board.unit(id) else {
                continue;
            };
            if !unit.is_agent_controlled() {
                continue;
            }
            match self.agent.act(&mut self.board, id, now, &self.config.combat) {
                Ok(Some(ActionReport::Moved(outcome))) => events.push(SimEvent::Moved(outcome)),
                Ok(Some(ActionReport::Attacked(report))) => push_attack(&mut events, report),
                Ok(None) => {}
                Err(err) => tracing::warn!(unit = id, error = %err, "Agent action rejected"),
            }
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        TickEvents {
            tick: self.tick,
            now,
            events,
        }
    }

    /// Apply a player command at the current time.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] for an unknown unit,
    /// [`GameError::NotPlayerControlled`] for an agent unit, and the
    /// command's own error if it is illegal. Nothing changes on error.
    pub fn issue(&mut self, id: UnitId, command: UnitCommand) -> Result<Vec<SimEvent>> {
        let unit = self.board.get(id)?;
        if unit.is_agent_controlled() {
            return Err(GameError::NotPlayerControlled(id));
        }

        let now = self.now();
        let turn = self.config.turn_duration();
        let mut events = Vec::new();
        match command {
            UnitCommand::MoveTo(target) => {
                let outcome = self.board.move_to(id, target, now, turn)?;
                events.push(SimEvent::Moved(outcome));
            }
            UnitCommand::AttackTo(target) => {
                let report = self
                    .board
                    .attack_to(id, target, now, turn, &self.config.combat)?;
                push_attack(&mut events, report);
            }
        }
        Ok(events)
    }

    /// Tiles the unit may move to now.
    #[must_use]
    pub fn legal_move_tiles(&self, id: UnitId) -> Vec<HexCoord> {
        self.board.legal_move_tiles(id, self.now())
    }

    /// Tiles the unit may attack now.
    #[must_use]
    pub fn legal_attack_tiles(&self, id: UnitId) -> Vec<HexCoord> {
        self.board.legal_attack_tiles(id, self.now())
    }

    /// Whether the unit could act right now.
    #[must_use]
    pub fn is_ready(&self, id: UnitId) -> bool {
        self.board.is_ready(id, self.now())
    }

    /// The unit on a tile, if any.
    #[must_use]
    pub fn unit_at(&self, tile: HexCoord) -> Option<&Unit> {
        self.board.unit_at(tile)
    }

    /// Get a unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.board.unit(id)
    }

    /// Attack breakdown for the HUD without committing it.
    ///
    /// # Errors
    ///
    /// Same as [`Board::preview_attack`].
    pub fn preview_attack(&self, id: UnitId, target: HexCoord) -> Result<AttackOutcome> {
        self.board.preview_attack(id, target, &self.config.combat)
    }

    /// Attack breakdown only for a tile the unit could attack right now.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::IllegalAttack`] when `target` is not among
    /// [`legal_attack_tiles`](Self::legal_attack_tiles), otherwise the same
    /// as [`Board::preview_attack`].
    pub fn preview_legal_attack(&self, id: UnitId, target: HexCoord) -> Result<AttackOutcome> {
        if !self.legal_attack_tiles(id).contains(&target) {
            return Err(GameError::IllegalAttack { unit: id, target });
        }
        self.preview_attack(id, target)
    }

    /// Whether either side has been wiped out.
    ///
    /// Victory is checked first, so an empty board counts as a victory.
    #[must_use]
    pub fn outcome(&self) -> BattleOutcome {
        let hostiles = self.board.count_units(Faction::Hostile);
        let players = self.board.count_units(Faction::Player);
        if hostiles == 0 {
            BattleOutcome::Victory { survivors: players }
        } else if players == 0 {
            BattleOutcome::Defeat {
                survivors: hostiles,
            }
        } else {
            BattleOutcome::InProgress
        }
    }

    /// Replace the board with a fresh scenario.
    ///
    /// The clock restarts at zero and agent pacing memory is cleared. The
    /// random stream and time scale carry on.
    pub fn reset(&mut self, board: Board) {
        self.board = board;
        self.agent.clear_memory();
        self.tick = 0;
        self.scaled_ticks = Fixed::ZERO;
        tracing::debug!(units = self.board.len(), "Simulation reset");
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.scaled_ticks.to_bits().hash(&mut hasher);

        self.board.len().hash(&mut hasher);
        for unit in self.board.units() {
            unit.id.hash(&mut hasher);
            unit.faction.hash(&mut hasher);
            unit.position.hash(&mut hasher);
            unit.facing.hash(&mut hasher);
            unit.health.hash(&mut hasher);
            unit.cooldowns.next_move_ready_at.to_bits().hash(&mut hasher);
            unit.cooldowns.next_attack_ready_at.to_bits().hash(&mut hasher);
            unit.recent_hits.len().hash(&mut hasher);
            for hit in &unit.recent_hits {
                hit.to_bits().hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}

fn push_attack(events: &mut Vec<SimEvent>, report: AttackReport) {
    let killed = report
        .defender_killed
        .then_some((report.outcome.defender, report.outcome.defender_tile));
    events.push(SimEvent::Attacked(report.outcome));
    if let Some((unit, at)) = killed {
        events.push(SimEvent::Died { unit, at });
    }
}
