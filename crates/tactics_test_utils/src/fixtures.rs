//! Test fixtures and helpers.
//!
//! Pre-built boards, unit templates and simulations for consistent testing.

use tactics_core::agent::AgentConfig;
use tactics_core::board::Board;
use tactics_core::config::SimConfig;
use tactics_core::hex::{HexCoord, HexDirection};
use tactics_core::simulation::Simulation;
use tactics_core::unit::{Controller, Faction, UnitId, UnitSpawn};

/// Configuration for tests: no pacing pause, stock everything else.
#[must_use]
pub fn headless_config() -> SimConfig {
    SimConfig {
        agent: AgentConfig::instant(),
        ..SimConfig::default()
    }
}

/// A player-controlled guard on `(col, row)` with stock stats.
#[must_use]
pub fn guard(col: i32, row: i32) -> UnitSpawn {
    UnitSpawn {
        name: "Guard".to_string(),
        faction: Faction::Player,
        controller: Controller::PlayerControlled,
        position: HexCoord::new(col, row),
        ..UnitSpawn::default()
    }
}

/// An agent-controlled hostile on `(col, row)` with stock stats.
#[must_use]
pub fn raider(col: i32, row: i32) -> UnitSpawn {
    UnitSpawn {
        name: "Raider".to_string(),
        faction: Faction::Hostile,
        controller: Controller::AgentControlled,
        position: HexCoord::new(col, row),
        facing: HexDirection::South,
        ..UnitSpawn::default()
    }
}

/// Builder-style tweaks on spawn templates.
pub trait SpawnExt {
    /// Set attack and defense.
    #[must_use]
    fn with_stats(self, attack: i32, defense: i32) -> Self;
    /// Set the starting facing.
    #[must_use]
    fn facing(self, facing: HexDirection) -> Self;
    /// Start with `hp` hit points.
    #[must_use]
    fn with_hp(self, hp: u32) -> Self;
    /// Hand the unit to the agent controller.
    #[must_use]
    fn agent(self) -> Self;
    /// Take away the unit's ability to attack.
    #[must_use]
    fn unarmed(self) -> Self;
}

impl SpawnExt for UnitSpawn {
    fn with_stats(mut self, attack: i32, defense: i32) -> Self {
        self.attack = attack;
        self.defense = defense;
        self
    }

    fn facing(mut self, facing: HexDirection) -> Self {
        self.facing = facing;
        self
    }

    fn with_hp(mut self, hp: u32) -> Self {
        self.hp = Some(hp);
        self
    }

    fn agent(mut self) -> Self {
        self.controller = Controller::AgentControlled;
        self
    }

    fn unarmed(mut self) -> Self {
        self.can_attack = false;
        self
    }
}

/// Build a board and spawn every template, returning the assigned ids.
///
/// # Panics
///
/// Panics if a template cannot be placed.
#[must_use]
pub fn board_with(width: i32, height: i32, spawns: Vec<UnitSpawn>) -> (Board, Vec<UnitId>) {
    let mut board = Board::new(width, height);
    let ids = spawns
        .into_iter()
        .map(|spawn| board.spawn(spawn).expect("fixture unit should spawn"))
        .collect();
    (board, ids)
}

/// Two lines of four agent units facing each other across a 12×12 board.
///
/// Both sides are agent controlled so the match plays itself.
#[must_use]
pub fn skirmish_board() -> Board {
    let mut spawns = Vec::new();
    for col in [3, 5, 7, 9] {
        spawns.push(guard(col, 2).facing(HexDirection::North).agent());
        spawns.push(raider(col, 9));
    }
    board_with(12, 12, spawns).0
}

/// An autoplaying skirmish simulation.
///
/// # Panics
///
/// Panics if the stock configuration does not validate.
#[must_use]
pub fn skirmish(seed: u64) -> Simulation {
    Simulation::with_board(skirmish_board(), headless_config(), seed)
        .expect("headless config should validate")
}

/// A simulation with one guard and one raider standing next to each other.
///
/// The guard is on `(4, 4)` facing North, the raider right in front of it on
/// `(4, 5)` facing away.
///
/// # Panics
///
/// Panics if the stock configuration does not validate.
#[must_use]
pub fn duel() -> (Simulation, UnitId, UnitId) {
    let (board, ids) = board_with(
        10,
        10,
        vec![guard(4, 4), raider(4, 5).facing(HexDirection::North)],
    );
    let sim = Simulation::with_board(board, headless_config(), 0)
        .expect("headless config should validate");
    (sim, ids[0], ids[1])
}
