//! Scenario loading and configuration.
//!
//! A scenario is a RON file naming the simulation settings and the units
//! placed on the board at the start of a battle. Building a scenario always
//! produces a fresh [`Board`]; nothing carries over between battles.
//!
//! ```ron
//! (
//!     name: "Duel",
//!     config: (board: (width: 6, height: 6), agent: (decision_pause: false)),
//!     units: [
//!         (name: "Guard", faction: Player, position: (col: 2, row: 2),
//!          max_hp: 10, attack: 4, defense: 2),
//!         (name: "Raider", faction: Hostile, controller: AgentControlled,
//!          position: (col: 2, row: 4), facing: South,
//!          max_hp: 10, attack: 4, defense: 2),
//!     ],
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tactics_core::board::{Board, BoardConfig};
use tactics_core::config::SimConfig;
use tactics_core::error::GameError;
use tactics_core::hex::{HexCoord, HexDirection};
use tactics_core::simulation::Simulation;
use tactics_core::unit::{Controller, Faction, UnitSpawn};

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario parsed but cannot describe a battle.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] GameError),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Simulation settings, board size included.
    #[serde(default)]
    pub config: SimConfig,
    /// Seed for the agent controller's random stream.
    #[serde(default)]
    pub seed: u64,
    /// Tick limit for autoplay; `None` leaves it to the caller.
    #[serde(default)]
    pub max_ticks: Option<u64>,
    /// Starting units, spawned in order.
    pub units: Vec<UnitSpawn>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Resolve a scenario argument: a built-in name or a path to a RON file.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match name_or_path {
            "skirmish" => Ok(Self::skirmish()),
            "duel" => Ok(Self::duel()),
            path => Self::load(path),
        }
    }

    /// Two lines of four on the stock 30×30 board, twenty rows apart.
    #[must_use]
    pub fn skirmish() -> Self {
        let mut units = Vec::new();
        for (i, col) in (11..19).step_by(2).enumerate() {
            units.push(placement(
                format!("Guard {}", i + 1),
                Faction::Player,
                HexCoord::new(col, 5),
                HexDirection::North,
            ));
            units.push(placement(
                format!("Raider {}", i + 1),
                Faction::Hostile,
                HexCoord::new(col, 24),
                HexDirection::South,
            ));
        }
        Self {
            name: "Skirmish".to_string(),
            description: "Four guards against four raiders across an open field".to_string(),
            config: SimConfig::default(),
            seed: 0,
            max_ticks: Some(u64::from(tactics_core::config::TICK_RATE) * 60 * 30),
            units,
        }
    }

    /// One guard and one raider on a small board, without decision pauses.
    #[must_use]
    pub fn duel() -> Self {
        let mut config = SimConfig {
            board: BoardConfig {
                width: 8,
                height: 8,
            },
            ..SimConfig::default()
        };
        config.agent.decision_pause = false;
        Self {
            name: "Duel".to_string(),
            description: "A single guard holds against one raider".to_string(),
            config,
            seed: 0,
            max_ticks: Some(u64::from(tactics_core::config::TICK_RATE) * 60 * 10),
            units: vec![
                UnitSpawn {
                    controller: Controller::PlayerControlled,
                    ..placement(
                        "Guard".to_string(),
                        Faction::Player,
                        HexCoord::new(3, 2),
                        HexDirection::North,
                    )
                },
                placement(
                    "Raider".to_string(),
                    Faction::Hostile,
                    HexCoord::new(3, 5),
                    HexDirection::South,
                ),
            ],
        }
    }

    /// Hand every unit to the agent controller, for unattended play.
    #[must_use]
    pub fn with_autopilot(mut self) -> Self {
        for unit in &mut self.units {
            unit.controller = Controller::AgentControlled;
        }
        self
    }

    /// Build a fresh board holding the scenario's units.
    pub fn board(&self) -> Result<Board, ScenarioError> {
        let mut board = Board::from_config(&self.config.board)?;
        for spawn in &self.units {
            board.spawn(spawn.clone())?;
        }
        Ok(board)
    }

    /// Build a simulation seeded with the scenario's own seed.
    pub fn build(&self) -> Result<Simulation, ScenarioError> {
        self.build_with_seed(self.seed)
    }

    /// Build a simulation with an explicit seed.
    pub fn build_with_seed(&self, seed: u64) -> Result<Simulation, ScenarioError> {
        let board = self.board()?;
        Ok(Simulation::with_board(board, self.config.clone(), seed)?)
    }
}

fn placement(name: String, faction: Faction, position: HexCoord, facing: HexDirection) -> UnitSpawn {
    UnitSpawn {
        name,
        faction,
        controller: Controller::AgentControlled,
        position,
        facing,
        ..UnitSpawn::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario() {
        let scenario = Scenario::default();
        assert_eq!(scenario.units.len(), 8);
        assert_eq!(scenario.config.board.width, 30);

        let sim = scenario.build().unwrap();
        assert_eq!(sim.board().count_units(Faction::Player), 4);
        assert_eq!(sim.board().count_units(Faction::Hostile), 4);
    }

    #[test]
    fn test_duel_has_a_player_unit() {
        let scenario = Scenario::duel();
        let sim = scenario.build().unwrap();
        assert!(sim.board().units().any(|u| !u.is_agent_controlled()));
        assert!(!sim.config().agent.decision_pause);
    }

    #[test]
    fn test_autopilot_takes_over_everyone() {
        let scenario = Scenario::duel().with_autopilot();
        assert!(scenario
            .units
            .iter()
            .all(|u| u.controller == Controller::AgentControlled));
    }

    #[test]
    fn test_parse_minimal_ron() {
        let ron = r#"(
            name: "Tiny",
            config: (board: (width: 4, height: 4)),
            units: [
                (name: "Guard", faction: Player, position: (col: 1, row: 1),
                 max_hp: 5, attack: 3, defense: 1),
            ],
        )"#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "Tiny");
        assert_eq!(scenario.seed, 0);
        assert_eq!(scenario.max_ticks, None);
        assert_eq!(scenario.config.turn_duration_ms, 10_000);
        assert_eq!(scenario.units[0].controller, Controller::PlayerControlled);
        assert!(scenario.units[0].can_move);
    }

    #[test]
    fn test_parse_error() {
        let err = Scenario::from_ron_str("(name: )").unwrap_err();
        assert!(matches!(err, ScenarioError::ParseError(_)));
    }

    #[test]
    fn test_overlapping_units_rejected_on_build() {
        let mut scenario = Scenario::duel();
        scenario.units[1].position = scenario.units[0].position;
        let err = scenario.build().unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Invalid(GameError::TileOccupied { .. })
        ));
    }

    #[test]
    fn test_out_of_bounds_unit_rejected() {
        let mut scenario = Scenario::duel();
        scenario.units[0].position = HexCoord::new(20, 20);
        assert!(matches!(
            scenario.board(),
            Err(ScenarioError::Invalid(GameError::OutOfBounds(_)))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duel.ron");
        let text = ron::ser::to_string_pretty(&Scenario::duel(), ron::ser::PrettyConfig::default())
            .unwrap();
        std::fs::write(&path, text).unwrap();

        let loaded = Scenario::load(&path).unwrap();
        assert_eq!(loaded, Scenario::duel());
    }

    #[test]
    fn test_missing_file() {
        let err = Scenario::load("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }

    #[test]
    fn test_bundled_scenarios_parse() {
        for text in [
            include_str!("../scenarios/skirmish.ron"),
            include_str!("../scenarios/ambush.ron"),
        ] {
            let scenario = Scenario::from_ron_str(text).unwrap();
            scenario.build().unwrap();
        }
    }
}
