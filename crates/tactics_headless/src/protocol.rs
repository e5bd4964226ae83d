//! JSON protocol for headless battle control.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Events, state and replies
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0",...}`
//! 2. Controller sends commands as JSON lines
//! 3. Runner answers every command with one or more responses
//! 4. When one side is wiped out, outputs `{"type":"game_over",...}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","scenario":"Duel","tick":0}
//! -> {"cmd":"query"}
//! <- {"type":"state","tick":0,"now":0.0,"units":[...],"outcome":{"result":"in_progress"},...}
//! -> {"cmd":"move","unit":1,"col":3,"row":3}
//! <- {"type":"events","tick":0,"now":0.0,"events":[{"type":"moved",...}]}
//! -> {"cmd":"tick","count":200}
//! <- {"type":"events","tick":200,"now":10.0,"events":[...]}
//! -> {"cmd":"preview","unit":1,"col":3,"row":4}
//! <- {"type":"preview","summary":"unit 1 -> unit 2: attack=4+0 ...","breakdown":{...}}
//! ```

use serde::{Deserialize, Serialize};

use tactics_core::combat::AttackOutcome;
use tactics_core::hex::{HexCoord, HexDirection};
use tactics_core::simulation::{BattleOutcome, SimEvent, Simulation};
use tactics_core::unit::{Controller, Faction, Unit, UnitId};

/// Protocol version reported in the ready message.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance simulation by N ticks (default: 1).
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Query current battle state without advancing time.
    Query,

    /// Move a player unit onto an adjacent free tile.
    Move { unit: UnitId, col: i32, row: i32 },

    /// Attack the opponent on an adjacent tile.
    Attack { unit: UnitId, col: i32, row: i32 },

    /// Show what an attack would do without committing it.
    ///
    /// With `legal_only` the target must be one of the unit's current legal
    /// attack tiles, as an attack HUD would require.
    Preview {
        unit: UnitId,
        col: i32,
        row: i32,
        #[serde(default)]
        legal_only: bool,
    },

    /// Set game speed multiplier (0 pauses).
    Speed { multiplier: f64 },

    /// Rebuild the scenario's starting board and restart the clock.
    Reset,

    /// Report the current state hash (for determinism verification).
    Hash,

    /// Quit the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        version: String,
        scenario: String,
        tick: u64,
    },

    /// Acknowledgment of a command.
    Ack { cmd: String },

    /// Error processing a command. Nothing changed.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Events produced by ticks or by a player command.
    Events {
        tick: u64,
        now: f64,
        events: Vec<SimEvent>,
    },

    /// Current battle state.
    State {
        tick: u64,
        now: f64,
        time_scale: f64,
        units: Vec<UnitState>,
        outcome: BattleOutcome,
        hash: u64,
    },

    /// Attack breakdown from a preview.
    Preview {
        summary: String,
        breakdown: AttackOutcome,
    },

    /// Battle has ended.
    GameOver { outcome: BattleOutcome, tick: u64 },

    /// State hash for determinism verification.
    StateHash { tick: u64, hash: u64 },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// State of a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitState {
    pub id: UnitId,
    pub name: String,
    pub faction: Faction,
    pub controller: Controller,
    pub col: i32,
    pub row: i32,
    pub facing: HexDirection,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: i32,
    pub defense: i32,
    pub recent_hits: usize,
    pub ready: bool,
    /// Legal destinations; only listed for player-controlled units.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub move_tiles: Vec<HexCoord>,
    /// Legal targets; only listed for player-controlled units.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attack_tiles: Vec<HexCoord>,
}

impl UnitState {
    /// Snapshot one unit as the simulation sees it now.
    pub fn capture(sim: &Simulation, unit: &Unit) -> Self {
        let (move_tiles, attack_tiles) = if unit.is_agent_controlled() {
            (Vec::new(), Vec::new())
        } else {
            (
                sim.legal_move_tiles(unit.id),
                sim.legal_attack_tiles(unit.id),
            )
        };
        Self {
            id: unit.id,
            name: unit.name.clone(),
            faction: unit.faction,
            controller: unit.controller,
            col: unit.position.col,
            row: unit.position.row,
            facing: unit.facing,
            hp: unit.health.current,
            max_hp: unit.health.max,
            attack: unit.attack,
            defense: unit.defense,
            recent_hits: unit.recent_hit_count(),
            ready: sim.is_ready(unit.id),
            move_tiles,
            attack_tiles,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(scenario: &str, tick: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            scenario: scenario.to_string(),
            tick,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Events at the simulation's current time.
    pub fn events(sim: &Simulation, events: Vec<SimEvent>) -> Self {
        Self::Events {
            tick: sim.get_tick(),
            now: sim.now().to_num(),
            events,
        }
    }

    /// Full state snapshot.
    pub fn state(sim: &Simulation) -> Self {
        Self::State {
            tick: sim.get_tick(),
            now: sim.now().to_num(),
            time_scale: sim.time_scale().to_num(),
            units: sim
                .board()
                .units()
                .map(|unit| UnitState::capture(sim, unit))
                .collect(),
            outcome: sim.outcome(),
            hash: sim.state_hash(),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"type":"error","message":"Serialization failed: {}"}}"#,
                e
            )
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Query => "query",
            Self::Move { .. } => "move",
            Self::Attack { .. } => "attack",
            Self::Preview { .. } => "preview",
            Self::Speed { .. } => "speed",
            Self::Reset => "reset",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}
