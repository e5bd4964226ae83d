//! # Tactics Core
//!
//! Deterministic simulation core for real-time hex tactics.
//!
//! Units stand on an offset hex grid and act on individual cooldowns instead
//! of alternating turns. This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (agents draw from a seeded stream)
//! - No floating-point math (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`hex`] - Grid coordinates, facings and adjacency
//! - [`board`] - Registry of live units with an occupancy index
//! - [`unit`] - Unit stats, cooldowns and recent-hit history
//! - [`actions`] - Legal tiles plus the move and attack commands
//! - [`combat`] - Backstab, flanking and recent-hit damage resolution
//! - [`agent`] - Autonomous controller for agent units
//! - [`simulation`] - Tick loop, player command surface, end-of-match check
//! - [`config`] - Serializable simulation settings
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod actions;
pub mod agent;
pub mod board;
pub mod combat;
pub mod config;
pub mod error;
pub mod hex;
pub mod math;
pub mod simulation;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::actions::{AttackReport, MoveOutcome};
    pub use crate::agent::{AgentConfig, AgentController, Decision};
    pub use crate::board::{Board, BoardConfig};
    pub use crate::combat::{AttackOutcome, CombatRules};
    pub use crate::config::SimConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::hex::{HexCoord, HexDirection};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::simulation::{BattleOutcome, SimEvent, Simulation, TickEvents, UnitCommand};
    pub use crate::unit::{
        ActionAxis, Controller, Faction, Health, Readiness, Unit, UnitId, UnitSpawn,
    };
}
