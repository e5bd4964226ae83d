//! Error types for the tactics simulation.
//!
//! Every command validates its preconditions before touching state, so an
//! `Err` always means nothing changed.

use thiserror::Error;

use crate::hex::HexCoord;
use crate::unit::UnitId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// No live unit has this identifier.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// Coordinate outside the board.
    #[error("Tile {0} is outside the board")]
    OutOfBounds(HexCoord),

    /// Another unit already stands on the tile.
    #[error("Tile {tile} is already occupied by unit {occupant}")]
    TileOccupied {
        /// Requested tile.
        tile: HexCoord,
        /// Unit currently on it.
        occupant: UnitId,
    },

    /// Unit parameters that cannot describe a live unit.
    #[error("Invalid unit '{name}': {reason}")]
    InvalidUnit {
        /// Unit name from the spawn request.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Move to a tile outside the unit's legal move tiles.
    #[error("Unit {unit} cannot move to {target}")]
    IllegalMove {
        /// Moving unit.
        unit: UnitId,
        /// Requested destination.
        target: HexCoord,
    },

    /// Attack on a tile outside the unit's legal attack tiles.
    #[error("Unit {unit} cannot attack {target}")]
    IllegalAttack {
        /// Attacking unit.
        unit: UnitId,
        /// Requested target tile.
        target: HexCoord,
    },

    /// Facing between two tiles is undefined (same or non-adjacent tiles).
    #[error("No facing from {from} to {to}: tiles must be adjacent")]
    DegenerateGeometry {
        /// Attacker tile.
        from: HexCoord,
        /// Defender tile.
        to: HexCoord,
    },

    /// A command was issued for a unit driven by the agent controller.
    #[error("Unit {0} is not player controlled")]
    NotPlayerControlled(UnitId),

    /// Configuration values that cannot run a simulation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
