//! Board registry: the authoritative set of live units.
//!
//! Units are stored by id for deterministic iteration, with a coordinate
//! index on the side for O(1) occupancy lookups. The two maps are only ever
//! changed together, which keeps the "one unit per tile" invariant.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::hex::HexCoord;
use crate::unit::{Faction, Unit, UnitId, UnitSpawn};

/// Default board width, in columns.
pub const DEFAULT_WIDTH: i32 = 30;

/// Default board height, in rows.
pub const DEFAULT_HEIGHT: i32 = 30;

/// Board dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// The registry of live units on one board.
#[derive(Debug, Clone)]
pub struct Board {
    width: i32,
    height: i32,
    units: BTreeMap<UnitId, Unit>,
    occupancy: HashMap<HexCoord, UnitId>,
    next_id: UnitId,
}

impl Board {
    /// Create an empty board.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is not positive.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0, "Board width must be positive");
        assert!(height > 0, "Board height must be positive");
        Self {
            width,
            height,
            units: BTreeMap::new(),
            occupancy: HashMap::new(),
            next_id: 1,
        }
    }

    /// Create an empty board from a configuration.
    pub fn from_config(config: &BoardConfig) -> Result<Self> {
        if config.width <= 0 || config.height <= 0 {
            return Err(GameError::InvalidConfig(format!(
                "board must be at least 1x1, got {}x{}",
                config.width, config.height
            )));
        }
        Ok(Self::new(config.width, config.height))
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Place a new unit. Fails if the tile is off the board or taken.
    pub fn spawn(&mut self, spawn: UnitSpawn) -> Result<UnitId> {
        if spawn.max_hp == 0 {
            return Err(GameError::InvalidUnit {
                name: spawn.name,
                reason: "max_hp must be positive".to_string(),
            });
        }
        match spawn.hp {
            Some(0) => {
                return Err(GameError::InvalidUnit {
                    name: spawn.name,
                    reason: "cannot spawn a dead unit".to_string(),
                });
            }
            Some(hp) if hp > spawn.max_hp => {
                return Err(GameError::InvalidUnit {
                    name: spawn.name,
                    reason: format!("hp {hp} exceeds max_hp {}", spawn.max_hp),
                });
            }
            _ => {}
        }
        if !self.is_within_bounds(spawn.position) {
            return Err(GameError::OutOfBounds(spawn.position));
        }
        if let Some(&occupant) = self.occupancy.get(&spawn.position) {
            return Err(GameError::TileOccupied {
                tile: spawn.position,
                occupant,
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        let unit = Unit::from_spawn(id, spawn);
        tracing::debug!(
            unit = id,
            name = %unit.name,
            faction = unit.faction.name(),
            tile = %unit.position,
            "Unit spawned"
        );
        self.occupancy.insert(unit.position, id);
        self.units.insert(id, unit);
        Ok(id)
    }

    /// Deregister a unit. Removing an absent unit is a no-op.
    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.units.remove(&id)?;
        self.occupancy.remove(&unit.position);
        Some(unit)
    }

    /// Remove every unit. Identifiers keep counting up.
    pub fn clear(&mut self) {
        self.units.clear();
        self.occupancy.clear();
    }

    /// Get a unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Same as [`unit`](Self::unit) but as a `Result`.
    pub fn get(&self, id: UnitId) -> Result<&Unit> {
        self.unit(id).ok_or(GameError::UnitNotFound(id))
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.units.get_mut(&id).ok_or(GameError::UnitNotFound(id))
    }

    /// The unit standing on a tile, if any.
    #[must_use]
    pub fn unit_at(&self, tile: HexCoord) -> Option<&Unit> {
        self.occupancy
            .get(&tile)
            .and_then(|id| self.units.get(id))
    }

    /// Check if a unit is registered.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    /// Number of live units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the board has no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit ids in ascending order.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<UnitId> {
        self.units.keys().copied().collect()
    }

    /// Iterate over live units in ascending id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub(crate) fn units_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.values_mut()
    }

    /// Check if a tile lies on the board.
    #[must_use]
    pub const fn is_within_bounds(&self, tile: HexCoord) -> bool {
        tile.is_within_bounds(self.width, self.height)
    }

    /// A unit may step onto the tile: on the board and empty.
    #[must_use]
    pub fn is_move_legal(&self, tile: HexCoord) -> bool {
        self.is_within_bounds(tile) && !self.occupancy.contains_key(&tile)
    }

    /// A unit of `attacker` may strike the tile: on the board and held by
    /// the other faction.
    #[must_use]
    pub fn is_attack_legal(&self, tile: HexCoord, attacker: Faction) -> bool {
        self.is_within_bounds(tile)
            && self
                .unit_at(tile)
                .is_some_and(|unit| unit.faction != attacker)
    }

    /// Number of live units in a faction.
    #[must_use]
    pub fn count_units(&self, faction: Faction) -> usize {
        self.units.values().filter(|u| u.faction == faction).count()
    }

    /// Move a unit to a new tile, keeping the occupancy index in sync.
    pub(crate) fn relocate(&mut self, id: UnitId, to: HexCoord) -> Result<HexCoord> {
        if !self.is_within_bounds(to) {
            return Err(GameError::OutOfBounds(to));
        }
        if let Some(&occupant) = self.occupancy.get(&to) {
            if occupant != id {
                return Err(GameError::TileOccupied { tile: to, occupant });
            }
        }
        let unit = self.units.get_mut(&id).ok_or(GameError::UnitNotFound(id))?;
        let from = unit.position;
        unit.position = to;
        self.occupancy.remove(&from);
        self.occupancy.insert(to, id);
        Ok(from)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_at(board: &mut Board, faction: Faction, col: i32, row: i32) -> UnitId {
        board
            .spawn(UnitSpawn {
                faction,
                position: HexCoord::new(col, row),
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn test_spawn_assigns_increasing_ids() {
        let mut board = Board::new(10, 10);
        let a = spawn_at(&mut board, Faction::Player, 1, 1);
        let b = spawn_at(&mut board, Faction::Hostile, 2, 2);
        assert!(b > a);
        assert_eq!(board.len(), 2);
        assert_eq!(board.sorted_ids(), vec![a, b]);
    }

    #[test]
    fn test_spawn_rejects_occupied_tile() {
        let mut board = Board::new(10, 10);
        let first = spawn_at(&mut board, Faction::Player, 1, 1);
        let err = board
            .spawn(UnitSpawn {
                position: HexCoord::new(1, 1),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            GameError::TileOccupied {
                tile: HexCoord::new(1, 1),
                occupant: first
            }
        );
    }

    #[test]
    fn test_spawn_rejects_out_of_bounds_and_invalid_units() {
        let mut board = Board::new(5, 5);
        assert_eq!(
            board
                .spawn(UnitSpawn {
                    position: HexCoord::new(5, 0),
                    ..Default::default()
                })
                .unwrap_err(),
            GameError::OutOfBounds(HexCoord::new(5, 0))
        );
        assert!(matches!(
            board.spawn(UnitSpawn {
                max_hp: 0,
                ..Default::default()
            }),
            Err(GameError::InvalidUnit { .. })
        ));
        assert!(matches!(
            board.spawn(UnitSpawn {
                max_hp: 5,
                hp: Some(6),
                ..Default::default()
            }),
            Err(GameError::InvalidUnit { .. })
        ));
        assert!(board.is_empty());
    }

    #[test]
    fn test_unit_at_and_remove() {
        let mut board = Board::new(10, 10);
        let id = spawn_at(&mut board, Faction::Player, 3, 4);
        assert_eq!(board.unit_at(HexCoord::new(3, 4)).map(|u| u.id), Some(id));

        assert!(board.remove(id).is_some());
        assert!(board.unit_at(HexCoord::new(3, 4)).is_none());
        assert!(board.remove(id).is_none(), "remove must be idempotent");
    }

    #[test]
    fn test_move_and_attack_legality() {
        let mut board = Board::new(10, 10);
        spawn_at(&mut board, Faction::Player, 1, 1);
        spawn_at(&mut board, Faction::Hostile, 2, 1);

        assert!(board.is_move_legal(HexCoord::new(0, 0)));
        assert!(!board.is_move_legal(HexCoord::new(1, 1)));
        assert!(!board.is_move_legal(HexCoord::new(-1, 0)));

        assert!(board.is_attack_legal(HexCoord::new(2, 1), Faction::Player));
        assert!(!board.is_attack_legal(HexCoord::new(2, 1), Faction::Hostile));
        assert!(!board.is_attack_legal(HexCoord::new(0, 0), Faction::Player));
    }

    #[test]
    fn test_count_units() {
        let mut board = Board::new(10, 10);
        spawn_at(&mut board, Faction::Player, 1, 1);
        spawn_at(&mut board, Faction::Player, 1, 2);
        spawn_at(&mut board, Faction::Hostile, 5, 5);
        assert_eq!(board.count_units(Faction::Player), 2);
        assert_eq!(board.count_units(Faction::Hostile), 1);
    }

    #[test]
    fn test_relocate_updates_index() {
        let mut board = Board::new(10, 10);
        let id = spawn_at(&mut board, Faction::Player, 1, 1);
        let other = spawn_at(&mut board, Faction::Player, 4, 4);

        assert_eq!(board.relocate(id, HexCoord::new(1, 2)), Ok(HexCoord::new(1, 1)));
        assert!(board.unit_at(HexCoord::new(1, 1)).is_none());
        assert_eq!(board.unit_at(HexCoord::new(1, 2)).map(|u| u.id), Some(id));

        assert!(matches!(
            board.relocate(id, HexCoord::new(4, 4)),
            Err(GameError::TileOccupied { occupant, .. }) if occupant == other
        ));
    }

    #[test]
    fn test_clear_keeps_id_sequence() {
        let mut board = Board::new(10, 10);
        let first = spawn_at(&mut board, Faction::Player, 1, 1);
        board.clear();
        assert!(board.is_empty());
        let second = spawn_at(&mut board, Faction::Player, 1, 1);
        assert!(second > first);
    }
}
