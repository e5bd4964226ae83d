//! Legality queries and the two unit commands.
//!
//! Both players and the agent controller go through these methods, so a
//! command the agent issues is exactly as legal as one a player could issue.
//! Every command validates first and mutates second.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::combat::{self, AttackOutcome, CombatRules};
use crate::error::{GameError, Result};
use crate::hex::{HexCoord, HexDirection};
use crate::math::Fixed;
use crate::unit::{Faction, UnitId};

/// Result of a committed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// The unit that moved.
    pub unit: UnitId,
    /// Tile it left.
    pub from: HexCoord,
    /// Tile it entered.
    pub to: HexCoord,
    /// New facing (direction of travel).
    pub facing: HexDirection,
}

/// Result of a committed attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    /// Resolution breakdown.
    pub outcome: AttackOutcome,
    /// Hit points actually removed (damage clamped to the defender's HP).
    pub damage_dealt: u32,
    /// Whether the defender died and was removed from the board.
    pub defender_killed: bool,
}

impl Board {
    /// Tiles the unit may step onto now, in adjacency order.
    ///
    /// Empty when the unit is missing or its move axis is not ready.
    #[must_use]
    pub fn legal_move_tiles(&self, id: UnitId, now: Fixed) -> Vec<HexCoord> {
        let Some(unit) = self.unit(id) else {
            return Vec::new();
        };
        if !unit.can_move_now(now) {
            return Vec::new();
        }
        unit.position
            .adjacent_coordinates()
            .into_iter()
            .filter(|&tile| self.is_move_legal(tile))
            .collect()
    }

    /// Tiles the unit may attack now, in adjacency order.
    ///
    /// Empty when the unit is missing or its attack axis is not ready.
    #[must_use]
    pub fn legal_attack_tiles(&self, id: UnitId, now: Fixed) -> Vec<HexCoord> {
        let Some(unit) = self.unit(id) else {
            return Vec::new();
        };
        if !unit.can_attack_now(now) {
            return Vec::new();
        }
        self.opponent_tiles(unit.faction, unit.position)
    }

    /// Tiles around `from` held by units opposing `faction`.
    ///
    /// `from` need not be the unit's own tile; the agent uses this to look
    /// ahead from candidate move tiles.
    #[must_use]
    pub fn opponent_tiles(&self, faction: Faction, from: HexCoord) -> Vec<HexCoord> {
        from.adjacent_coordinates()
            .into_iter()
            .filter(|&tile| self.is_attack_legal(tile, faction))
            .collect()
    }

    /// Whether the unit has anything it could do right now.
    #[must_use]
    pub fn is_ready(&self, id: UnitId, now: Fixed) -> bool {
        !self.legal_move_tiles(id, now).is_empty() || !self.legal_attack_tiles(id, now).is_empty()
    }

    /// Step a unit onto an adjacent free tile.
    ///
    /// The unit turns to face its direction of travel and its move axis
    /// cools down until `now + turn_duration`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] for an unknown unit and
    /// [`GameError::IllegalMove`] when `target` is not among
    /// [`legal_move_tiles`](Self::legal_move_tiles). Nothing changes on error.
    pub fn move_to(
        &mut self,
        id: UnitId,
        target: HexCoord,
        now: Fixed,
        turn_duration: Fixed,
    ) -> Result<MoveOutcome> {
        let from = self.get(id)?.position;
        if !self.legal_move_tiles(id, now).contains(&target) {
            return Err(GameError::IllegalMove { unit: id, target });
        }
        let facing = from
            .direction_to(target)
            .ok_or(GameError::IllegalMove { unit: id, target })?;

        self.relocate(id, target)?;
        let unit = self.unit_mut(id)?;
        unit.facing = facing;
        unit.cooldowns.next_move_ready_at = now.saturating_add(turn_duration);

        tracing::debug!(unit = id, from = %from, to = %target, facing = ?facing, "Unit moved");

        Ok(MoveOutcome {
            unit: id,
            from,
            to: target,
            facing,
        })
    }

    /// Attack the unit standing on an adjacent tile.
    ///
    /// The attacker turns toward the defender and both of its axes cool down
    /// until `now + turn_duration`. The defender records the hit even when
    /// it deals no damage; a defender left with no hit points is removed
    /// before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] for an unknown attacker and
    /// [`GameError::IllegalAttack`] when `target` is not among
    /// [`legal_attack_tiles`](Self::legal_attack_tiles). Nothing changes on
    /// error.
    pub fn attack_to(
        &mut self,
        id: UnitId,
        target: HexCoord,
        now: Fixed,
        turn_duration: Fixed,
        rules: &CombatRules,
    ) -> Result<AttackReport> {
        self.get(id)?;
        if !self.legal_attack_tiles(id, now).contains(&target) {
            return Err(GameError::IllegalAttack { unit: id, target });
        }
        let defender_id = self
            .unit_at(target)
            .map(|unit| unit.id)
            .ok_or(GameError::IllegalAttack { unit: id, target })?;

        let outcome = combat::resolve(self, id, defender_id, rules)?;

        let attacker = self.unit_mut(id)?;
        attacker.facing = outcome.attack_facing;
        attacker.start_attack_cooldown(now.saturating_add(turn_duration));

        let defender = self.unit_mut(defender_id)?;
        let damage_dealt = defender.take_hit(outcome.damage, now);
        let defender_killed = defender.is_dead();

        tracing::debug!(
            attacker = id,
            defender = defender_id,
            attack = outcome.attack,
            defense = outcome.defense,
            damage = damage_dealt,
            "Attack resolved"
        );

        if defender_killed {
            self.remove(defender_id);
            tracing::info!(unit = defender_id, tile = %target, killer = id, "Unit died");
        }

        Ok(AttackReport {
            outcome,
            damage_dealt,
            defender_killed,
        })
    }

    /// Resolve an attack on `target` without committing anything.
    ///
    /// Ignores cooldowns so a HUD can show the breakdown while the attacker
    /// is still recovering.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::IllegalAttack`] when no opposing unit stands on
    /// `target`, and [`GameError::DegenerateGeometry`] when it is not
    /// adjacent to the attacker.
    pub fn preview_attack(
        &self,
        id: UnitId,
        target: HexCoord,
        rules: &CombatRules,
    ) -> Result<AttackOutcome> {
        let attacker = self.get(id)?;
        let defender = self
            .unit_at(target)
            .filter(|unit| unit.faction != attacker.faction)
            .ok_or(GameError::IllegalAttack { unit: id, target })?;
        combat::resolve_units(self, attacker, defender, rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::UnitSpawn;

    const TURN: i32 = 10;

    fn secs(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    fn turn() -> Fixed {
        secs(TURN)
    }

    fn place(board: &mut Board, faction: Faction, col: i32, row: i32) -> UnitId {
        board
            .spawn(UnitSpawn {
                faction,
                position: HexCoord::new(col, row),
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn test_legal_move_tiles_excludes_occupied_and_offboard() {
        let mut board = Board::new(5, 5);
        let id = place(&mut board, Faction::Player, 0, 0);
        place(&mut board, Faction::Player, 0, 1);

        // (0,0) even column: N (0,1) taken, NE (1,0) free, SE (1,-1) off,
        // S (0,-1) off, SW (-1,-1) off, NW (-1,0) off.
        assert_eq!(board.legal_move_tiles(id, secs(0)), vec![HexCoord::new(1, 0)]);
    }

    #[test]
    fn test_move_sets_facing_and_cooldown() {
        let mut board = Board::new(10, 10);
        let id = place(&mut board, Faction::Player, 4, 4);

        let outcome = board
            .move_to(id, HexCoord::new(5, 4), secs(0), turn())
            .unwrap();
        assert_eq!(outcome.from, HexCoord::new(4, 4));
        assert_eq!(outcome.facing, HexDirection::NorthEast);

        let unit = board.unit(id).unwrap();
        assert_eq!(unit.position, HexCoord::new(5, 4));
        assert_eq!(unit.facing, HexDirection::NorthEast);
        assert!(board.unit_at(HexCoord::new(4, 4)).is_none());

        assert!(board.legal_move_tiles(id, secs(9)).is_empty());
        assert!(!board.legal_move_tiles(id, secs(10)).is_empty());
    }

    #[test]
    fn test_illegal_move_changes_nothing() {
        let mut board = Board::new(10, 10);
        let id = place(&mut board, Faction::Player, 4, 4);
        let before = board.unit(id).unwrap().clone();

        let err = board
            .move_to(id, HexCoord::new(7, 7), secs(0), turn())
            .unwrap_err();
        assert_eq!(
            err,
            GameError::IllegalMove {
                unit: id,
                target: HexCoord::new(7, 7)
            }
        );
        assert_eq!(board.unit(id).unwrap(), &before);

        board.move_to(id, HexCoord::new(4, 5), secs(0), turn()).unwrap();
        assert!(matches!(
            board.move_to(id, HexCoord::new(4, 6), secs(1), turn()),
            Err(GameError::IllegalMove { .. })
        ));
    }

    #[test]
    fn test_legal_attack_tiles_need_adjacent_opponent() {
        let mut board = Board::new(10, 10);
        let id = place(&mut board, Faction::Player, 4, 4);
        place(&mut board, Faction::Player, 4, 5);
        assert!(board.legal_attack_tiles(id, secs(0)).is_empty());

        place(&mut board, Faction::Hostile, 5, 4);
        assert_eq!(board.legal_attack_tiles(id, secs(0)), vec![HexCoord::new(5, 4)]);
        assert!(board.is_ready(id, secs(0)));
    }

    #[test]
    fn test_attack_applies_damage_history_and_cooldowns() {
        let mut board = Board::new(10, 10);
        let attacker = place(&mut board, Faction::Player, 4, 4);
        let defender = place(&mut board, Faction::Hostile, 4, 5);
        let rules = CombatRules::default();

        // Defender faces North (default), attacker strikes North from the
        // south: full backstab, 4 + 2 - 2 = 4 damage.
        let report = board
            .attack_to(attacker, HexCoord::new(4, 5), secs(3), turn(), &rules)
            .unwrap();
        assert_eq!(report.outcome.damage, 4);
        assert_eq!(report.damage_dealt, 4);
        assert!(!report.defender_killed);

        let hit = board.unit(defender).unwrap();
        assert_eq!(hit.health.current, 6);
        assert_eq!(hit.recent_hits.iter().copied().collect::<Vec<_>>(), vec![secs(3)]);

        let striker = board.unit(attacker).unwrap();
        assert_eq!(striker.facing, HexDirection::North);
        assert_eq!(striker.cooldowns.next_attack_ready_at, secs(13));
        assert_eq!(striker.cooldowns.next_move_ready_at, secs(13));
        assert!(!board.is_ready(attacker, secs(12)));
    }

    #[test]
    fn test_zero_damage_attack_still_records_hit() {
        let mut board = Board::new(10, 10);
        let attacker = place(&mut board, Faction::Player, 4, 4);
        let defender = board
            .spawn(UnitSpawn {
                faction: Faction::Hostile,
                position: HexCoord::new(4, 5),
                facing: HexDirection::South,
                defense: 20,
                ..Default::default()
            })
            .unwrap();

        let report = board
            .attack_to(attacker, HexCoord::new(4, 5), secs(0), turn(), &CombatRules::default())
            .unwrap();
        assert_eq!(report.damage_dealt, 0);
        assert_eq!(board.unit(defender).unwrap().recent_hit_count(), 1);
    }

    #[test]
    fn test_kill_removes_defender_immediately() {
        let mut board = Board::new(10, 10);
        let attacker = place(&mut board, Faction::Player, 4, 4);
        let defender = board
            .spawn(UnitSpawn {
                faction: Faction::Hostile,
                position: HexCoord::new(4, 5),
                hp: Some(1),
                ..Default::default()
            })
            .unwrap();

        let report = board
            .attack_to(attacker, HexCoord::new(4, 5), secs(0), turn(), &CombatRules::default())
            .unwrap();
        assert!(report.defender_killed);
        assert_eq!(report.damage_dealt, 1);
        assert!(!board.contains(defender));
        assert!(board.unit_at(HexCoord::new(4, 5)).is_none());
        assert!(board.is_move_legal(HexCoord::new(4, 5)));
    }

    #[test]
    fn test_attack_rejected_on_cooldown_or_friendly() {
        let mut board = Board::new(10, 10);
        let attacker = place(&mut board, Faction::Player, 4, 4);
        place(&mut board, Faction::Player, 4, 3);
        place(&mut board, Faction::Hostile, 4, 5);
        let rules = CombatRules::default();

        assert!(matches!(
            board.attack_to(attacker, HexCoord::new(4, 3), secs(0), turn(), &rules),
            Err(GameError::IllegalAttack { .. })
        ));

        board
            .attack_to(attacker, HexCoord::new(4, 5), secs(0), turn(), &rules)
            .unwrap();
        assert!(matches!(
            board.attack_to(attacker, HexCoord::new(4, 5), secs(5), turn(), &rules),
            Err(GameError::IllegalAttack { .. })
        ));
    }

    #[test]
    fn test_preview_matches_commit_and_changes_nothing() {
        let mut board = Board::new(10, 10);
        let attacker = place(&mut board, Faction::Player, 4, 4);
        let defender = place(&mut board, Faction::Hostile, 5, 4);
        let rules = CombatRules::default();

        let before = board.unit(defender).unwrap().clone();
        let preview = board
            .preview_attack(attacker, HexCoord::new(5, 4), &rules)
            .unwrap();
        assert_eq!(board.unit(defender).unwrap(), &before);

        let report = board
            .attack_to(attacker, HexCoord::new(5, 4), secs(0), turn(), &rules)
            .unwrap();
        assert_eq!(report.outcome, preview);
    }

    #[test]
    fn test_preview_needs_an_opponent() {
        let mut board = Board::new(10, 10);
        let attacker = place(&mut board, Faction::Player, 4, 4);
        assert!(matches!(
            board.preview_attack(attacker, HexCoord::new(5, 4), &CombatRules::default()),
            Err(GameError::IllegalAttack { .. })
        ));
    }

    #[test]
    fn test_opponent_tiles_from_arbitrary_tile() {
        let mut board = Board::new(10, 10);
        place(&mut board, Faction::Hostile, 6, 4);
        assert!(board
            .opponent_tiles(Faction::Player, HexCoord::new(4, 4))
            .is_empty());
        assert_eq!(
            board.opponent_tiles(Faction::Player, HexCoord::new(5, 4)),
            vec![HexCoord::new(6, 4)]
        );
        assert!(board
            .opponent_tiles(Faction::Hostile, HexCoord::new(5, 4))
            .is_empty());
    }
}
