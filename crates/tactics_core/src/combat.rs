//! Facing-aware melee combat resolution.
//!
//! One attack is resolved from three board-dependent modifiers:
//! - Backstab: bonus attack when the attacker approaches from behind the
//!   defender's facing
//! - Flanking: bonus defense for each defender ally beside the attacker's
//!   line of approach
//! - Recent hits: defense malus per hit the defender took this turn window
//!
//! [`resolve`] has no side effects. The same call backs both the HUD preview
//! and [`Board::attack_to`](crate::board::Board::attack_to).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::{GameError, Result};
use crate::hex::{HexCoord, HexDirection};
use crate::math::{fixed_serde, Fixed};
use crate::unit::{Unit, UnitId};

/// Attack bonus when striking a defender squarely from behind.
pub const BACKSTAB_FULL_BONUS: i32 = 2;

/// Attack bonus when striking a defender from behind at an angle.
pub const BACKSTAB_HALF_BONUS: i32 = 1;

/// Defense bonus per allied unit on a flank tile.
pub const FLANKING_BONUS_PER_ALLY: i32 = 1;

/// Defense malus per recent hit.
pub const RECENT_HIT_MALUS: i32 = 1;

/// Angle deltas below this many degrees earn the full backstab bonus.
pub const FULL_BACKSTAB_ANGLE: i32 = 30;

/// Angle deltas below this many degrees earn the half backstab bonus.
pub const HALF_BACKSTAB_ANGLE: i32 = 90;

/// Tunable combat constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Attack bonus for a full backstab.
    pub backstab_full: i32,
    /// Attack bonus for a half backstab.
    pub backstab_half: i32,
    /// Defense bonus per flanking ally.
    pub flanking_per_ally: i32,
    /// Defense malus per recent hit.
    pub malus_per_hit: i32,
    /// Lowest effective defense, if clamped at all.
    ///
    /// `None` feeds the raw (possibly negative) defense into the damage
    /// formula.
    pub defense_floor: Option<i32>,
}

impl CombatRules {
    /// Builder method to clamp effective defense.
    #[must_use]
    pub const fn with_defense_floor(mut self, floor: i32) -> Self {
        self.defense_floor = Some(floor);
        self
    }
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            backstab_full: BACKSTAB_FULL_BONUS,
            backstab_half: BACKSTAB_HALF_BONUS,
            flanking_per_ally: FLANKING_BONUS_PER_ALLY,
            malus_per_hit: RECENT_HIT_MALUS,
            defense_floor: None,
        }
    }
}

/// Full breakdown of one resolved attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Attacking unit.
    pub attacker: UnitId,
    /// Defending unit.
    pub defender: UnitId,
    /// Attacker tile.
    pub attacker_tile: HexCoord,
    /// Defender tile.
    pub defender_tile: HexCoord,
    /// Facing the attacker takes to strike.
    pub attack_facing: HexDirection,
    /// Angle between the attack facing and the defender's facing, in degrees.
    #[serde(with = "fixed_serde")]
    pub angle_delta: Fixed,
    /// Attacker's own attack value.
    pub base_attack: i32,
    /// Backstab bonus.
    pub backstab_bonus: i32,
    /// `base_attack + backstab_bonus`, saturating at the `i32` bounds.
    pub attack: i32,
    /// Defender's own defense value.
    pub base_defense: i32,
    /// Flanking bonus.
    pub flanking_bonus: i32,
    /// Recent-hits malus.
    pub recent_hits_malus: i32,
    /// `base_defense + flanking_bonus - recent_hits_malus`, saturating at the
    /// `i32` bounds and floored if the rules ask for it.
    pub defense: i32,
    /// Hit points the defender loses (before clamping to its remaining HP).
    pub damage: u32,
}

impl fmt::Display for AttackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unit {} -> unit {}: attack={}+{} defense={}+{}-{} -> damage={}",
            self.attacker,
            self.defender,
            self.base_attack,
            self.backstab_bonus,
            self.base_defense,
            self.flanking_bonus,
            self.recent_hits_malus,
            self.damage
        )
    }
}

/// Backstab bonus for an angle between attack facing and defender facing.
///
/// `[0, 30)` is a full backstab, `[30, 90)` a half backstab, anything wider
/// earns nothing.
#[must_use]
pub fn backstab_bonus(angle_delta: Fixed, rules: &CombatRules) -> i32 {
    if angle_delta < Fixed::from_num(FULL_BACKSTAB_ANGLE) {
        rules.backstab_full
    } else if angle_delta < Fixed::from_num(HALF_BACKSTAB_ANGLE) {
        rules.backstab_half
    } else {
        0
    }
}

/// The defender's neighbors immediately left and right of the attacker.
///
/// Returns `None` when the attacker is not adjacent to the defender. The
/// tiles are not bounds-checked.
#[must_use]
pub fn flank_tiles(defender_tile: HexCoord, attacker_tile: HexCoord) -> Option<[HexCoord; 2]> {
    let index = defender_tile.direction_to(attacker_tile)?.index();
    let ring = defender_tile.adjacent_coordinates();
    Some([ring[(index + 5) % 6], ring[(index + 1) % 6]])
}

/// Number of defender allies on the flank tiles, times the per-ally bonus.
#[must_use]
pub fn flanking_bonus(
    board: &Board,
    defender: &Unit,
    attacker_tile: HexCoord,
    rules: &CombatRules,
) -> i32 {
    let Some(tiles) = flank_tiles(defender.position, attacker_tile) else {
        return 0;
    };
    let allies = tiles
        .into_iter()
        .filter(|&tile| board.is_within_bounds(tile))
        .filter(|&tile| {
            board
                .unit_at(tile)
                .is_some_and(|unit| unit.faction == defender.faction)
        })
        .count() as i32;
    allies.saturating_mul(rules.flanking_per_ally)
}

/// Resolve an attack between two units on the board without changing it.
pub fn resolve(
    board: &Board,
    attacker: UnitId,
    defender: UnitId,
    rules: &CombatRules,
) -> Result<AttackOutcome> {
    let attacker = board.get(attacker)?;
    let defender = board.get(defender)?;
    resolve_units(board, attacker, defender, rules)
}

/// Resolve an attack between two unit snapshots against a board.
///
/// The board supplies flanking allies; the units themselves need not be
/// registered on it.
pub fn resolve_units(
    board: &Board,
    attacker: &Unit,
    defender: &Unit,
    rules: &CombatRules,
) -> Result<AttackOutcome> {
    let attack_facing = attacker
        .position
        .direction_to(defender.position)
        .ok_or(GameError::DegenerateGeometry {
            from: attacker.position,
            to: defender.position,
        })?;

    let angle_delta = attack_facing.angle_to(defender.facing);
    let backstab = backstab_bonus(angle_delta, rules);
    let attack = attacker.attack.saturating_add(backstab);

    let flanking = flanking_bonus(board, defender, attacker.position, rules);
    let hits = i32::try_from(defender.recent_hit_count()).unwrap_or(i32::MAX);
    let malus = hits.saturating_mul(rules.malus_per_hit);
    let raw_defense = defender.defense.saturating_add(flanking).saturating_sub(malus);
    let defense = match rules.defense_floor {
        Some(floor) => raw_defense.max(floor),
        None => raw_defense,
    };

    // Stats are whole numbers, so nearest-integer rounding is the identity.
    let margin = (i64::from(attack) - i64::from(defense)).max(0);
    let damage = u32::try_from(margin).unwrap_or(u32::MAX);

    Ok(AttackOutcome {
        attacker: attacker.id,
        defender: defender.id,
        attacker_tile: attacker.position,
        defender_tile: defender.position,
        attack_facing,
        angle_delta,
        base_attack: attacker.attack,
        backstab_bonus: backstab,
        attack,
        base_defense: defender.defense,
        flanking_bonus: flanking,
        recent_hits_malus: malus,
        defense,
        damage,
    })
}
