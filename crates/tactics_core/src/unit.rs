//! Unit state: stats, cooldown clock and recent-damage history.
//!
//! Units are plain data owned by the [`Board`](crate::board::Board). Anything
//! that depends on other units (legal tiles, attacks) lives in
//! [`actions`](crate::actions); this module only covers what a unit can answer
//! about itself.

use std::collections::VecDeque;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::hex::{HexCoord, HexDirection};
use crate::math::Fixed;

/// Unique identifier for units on a board.
pub type UnitId = u32;

/// Side a unit fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Faction {
    /// The player's guards.
    #[default]
    Player,
    /// The opposing side.
    Hostile,
}

impl Faction {
    /// Whether this is the opposing faction.
    #[must_use]
    pub const fn is_hostile(self) -> bool {
        matches!(self, Self::Hostile)
    }

    /// The other faction.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Hostile,
            Self::Hostile => Self::Player,
        }
    }

    /// Short display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Hostile => "hostile",
        }
    }
}

/// Which decision source issues commands to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Controller {
    /// Commands come from an external input collaborator.
    #[default]
    PlayerControlled,
    /// Commands come from the [`AgentController`](crate::agent::AgentController).
    AgentControlled,
}

/// Hit points, clamped to `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create health at full.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if the unit is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning actual damage dealt.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }
}

/// The two independent action axes of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionAxis {
    /// Single-step movement.
    Move,
    /// Melee attack on an adjacent tile.
    Attack,
}

/// State of one action axis at a given simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Readiness {
    /// The unit lacks this capability altogether.
    Disabled,
    /// Waiting for the cooldown to elapse.
    Cooling {
        /// Simulation time at which the axis becomes ready.
        #[serde(with = "crate::math::fixed_serde")]
        ready_at: Fixed,
    },
    /// The action may be issued now.
    Ready,
}

impl Readiness {
    /// Whether the axis is ready.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Simulation times at which each axis becomes ready again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cooldowns {
    /// Earliest time of the next move.
    #[serde(with = "crate::math::fixed_serde")]
    pub next_move_ready_at: Fixed,
    /// Earliest time of the next attack.
    #[serde(with = "crate::math::fixed_serde")]
    pub next_attack_ready_at: Fixed,
}

/// Parameters for placing a new unit on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpawn {
    /// Display name.
    pub name: String,
    /// Side the unit fights for.
    pub faction: Faction,
    /// Decision source.
    #[serde(default)]
    pub controller: Controller,
    /// Starting cell.
    pub position: HexCoord,
    /// Starting facing.
    #[serde(default)]
    pub facing: HexDirection,
    /// Maximum health.
    pub max_hp: u32,
    /// Starting health; `None` spawns at full health.
    #[serde(default)]
    pub hp: Option<u32>,
    /// Attack value.
    pub attack: i32,
    /// Defense value.
    pub defense: i32,
    /// Whether the unit can ever move.
    #[serde(default = "default_true")]
    pub can_move: bool,
    /// Whether the unit can ever attack.
    #[serde(default = "default_true")]
    pub can_attack: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UnitSpawn {
    fn default() -> Self {
        Self {
            name: "unit".to_string(),
            faction: Faction::Player,
            controller: Controller::PlayerControlled,
            position: HexCoord::default(),
            facing: HexDirection::North,
            max_hp: 10,
            hp: None,
            attack: 4,
            defense: 2,
            can_move: true,
            can_attack: true,
        }
    }
}

/// One combatant on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier assigned by the board.
    pub id: UnitId,
    /// Display name.
    pub name: String,
    /// Side the unit fights for.
    pub faction: Faction,
    /// Decision source.
    pub controller: Controller,
    /// Hit points.
    pub health: Health,
    /// Attack value.
    pub attack: i32,
    /// Defense value.
    pub defense: i32,
    /// Whether the unit can ever move.
    pub can_move: bool,
    /// Whether the unit can ever attack.
    pub can_attack: bool,
    /// Cooldown deadlines.
    pub cooldowns: Cooldowns,
    /// Times this unit was hit during the last turn window, oldest first.
    #[serde(with = "fixed_deque_serde")]
    pub recent_hits: VecDeque<Fixed>,
    /// Current cell.
    pub position: HexCoord,
    /// Current facing.
    pub facing: HexDirection,
}

impl Unit {
    /// Build a unit from spawn parameters. Validation happens in
    /// [`Board::spawn`](crate::board::Board::spawn).
    #[must_use]
    pub fn from_spawn(id: UnitId, spawn: UnitSpawn) -> Self {
        let mut health = Health::new(spawn.max_hp);
        if let Some(hp) = spawn.hp {
            health.current = hp.min(spawn.max_hp);
        }
        Self {
            id,
            name: spawn.name,
            faction: spawn.faction,
            controller: spawn.controller,
            health,
            attack: spawn.attack,
            defense: spawn.defense,
            can_move: spawn.can_move,
            can_attack: spawn.can_attack,
            cooldowns: Cooldowns::default(),
            recent_hits: VecDeque::new(),
            position: spawn.position,
            facing: spawn.facing,
        }
    }

    /// Whether the unit has no hit points left.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health.is_dead()
    }

    /// Whether the unit is driven by the agent controller.
    #[must_use]
    pub const fn is_agent_controlled(&self) -> bool {
        matches!(self.controller, Controller::AgentControlled)
    }

    /// State of one action axis at `now`.
    #[must_use]
    pub fn readiness(&self, axis: ActionAxis, now: Fixed) -> Readiness {
        let (capable, ready_at) = match axis {
            ActionAxis::Move => (self.can_move, self.cooldowns.next_move_ready_at),
            ActionAxis::Attack => (self.can_attack, self.cooldowns.next_attack_ready_at),
        };
        if !capable {
            Readiness::Disabled
        } else if ready_at <= now {
            Readiness::Ready
        } else {
            Readiness::Cooling { ready_at }
        }
    }

    /// Whether the move axis is ready at `now`.
    #[must_use]
    pub fn can_move_now(&self, now: Fixed) -> bool {
        self.readiness(ActionAxis::Move, now).is_ready()
    }

    /// Whether the attack axis is ready at `now`.
    #[must_use]
    pub fn can_attack_now(&self, now: Fixed) -> bool {
        self.readiness(ActionAxis::Attack, now).is_ready()
    }

    /// Number of hits taken inside the current window.
    #[must_use]
    pub fn recent_hit_count(&self) -> usize {
        self.recent_hits.len()
    }

    /// Drop hits that fell out of the one-turn window ending at `now`.
    ///
    /// A hit at time `t` counts while `now < t + turn_duration`. This is the
    /// only place history entries are removed.
    pub fn advance_time(&mut self, now: Fixed, turn_duration: Fixed) {
        while self
            .recent_hits
            .front()
            .is_some_and(|&hit| hit.saturating_add(turn_duration) <= now)
        {
            self.recent_hits.pop_front();
        }
    }

    /// Record a hit at `now` and subtract hit points. Returns damage dealt.
    pub(crate) fn take_hit(&mut self, damage: u32, now: Fixed) -> u32 {
        self.recent_hits.push_back(now);
        self.health.apply_damage(damage)
    }

    /// Put both axes on cooldown after an attack.
    pub(crate) fn start_attack_cooldown(&mut self, ready_at: Fixed) {
        self.cooldowns.next_attack_ready_at = ready_at;
        self.cooldowns.next_move_ready_at = ready_at;
    }

    /// One-line status, e.g. `Guard  Attack 4  Defense 3(-1)  HP 7/10  ⌂⌂`.
    ///
    /// Each `⌂` is one remaining second of move cooldown.
    #[must_use]
    pub fn describe(&self, now: Fixed) -> String {
        let mut text = format!("{}  ", self.name);
        if self.can_attack {
            let _ = write!(text, "  Attack {}", self.attack);
        }
        let _ = write!(text, "  Defense {}", self.defense);
        if !self.recent_hits.is_empty() {
            let _ = write!(text, "(-{})", self.recent_hits.len());
        }
        let _ = write!(text, "  HP {}/{}", self.health.current, self.health.max);
        if let Readiness::Cooling { ready_at } = self.readiness(ActionAxis::Move, now) {
            let seconds: i32 = (ready_at - now).round().to_num();
            if seconds > 0 {
                let _ = write!(text, "  {}", "⌂".repeat(seconds as usize));
            }
        }
        text
    }
}

/// Serde support for a deque of fixed-point timestamps.
mod fixed_deque_serde {
    use std::collections::VecDeque;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::math::Fixed;

    pub fn serialize<S>(value: &VecDeque<Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bits: Vec<i64> = value.iter().map(|v| v.to_bits()).collect();
        bits.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<VecDeque<Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = Vec::<i64>::deserialize(deserializer)?;
        Ok(bits.into_iter().map(Fixed::from_bits).collect())
    }
}
