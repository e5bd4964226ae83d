//! Simulation configuration.
//!
//! Every field has a default matching the stock game (30×30 board, ten
//! second turns, 20 ticks per second), so a RON file only needs to name
//! what it changes:
//!
//! ```ron
//! (
//!     board: (width: 12, height: 8),
//!     turn_duration_ms: 4000,
//!     agent: (decision_pause: false),
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::agent::AgentConfig;
use crate::board::BoardConfig;
use crate::combat::CombatRules;
use crate::error::{GameError, Result};
use crate::math::{millis_to_seconds, Fixed};

/// Default turn window: the cooldown applied by every command.
pub const DEFAULT_TURN_DURATION_MS: u32 = 10_000;

/// Default simulation ticks per simulated second.
pub const TICK_RATE: u32 = 20;

/// Longest accepted turn window: one hour.
pub const MAX_TURN_DURATION_MS: u32 = 3_600_000;

/// Highest accepted tick rate.
pub const MAX_TICK_RATE: u32 = 1_000;

/// Everything needed to build a [`Simulation`](crate::simulation::Simulation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Board dimensions.
    pub board: BoardConfig,
    /// Cooldown applied by a command, in milliseconds.
    pub turn_duration_ms: u32,
    /// Ticks per simulated second.
    pub tick_rate: u32,
    /// Combat constants.
    pub combat: CombatRules,
    /// Agent tuning.
    pub agent: AgentConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            turn_duration_ms: DEFAULT_TURN_DURATION_MS,
            tick_rate: TICK_RATE,
            combat: CombatRules::default(),
            agent: AgentConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse a configuration from RON and validate it.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self =
            ron::from_str(text).map_err(|e| GameError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values can drive a simulation.
    pub fn validate(&self) -> Result<()> {
        if self.board.width <= 0 || self.board.height <= 0 {
            return Err(GameError::InvalidConfig(format!(
                "board must be at least 1x1, got {}x{}",
                self.board.width, self.board.height
            )));
        }
        if self.turn_duration_ms == 0 || self.turn_duration_ms > MAX_TURN_DURATION_MS {
            return Err(GameError::InvalidConfig(format!(
                "turn_duration_ms must be in 1..={MAX_TURN_DURATION_MS}, got {}",
                self.turn_duration_ms
            )));
        }
        if self.tick_rate == 0 || self.tick_rate > MAX_TICK_RATE {
            return Err(GameError::InvalidConfig(format!(
                "tick_rate must be in 1..={MAX_TICK_RATE}, got {}",
                self.tick_rate
            )));
        }
        if self.agent.random_move_percent > 100 {
            return Err(GameError::InvalidConfig(format!(
                "random_move_percent must be at most 100, got {}",
                self.agent.random_move_percent
            )));
        }
        Ok(())
    }

    /// Turn window in simulation seconds.
    #[must_use]
    pub fn turn_duration(&self) -> Fixed {
        millis_to_seconds(self.turn_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Simulation;

    #[test]
    fn test_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.board, BoardConfig { width: 30, height: 30 });
        assert_eq!(config.turn_duration(), Fixed::from_num(10));
        assert_eq!(config.tick_rate, 20);
        assert!(config.agent.decision_pause);
        assert_eq!(config.agent.random_move_percent, 40);
        assert_eq!(config.combat.defense_floor, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = SimConfig::from_ron_str(
            "(board: (width: 12, height: 8), turn_duration_ms: 4000, \
             agent: (decision_pause: false), combat: (defense_floor: Some(1)))",
        )
        .unwrap();
        assert_eq!(config.board, BoardConfig { width: 12, height: 8 });
        assert_eq!(config.turn_duration(), Fixed::from_num(4));
        assert_eq!(config.tick_rate, TICK_RATE);
        assert!(!config.agent.decision_pause);
        assert_eq!(config.agent.random_move_percent, 40);
        assert_eq!(config.combat.defense_floor, Some(1));
        assert_eq!(config.combat.backstab_full, 2);
    }

    #[test]
    fn test_rejects_unusable_values() {
        assert!(matches!(
            SimConfig::from_ron_str("(tick_rate: 0)"),
            Err(GameError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimConfig::from_ron_str("(turn_duration_ms: 0)"),
            Err(GameError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimConfig::from_ron_str("(board: (width: 0, height: 5))"),
            Err(GameError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimConfig::from_ron_str("(agent: (random_move_percent: 101))"),
            Err(GameError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimConfig::from_ron_str("(board: oops)"),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_oversized_timing_is_rejected_before_use() {
        let long_turn = SimConfig {
            turn_duration_ms: u32::MAX,
            ..SimConfig::default()
        };
        assert!(matches!(long_turn.validate(), Err(GameError::InvalidConfig(_))));
        assert!(matches!(
            Simulation::new(long_turn, 0),
            Err(GameError::InvalidConfig(_))
        ));

        let fast_ticks = SimConfig {
            tick_rate: u32::MAX,
            ..SimConfig::default()
        };
        assert!(matches!(
            Simulation::new(fast_ticks, 0),
            Err(GameError::InvalidConfig(_))
        ));

        let longest = SimConfig {
            turn_duration_ms: MAX_TURN_DURATION_MS,
            tick_rate: MAX_TICK_RATE,
            ..SimConfig::default()
        };
        assert!(longest.validate().is_ok());
        assert_eq!(longest.turn_duration(), Fixed::from_num(3_600));
    }
}
