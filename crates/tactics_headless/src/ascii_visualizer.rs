//! ASCII board rendering for quick terminal review.
//!
//! North is up. Odd columns sit half a cell higher than even columns, so
//! every board row takes two text lines: the upper one holds the odd
//! columns, the lower one the even columns.
//!
//! ```text
//!    .     hv
//! .     .
//!    .     .
//! .     .
//!    .     .
//! P^    .
//! ```

use std::fmt::Write as _;

use tactics_core::board::Board;
use tactics_core::hex::{HexCoord, HexDirection};
use tactics_core::math::Fixed;
use tactics_core::unit::{Faction, Unit};

/// ASCII visualization configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Print row numbers on the left and column numbers underneath.
    pub show_coords: bool,
    /// Append one status line per unit.
    pub show_roster: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_coords: true,
            show_roster: true,
        }
    }
}

/// Character for a faction, upper case when player controlled.
fn faction_glyph(unit: &Unit) -> char {
    let glyph = match unit.faction {
        Faction::Player => 'p',
        Faction::Hostile => 'h',
    };
    if unit.is_agent_controlled() {
        glyph
    } else {
        glyph.to_ascii_uppercase()
    }
}

fn facing_glyph(facing: HexDirection) -> char {
    match facing {
        HexDirection::North => '^',
        HexDirection::NorthEast => '/',
        HexDirection::SouthEast => '\\',
        HexDirection::South => 'v',
        HexDirection::SouthWest => '/',
        HexDirection::NorthWest => '\\',
    }
}

fn cell(board: &Board, tile: HexCoord) -> [char; 2] {
    match board.unit_at(tile) {
        Some(unit) => [faction_glyph(unit), facing_glyph(unit.facing)],
        None => ['.', ' '],
    }
}

/// Render the board, and optionally a roster, as text.
pub fn render_board(board: &Board, now: Fixed, config: &AsciiConfig) -> String {
    let mut out = String::new();
    let margin = if config.show_coords { 4 } else { 0 };

    for row in (0..board.height()).rev() {
        for parity in [1, 0] {
            let mut line = String::new();
            if config.show_coords && parity == 0 {
                let _ = write!(line, "{row:>3} ");
            } else {
                line.push_str(&" ".repeat(margin));
            }
            for col in 0..board.width() {
                if col % 2 == parity {
                    let [a, b] = cell(board, HexCoord::new(col, row));
                    line.push(a);
                    line.push(b);
                    line.push(' ');
                } else {
                    line.push_str("   ");
                }
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }

    if config.show_coords {
        let mut footer = " ".repeat(margin);
        for col in 0..board.width() {
            let _ = write!(footer, "{:<3}", col % 100);
        }
        out.push_str(footer.trim_end());
        out.push('\n');
    }

    if config.show_roster {
        out.push('\n');
        for unit in board.units() {
            let _ = writeln!(
                out,
                "#{:<3} {} {}  {}",
                unit.id,
                faction_glyph(unit),
                unit.position,
                unit.describe(now)
            );
        }
    }
    out
}
