//! Offset hex grid geometry.
//!
//! The board uses a "brick" layout: cells are addressed by `(col, row)` and
//! every odd column is shifted half a cell north. Because of that shift the
//! neighbor offsets depend on column parity, so there are two offset tables.
//! Both tables list neighbors in the same clockwise order starting at North,
//! which means an index into either table is a [`HexDirection`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed, HALF};

/// Neighbor offsets `(dcol, drow)` for even columns.
pub const ADJACENT_EVEN: [(i32, i32); 6] = [(0, 1), (1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0)];

/// Neighbor offsets `(dcol, drow)` for odd columns.
pub const ADJACENT_ODD: [(i32, i32); 6] = [(0, 1), (1, 1), (1, 0), (0, -1), (-1, 0), (-1, 1)];

/// Degrees between two consecutive facings.
pub const FACING_STEP_DEGREES: i32 = 60;

/// A cell on the offset hex grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct HexCoord {
    /// Column (world x).
    pub col: i32,
    /// Row (world y, shifted by half a cell on odd columns).
    pub row: i32,
}

impl HexCoord {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Whether this cell sits in an odd (shifted) column.
    #[must_use]
    pub const fn is_odd_column(self) -> bool {
        self.col.rem_euclid(2) == 1
    }

    /// The offset table that applies to this cell.
    #[must_use]
    pub fn offsets(self) -> &'static [(i32, i32); 6] {
        if self.is_odd_column() {
            &ADJACENT_ODD
        } else {
            &ADJACENT_EVEN
        }
    }

    /// The neighbor in the given direction.
    #[must_use]
    pub fn neighbor(self, direction: HexDirection) -> Self {
        let (dc, dr) = self.offsets()[direction.index()];
        Self::new(self.col + dc, self.row + dr)
    }

    /// All six neighbors, indexed by [`HexDirection::index`].
    #[must_use]
    pub fn adjacent_coordinates(self) -> [Self; 6] {
        HexDirection::ALL.map(|direction| self.neighbor(direction))
    }

    /// Direction of `other` as seen from `self`, if the two cells are adjacent.
    #[must_use]
    pub fn direction_to(self, other: Self) -> Option<HexDirection> {
        HexDirection::ALL
            .into_iter()
            .find(|&direction| self.neighbor(direction) == other)
    }

    /// Whether the two cells share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        self.direction_to(other).is_some()
    }

    /// Check if the cell lies on a `width` × `height` board.
    #[must_use]
    pub const fn is_within_bounds(self, width: i32, height: i32) -> bool {
        self.col >= 0 && self.col < width && self.row >= 0 && self.row < height
    }

    /// Center of the cell in world space.
    #[must_use]
    pub fn world_position(self) -> Vec2Fixed {
        let x = Fixed::from_num(self.col);
        let y = if self.is_odd_column() {
            Fixed::from_num(self.row) + HALF
        } else {
            Fixed::from_num(self.row)
        };
        Vec2Fixed::new(x, y)
    }

    /// The cell whose center is nearest to a world position.
    ///
    /// Exact inverse of [`world_position`](Self::world_position) for cell
    /// centers.
    #[must_use]
    pub fn from_world_position(position: Vec2Fixed) -> Self {
        let col: i32 = position.x.round().to_num();
        let y = if col.rem_euclid(2) == 1 {
            position.y - HALF
        } else {
            position.y
        };
        Self::new(col, y.round().to_num())
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// One of the six facings on the grid, clockwise from North.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HexDirection {
    /// Heading 0°.
    #[default]
    North,
    /// Heading 60°.
    NorthEast,
    /// Heading 120°.
    SouthEast,
    /// Heading 180°.
    South,
    /// Heading 240°.
    SouthWest,
    /// Heading 300°.
    NorthWest,
}

impl HexDirection {
    /// All directions in adjacency-table order.
    pub const ALL: [Self; 6] = [
        Self::North,
        Self::NorthEast,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::NorthWest,
    ];

    /// Position of this direction in the adjacency tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::NorthEast => 1,
            Self::SouthEast => 2,
            Self::South => 3,
            Self::SouthWest => 4,
            Self::NorthWest => 5,
        }
    }

    /// Direction at `index` modulo 6.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % 6]
    }

    /// Heading in degrees, clockwise from North.
    #[must_use]
    pub const fn heading_degrees(self) -> i32 {
        self.index() as i32 * FACING_STEP_DEGREES
    }

    /// Absolute angle between two facings, in `[0, 180]` degrees.
    #[must_use]
    pub fn angle_to(self, other: Self) -> Fixed {
        let steps = self.index().abs_diff(other.index());
        let steps = steps.min(6 - steps) as i32;
        Fixed::from_num(steps * FACING_STEP_DEGREES)
    }

    /// The facing pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// Rotate by `steps` sixths of a turn (positive is clockwise).
    #[must_use]
    pub const fn rotated(self, steps: i32) -> Self {
        Self::from_index((self.index() as i32 + steps).rem_euclid(6) as usize)
    }

    /// World-space vector from a cell center to the neighbor in this direction.
    ///
    /// Identical for even and odd columns.
    #[must_use]
    pub fn world_vector(self) -> Vec2Fixed {
        let one = Fixed::ONE;
        let (x, y) = match self {
            Self::North => (Fixed::ZERO, one),
            Self::NorthEast => (one, HALF),
            Self::SouthEast => (one, -HALF),
            Self::South => (Fixed::ZERO, -one),
            Self::SouthWest => (-one, -HALF),
            Self::NorthWest => (-one, HALF),
        };
        Vec2Fixed::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_column_neighbors() {
        let c = HexCoord::new(2, 2);
        assert_eq!(
            c.adjacent_coordinates(),
            [
                HexCoord::new(2, 3),
                HexCoord::new(3, 2),
                HexCoord::new(3, 1),
                HexCoord::new(2, 1),
                HexCoord::new(1, 1),
                HexCoord::new(1, 2),
            ]
        );
    }

    #[test]
    fn test_odd_column_neighbors() {
        let c = HexCoord::new(3, 2);
        assert_eq!(
            c.adjacent_coordinates(),
            [
                HexCoord::new(3, 3),
                HexCoord::new(4, 3),
                HexCoord::new(4, 2),
                HexCoord::new(3, 1),
                HexCoord::new(2, 2),
                HexCoord::new(2, 3),
            ]
        );
    }

    #[test]
    fn test_negative_column_uses_odd_table() {
        let c = HexCoord::new(-1, 0);
        assert!(c.is_odd_column());
        assert_eq!(c.neighbor(HexDirection::NorthEast), HexCoord::new(0, 1));
    }

    #[test]
    fn test_direction_to() {
        let c = HexCoord::new(4, 4);
        for direction in HexDirection::ALL {
            assert_eq!(c.direction_to(c.neighbor(direction)), Some(direction));
        }
        assert_eq!(c.direction_to(c), None);
        assert_eq!(c.direction_to(HexCoord::new(6, 4)), None);
    }

    #[test]
    fn test_bounds() {
        assert!(HexCoord::new(0, 0).is_within_bounds(30, 30));
        assert!(HexCoord::new(29, 29).is_within_bounds(30, 30));
        assert!(!HexCoord::new(30, 0).is_within_bounds(30, 30));
        assert!(!HexCoord::new(0, -1).is_within_bounds(30, 30));
    }

    #[test]
    fn test_world_position_shifts_odd_columns() {
        assert_eq!(
            HexCoord::new(2, 3).world_position(),
            Vec2Fixed::from_ints(2, 3)
        );
        assert_eq!(
            HexCoord::new(3, 3).world_position(),
            Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(3.5))
        );
    }

    #[test]
    fn test_world_vector_matches_neighbor_offsets() {
        for c in [HexCoord::new(2, 2), HexCoord::new(3, 2), HexCoord::new(-3, 5)] {
            for direction in HexDirection::ALL {
                let delta = c.neighbor(direction).world_position() - c.world_position();
                assert_eq!(delta, direction.world_vector(), "{c} {direction:?}");
            }
        }
    }

    #[test]
    fn test_angle_between_facings() {
        use HexDirection::*;
        assert_eq!(North.angle_to(North), Fixed::ZERO);
        assert_eq!(North.angle_to(NorthEast), Fixed::from_num(60));
        assert_eq!(North.angle_to(NorthWest), Fixed::from_num(60));
        assert_eq!(North.angle_to(SouthEast), Fixed::from_num(120));
        assert_eq!(North.angle_to(South), Fixed::from_num(180));
        assert_eq!(SouthWest.angle_to(NorthEast), Fixed::from_num(180));
    }

    #[test]
    fn test_opposite_and_rotation() {
        assert_eq!(HexDirection::North.opposite(), HexDirection::South);
        assert_eq!(HexDirection::SouthWest.opposite(), HexDirection::NorthEast);
        assert_eq!(HexDirection::North.rotated(-1), HexDirection::NorthWest);
        assert_eq!(HexDirection::NorthWest.rotated(1), HexDirection::North);
        assert_eq!(HexDirection::South.heading_degrees(), 180);
    }
}
