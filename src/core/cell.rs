#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// Low nibble: wall bits (one per [`Direction`]).
pub const WALL_BITS: u8 = 0x0F;
/// High nibble: saturating visit counter.
pub const VISIT_SHIFT: u8 = 4;
pub const MAX_VISITS: u8 = 15;

/// One packed grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Cell(u8);

impl Cell {
    pub const EMPTY: Cell = Cell(0);
    pub const WALLED: Cell = Cell(WALL_BITS);

    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn walls(self) -> u8 {
        self.0 & WALL_BITS
    }

    #[inline]
    pub fn has_wall(self, d: Direction) -> bool {
        self.0 & d.mask() != 0
    }

    #[inline]
    pub fn set_wall(&mut self, d: Direction) {
        self.0 |= d.mask();
    }

    #[inline]
    pub fn clear_wall(&mut self, d: Direction) {
        self.0 &= !d.mask();
    }

    /// Replaces the wall nibble, keeping the visit count.
    pub fn set_walls(&mut self, walls: u8) {
        self.0 = (self.0 & !WALL_BITS) | (walls & WALL_BITS);
    }

    #[inline]
    pub fn visits(self) -> u8 {
        self.0 >> VISIT_SHIFT
    }

    /// Increments the visit counter; stays at [`MAX_VISITS`] once reached.
    pub fn add_visit(&mut self) {
        let v = self.visits();
        if v < MAX_VISITS {
            self.0 = ((v + 1) << VISIT_SHIFT) | self.walls();
        }
    }

    pub fn clear_visits(&mut self) {
        self.0 &= WALL_BITS;
    }

    /// Number of open sides.
    pub fn exits(self) -> u32 {
        4 - self.walls().count_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walls_and_visits_are_independent() {
        let mut c = Cell::EMPTY;
        c.set_wall(Direction::North);
        c.set_wall(Direction::West);
        c.add_visit();
        c.add_visit();
        assert_eq!(c.walls(), 0b1001);
        assert_eq!(c.visits(), 2);

        c.clear_wall(Direction::North);
        assert_eq!(c.walls(), 0b1000);
        assert_eq!(c.visits(), 2);

        c.set_walls(0b0110);
        assert_eq!(c.walls(), 0b0110);
        assert_eq!(c.visits(), 2);
        assert_eq!(c.exits(), 2);
    }

    #[test]
    fn visits_saturate_at_fifteen() {
        let mut c = Cell::WALLED;
        for _ in 0..20 {
            c.add_visit();
        }
        assert_eq!(c.visits(), MAX_VISITS);
        assert_eq!(c.walls(), WALL_BITS);

        c.clear_visits();
        assert_eq!(c.visits(), 0);
        assert_eq!(c.bits(), WALL_BITS);
    }
}
