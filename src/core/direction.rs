#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the four cardinal directions on the grid.
///
/// Rows grow southward and columns grow eastward, so North is `dr = -1`.
/// Every helper is a lookup into a table indexed by [`Direction::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    North,
    East,
    South,
    West,
}

const DR: [i32; 4] = [-1, 0, 1, 0];
const DC: [i32; 4] = [0, 1, 0, -1];
const OPPOSITE: [Direction; 4] = [
    Direction::South,
    Direction::West,
    Direction::North,
    Direction::East,
];
const RIGHT: [Direction; 4] = [
    Direction::East,
    Direction::South,
    Direction::West,
    Direction::North,
];
const LEFT: [Direction; 4] = [
    Direction::West,
    Direction::North,
    Direction::East,
    Direction::South,
];
// Renderer rotation in degrees.
const ANGLE: [i32; 4] = [0, -90, 180, 90];

impl Direction {
    /// All directions in ordinal order (N, E, S, W).
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Maps an ordinal (e.g. a controller's action index) back to a direction.
    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    /// Single-bit wall mask: N=0b0001, E=0b0010, S=0b0100, W=0b1000.
    #[inline]
    pub fn mask(self) -> u8 {
        1 << self.index()
    }

    #[inline]
    pub fn dr(self) -> i32 {
        DR[self.index()]
    }

    #[inline]
    pub fn dc(self) -> i32 {
        DC[self.index()]
    }

    #[inline]
    pub fn opposite(self) -> Self {
        OPPOSITE[self.index()]
    }

    /// Quarter turn clockwise (North -> East).
    #[inline]
    pub fn right(self) -> Self {
        RIGHT[self.index()]
    }

    /// Quarter turn counter-clockwise (North -> West).
    #[inline]
    pub fn left(self) -> Self {
        LEFT[self.index()]
    }

    /// Display-only rotation used by renderers. Not used by any maze logic.
    #[inline]
    pub fn angle(self) -> i32 {
        ANGLE[self.index()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        }
    }
}
