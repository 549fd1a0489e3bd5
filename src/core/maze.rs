#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::direction::Direction;
use crate::error::MazeError;

pub const DEFAULT_SIZE: usize = 16;

/// A grid coordinate. Signed so that neighbours past the border are
/// representable; [`Maze::in_bounds`] decides whether it names a real cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pos {
    pub row: i32,
    pub col: i32,
}

impl Pos {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    #[inline]
    pub fn step(self, d: Direction) -> Self {
        Self::new(self.row + d.dr(), self.col + d.dc())
    }

    pub fn manhattan(self, other: Pos) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl From<(i32, i32)> for Pos {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

/// Square maze of bit-packed cells plus its fixed metadata.
///
/// Walls are double-sided: [`Maze::add_wall`] and [`Maze::remove_wall`] always
/// write both the cell and its neighbour, so a wall seen from one side is seen
/// from the other. At the border only the in-bounds side exists.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawMaze"))]
pub struct Maze {
    size: usize,
    cells: Vec<Cell>,
    start_cell: Pos,
    goal_cells: Vec<Pos>,
    destination: Option<Pos>,
    name: String,
}

impl Maze {
    pub const MIN_SIZE: usize = 2;
    pub const MAX_SIZE: usize = 255;

    /// Creates an `size`x`size` maze with no walls.
    ///
    /// # Panics
    /// Panics if `size` is outside `MIN_SIZE..=MAX_SIZE`.
    pub fn new(size: usize) -> Self {
        Self::filled(size, Cell::EMPTY)
    }

    /// Creates a maze in which every cell has all four walls.
    ///
    /// # Panics
    /// Panics if `size` is outside `MIN_SIZE..=MAX_SIZE`.
    pub fn fully_walled(size: usize) -> Self {
        Self::filled(size, Cell::WALLED)
    }

    fn filled(size: usize, cell: Cell) -> Self {
        assert!(
            (Self::MIN_SIZE..=Self::MAX_SIZE).contains(&size),
            "maze size must be in {}..={}",
            Self::MIN_SIZE,
            Self::MAX_SIZE
        );
        let n = size as i32;
        Self {
            size,
            cells: vec![cell; size * size],
            start_cell: Pos::new(n - 1, 0),
            goal_cells: default_goal_cells(size),
            destination: None,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn start_cell(&self) -> Pos {
        self.start_cell
    }

    pub fn goal_cells(&self) -> &[Pos] {
        &self.goal_cells
    }

    /// The outside cell in front of the goal pocket entrance, if known.
    pub fn destination(&self) -> Option<Pos> {
        self.destination
    }

    pub(crate) fn set_destination(&mut self, destination: Option<Pos>) {
        self.destination = destination;
    }

    /// Raw packed cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// True when the goal set is the 2x2 pocket the goal builder works on.
    pub fn has_goal_pocket(&self) -> bool {
        self.goal_cells.len() == 4
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        let n = self.size as i32;
        (0..n).flat_map(move |row| (0..n).map(move |col| Pos::new(row, col)))
    }

    #[inline]
    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        let n = self.size as i32;
        (0..n).contains(&row) && (0..n).contains(&col)
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        self.in_bounds(pos.row, pos.col)
    }

    /// Row-major index of `pos`. Callers guarantee `pos` is in bounds.
    #[inline]
    pub(crate) fn idx(&self, pos: Pos) -> usize {
        pos.row as usize * self.size + pos.col as usize
    }

    /// The in-bounds neighbour of `pos` in direction `d`.
    pub fn neighbor(&self, pos: Pos, d: Direction) -> Option<Pos> {
        let next = pos.step(d);
        self.contains(next).then_some(next)
    }

    fn checked(&self, row: i32, col: i32) -> Result<Cell, MazeError> {
        if !self.in_bounds(row, col) {
            return Err(MazeError::OutOfBounds {
                row,
                col,
                size: self.size,
            });
        }
        Ok(self.cells[self.idx(Pos::new(row, col))])
    }

    pub fn has_wall(&self, d: Direction, row: i32, col: i32) -> Result<bool, MazeError> {
        Ok(self.checked(row, col)?.has_wall(d))
    }

    /// The 4-bit wall mask of a cell.
    pub fn walls(&self, row: i32, col: i32) -> Result<u8, MazeError> {
        Ok(self.checked(row, col)?.walls())
    }

    fn write_side(&mut self, pos: Pos, d: Direction, present: bool) {
        if !self.contains(pos) {
            return;
        }
        let i = self.idx(pos);
        if present {
            self.cells[i].set_wall(d);
        } else {
            self.cells[i].clear_wall(d);
        }
    }

    fn write_wall(&mut self, d: Direction, row: i32, col: i32, present: bool) {
        let pos = Pos::new(row, col);
        self.write_side(pos, d, present);
        self.write_side(pos.step(d), d.opposite(), present);
    }

    /// Sets the wall on side `d` of `(row, col)` and the facing side of the
    /// neighbour. Sides outside the grid are skipped.
    pub fn add_wall(&mut self, d: Direction, row: i32, col: i32) {
        self.write_wall(d, row, col, true);
    }

    /// Clears the wall on side `d` of `(row, col)` and the facing side of the
    /// neighbour. Sides outside the grid are skipped.
    pub fn remove_wall(&mut self, d: Direction, row: i32, col: i32) {
        self.write_wall(d, row, col, false);
    }

    pub fn add_walls<I>(&mut self, walls: I)
    where
        I: IntoIterator<Item = (Direction, i32, i32)>,
    {
        for (d, row, col) in walls {
            self.add_wall(d, row, col);
        }
    }

    pub fn remove_walls<I>(&mut self, walls: I)
    where
        I: IntoIterator<Item = (Direction, i32, i32)>,
    {
        for (d, row, col) in walls {
            self.remove_wall(d, row, col);
        }
    }

    /// Sets every wall of every cell; visit counts are kept.
    pub fn fill_walls(&mut self) {
        for c in &mut self.cells {
            c.set_walls(Cell::WALLED.walls());
        }
    }

    /// Bumps the saturating visit counter. No-op outside the grid.
    pub fn add_visit(&mut self, row: i32, col: i32) {
        if self.in_bounds(row, col) {
            let i = self.idx(Pos::new(row, col));
            self.cells[i].add_visit();
        }
    }

    pub fn get_visits(&self, row: i32, col: i32) -> Result<u8, MazeError> {
        Ok(self.checked(row, col)?.visits())
    }

    pub fn reset_visits(&mut self) {
        for c in &mut self.cells {
            c.clear_visits();
        }
    }

    /// Ray cast from `(row, col)` towards `d`.
    ///
    /// Step 0 is the origin cell itself: a wall on its `d` side returns
    /// `Some(0)`. The scan checks at most `max_depth` cells and returns `None`
    /// when it leaves the grid first; the border beyond the last cell is not an
    /// implicit wall.
    pub fn first_wall(&self, d: Direction, row: i32, col: i32, max_depth: usize) -> Option<usize> {
        let mut pos = Pos::new(row, col);
        for step in 0..max_depth {
            if !self.contains(pos) {
                return None;
            }
            if self.cells[self.idx(pos)].has_wall(d) {
                return Some(step);
            }
            pos = pos.step(d);
        }
        None
    }

    pub fn manhattan_distance_from_goal(&self, cell: Pos) -> u32 {
        self.goal_cells
            .iter()
            .map(|g| cell.manhattan(*g))
            .min()
            .unwrap_or(0)
    }

    /// Manhattan distance to the entrance destination, or to the goal when the
    /// maze has none.
    pub fn manhattan_distance_from_gate(&self, cell: Pos) -> u32 {
        match self.destination {
            Some(dest) => cell.manhattan(dest),
            None => self.manhattan_distance_from_goal(cell),
        }
    }

    /// Concentric-ring distance: 0 on the innermost ring, `N/2 - 1` on the
    /// outer border.
    pub fn range_distance_from_goal(&self, cell: Pos) -> u32 {
        let n = self.size as i32;
        let lo = cell.row.min(cell.col);
        let hi = cell.row.max(cell.col);
        for i in 0..n / 2 {
            if lo == i || hi == n - 1 - i {
                return (n / 2 - 1 - i) as u32;
            }
        }
        0
    }

    pub fn x_distance_from_goal(&self, cell: Pos) -> u32 {
        match self.destination {
            Some(dest) => dest.col.abs_diff(cell.col),
            None => self
                .goal_cells
                .iter()
                .map(|g| g.col.abs_diff(cell.col))
                .min()
                .unwrap_or(0),
        }
    }

    pub fn y_distance_from_goal(&self, cell: Pos) -> u32 {
        match self.destination {
            Some(dest) => dest.row.abs_diff(cell.row),
            None => self
                .goal_cells
                .iter()
                .map(|g| g.row.abs_diff(cell.row))
                .min()
                .unwrap_or(0),
        }
    }

    pub fn is_in_goal(&self, cell: Pos) -> bool {
        self.goal_cells.contains(&cell)
    }

    /// Records the first open pocket wall (canonical order) as the destination.
    ///
    /// Leaves the destination empty when the pocket is sealed or the maze has
    /// no 2x2 pocket.
    pub fn find_destination(&mut self) {
        self.destination = self.scan_destination();
    }

    fn scan_destination(&self) -> Option<Pos> {
        if !self.has_goal_pocket() {
            return None;
        }
        for (d, row, col) in goal_external_walls(&self.goal_cells) {
            let pos = Pos::new(row, col);
            if self.contains(pos) && !self.cells[self.idx(pos)].has_wall(d) {
                return Some(pos.step(d));
            }
        }
        None
    }
}

/// Unchecked wire form of [`Maze`]; deserialisation goes through
/// `TryFrom<RawMaze>` so a decoded maze upholds the same invariants as a
/// constructed one.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawMaze {
    size: usize,
    cells: Vec<Cell>,
    start_cell: Pos,
    goal_cells: Vec<Pos>,
    destination: Option<Pos>,
    name: String,
}

#[cfg(feature = "serde")]
impl TryFrom<RawMaze> for Maze {
    type Error = MazeError;

    fn try_from(raw: RawMaze) -> Result<Self, Self::Error> {
        if !(Self::MIN_SIZE..=Self::MAX_SIZE).contains(&raw.size) {
            return Err(MazeError::InvalidConfig("maze size out of range"));
        }
        if raw.cells.len() != raw.size * raw.size {
            return Err(MazeError::InvalidConfig("cell count does not match maze size"));
        }
        let maze = Maze {
            size: raw.size,
            cells: raw.cells,
            start_cell: raw.start_cell,
            goal_cells: raw.goal_cells,
            destination: raw.destination,
            name: raw.name,
        };
        if !maze.contains(maze.start_cell) {
            return Err(MazeError::InvalidConfig("start cell outside the grid"));
        }
        if maze.goal_cells.is_empty() || !maze.goal_cells.iter().all(|&g| maze.contains(g)) {
            return Err(MazeError::InvalidConfig("goal cells empty or outside the grid"));
        }
        if maze.destination.is_some_and(|d| !maze.contains(d)) {
            return Err(MazeError::InvalidConfig("destination outside the grid"));
        }
        let one_sided = maze.positions().any(|pos| {
            Direction::ALL.into_iter().any(|d| {
                maze.neighbor(pos, d).is_some_and(|nb| {
                    maze.cells[maze.idx(pos)].has_wall(d)
                        != maze.cells[maze.idx(nb)].has_wall(d.opposite())
                })
            })
        });
        if one_sided {
            return Err(MazeError::InvalidConfig("wall recorded on one side only"));
        }
        Ok(maze)
    }
}

impl Default for Maze {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

/// Centre 2x2 block (top-left, top-right, bottom-right, bottom-left) for even
/// sizes, the single centre cell for odd sizes.
pub fn default_goal_cells(size: usize) -> Vec<Pos> {
    let mid = (size / 2) as i32;
    if size % 2 == 1 {
        return vec![Pos::new(mid, mid)];
    }
    vec![
        Pos::new(mid - 1, mid - 1),
        Pos::new(mid - 1, mid),
        Pos::new(mid, mid),
        Pos::new(mid, mid - 1),
    ]
}

/// The 8 walls around a 2x2 goal pocket, two per goal cell.
pub(crate) fn goal_external_walls(goal: &[Pos]) -> [(Direction, i32, i32); 8] {
    use Direction::*;
    let (tl, tr, br, bl) = (goal[0], goal[1], goal[2], goal[3]);
    [
        (West, tl.row, tl.col),
        (North, tl.row, tl.col),
        (North, tr.row, tr.col),
        (East, tr.row, tr.col),
        (East, br.row, br.col),
        (South, br.row, br.col),
        (South, bl.row, bl.col),
        (West, bl.row, bl.col),
    ]
}

/// The 4 walls between the cells of a 2x2 goal pocket.
pub(crate) fn goal_internal_walls(goal: &[Pos]) -> [(Direction, i32, i32); 4] {
    use Direction::*;
    let (tl, tr, br) = (goal[0], goal[1], goal[2]);
    [
        (East, tl.row, tl.col),
        (South, tl.row, tl.col),
        (South, tr.row, tr.col),
        (West, br.row, br.col),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn assert_symmetric(maze: &Maze) {
        for pos in maze.positions() {
            for d in Direction::ALL {
                if let Some(nb) = maze.neighbor(pos, d) {
                    assert_eq!(
                        maze.has_wall(d, pos.row, pos.col).unwrap(),
                        maze.has_wall(d.opposite(), nb.row, nb.col).unwrap(),
                        "asymmetric wall at {:?} {:?}",
                        pos,
                        d
                    );
                }
            }
        }
    }

    #[test]
    fn walls_stay_symmetric_under_random_mutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut maze = Maze::new(8);
        for _ in 0..2_000 {
            let d = Direction::ALL[rng.random_range(0..4)];
            // Include coordinates one past the border on every side.
            let row = rng.random_range(-1..9);
            let col = rng.random_range(-1..9);
            if rng.random_bool(0.5) {
                maze.add_wall(d, row, col);
            } else {
                maze.remove_wall(d, row, col);
            }
        }
        assert_symmetric(&maze);
    }

    #[test]
    fn border_write_only_touches_the_inside() {
        let mut maze = Maze::new(4);
        maze.add_wall(Direction::North, 0, 2);
        assert!(maze.has_wall(Direction::North, 0, 2).unwrap());
        assert_eq!(maze.cells().iter().filter(|c| c.walls() != 0).count(), 1);

        // Origin outside, neighbour inside: the south wall of the last row.
        maze.add_wall(Direction::North, 4, 1);
        assert!(maze.has_wall(Direction::South, 3, 1).unwrap());

        maze.remove_wall(Direction::North, 4, 1);
        assert!(!maze.has_wall(Direction::South, 3, 1).unwrap());
    }

    #[test]
    fn out_of_bounds_reads_are_errors() {
        let maze = Maze::new(4);
        assert!(matches!(
            maze.has_wall(Direction::North, -1, 0),
            Err(MazeError::OutOfBounds { row: -1, col: 0, size: 4 })
        ));
        assert!(maze.get_visits(0, 4).is_err());
        assert!(maze.walls(4, 4).is_err());
    }

    #[test]
    fn visits_saturate_and_ignore_out_of_bounds() {
        let mut maze = Maze::new(4);
        for _ in 0..20 {
            maze.add_visit(1, 1);
        }
        assert_eq!(maze.get_visits(1, 1).unwrap(), 15);
        maze.add_visit(-1, 0);
        maze.add_visit(0, 9);
        assert_eq!(maze.cells().iter().map(|c| c.visits() as u32).sum::<u32>(), 15);

        maze.reset_visits();
        assert_eq!(maze.get_visits(1, 1).unwrap(), 0);
    }

    #[test]
    fn bulk_walls_apply_in_order() {
        let mut maze = Maze::new(4);
        maze.add_walls([(Direction::East, 0, 0), (Direction::South, 0, 0)]);
        assert_eq!(maze.walls(0, 0).unwrap(), 0b0110);
        maze.remove_walls([(Direction::East, 0, 0)]);
        assert_eq!(maze.walls(0, 0).unwrap(), 0b0100);
        assert!(!maze.has_wall(Direction::West, 0, 1).unwrap());
    }

    #[test]
    fn first_wall_counts_the_origin_as_step_zero() {
        let mut maze = Maze::new(8);
        maze.add_wall(Direction::East, 2, 0);
        assert_eq!(maze.first_wall(Direction::East, 2, 0, 4), Some(0));

        // (2,1) only carries the mirrored west side of that wall.
        maze.add_wall(Direction::East, 2, 3);
        assert_eq!(maze.first_wall(Direction::East, 2, 1, 4), Some(2));
        assert_eq!(maze.first_wall(Direction::East, 2, 1, 2), None);
    }

    #[test]
    fn first_wall_treats_the_grid_edge_as_no_information() {
        let maze = Maze::new(4);
        assert_eq!(maze.first_wall(Direction::North, 1, 1, 16), None);

        let walled = Maze::fully_walled(4);
        for d in Direction::ALL {
            assert_eq!(walled.first_wall(d, 1, 1, 1), Some(0));
            assert_eq!(walled.first_wall(d, 1, 1, 0), None);
        }
    }

    #[test]
    fn first_wall_never_reaches_max_depth() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut maze = Maze::new(16);
        for _ in 0..300 {
            let d = Direction::ALL[rng.random_range(0..4)];
            maze.add_wall(d, rng.random_range(0..16), rng.random_range(0..16));
        }
        for pos in maze.positions() {
            for d in Direction::ALL {
                for depth in 0..6 {
                    if let Some(step) = maze.first_wall(d, pos.row, pos.col, depth) {
                        assert!(step < depth);
                    }
                }
            }
        }
    }

    #[test]
    fn goal_cells_follow_grid_parity() {
        let maze = Maze::new(16);
        assert_eq!(
            maze.goal_cells(),
            &[Pos::new(7, 7), Pos::new(7, 8), Pos::new(8, 8), Pos::new(8, 7)]
        );
        assert_eq!(maze.start_cell(), Pos::new(15, 0));
        assert!(maze.has_goal_pocket());

        let odd = Maze::new(3);
        assert_eq!(odd.goal_cells(), &[Pos::new(1, 1)]);
        assert!(!odd.has_goal_pocket());
    }

    #[test]
    fn distances_from_goal() {
        let maze = Maze::new(16);
        // Nearest goal cell is (8, 7).
        assert_eq!(maze.manhattan_distance_from_goal(Pos::new(15, 0)), 14);
        assert_eq!(maze.manhattan_distance_from_goal(Pos::new(8, 8)), 0);
        assert!(maze.is_in_goal(Pos::new(7, 8)));

        assert_eq!(maze.range_distance_from_goal(Pos::new(0, 5)), 7);
        assert_eq!(maze.range_distance_from_goal(Pos::new(15, 0)), 7);
        assert_eq!(maze.range_distance_from_goal(Pos::new(3, 10)), 4);
        assert_eq!(maze.range_distance_from_goal(Pos::new(7, 8)), 0);

        // No destination yet: per-axis distance to the nearest goal cell.
        assert_eq!(maze.x_distance_from_goal(Pos::new(15, 0)), 7);
        assert_eq!(maze.y_distance_from_goal(Pos::new(15, 0)), 7);
    }

    #[test]
    fn destination_comes_from_the_open_pocket_wall() {
        let mut maze = Maze::new(16);
        maze.add_walls(goal_external_walls(maze.goal_cells()));
        maze.find_destination();
        assert_eq!(maze.destination(), None);

        maze.remove_wall(Direction::East, 8, 8);
        maze.find_destination();
        assert_eq!(maze.destination(), Some(Pos::new(8, 9)));
        assert_eq!(maze.x_distance_from_goal(Pos::new(15, 0)), 9);
        assert_eq!(maze.y_distance_from_goal(Pos::new(15, 0)), 7);
        assert_eq!(maze.manhattan_distance_from_gate(Pos::new(15, 0)), 16);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip_keeps_the_maze() {
        let mut maze = Maze::fully_walled(4).with_name("rt");
        maze.remove_wall(Direction::East, 3, 0);
        maze.add_visit(3, 0);
        let json = serde_json::to_string(&maze).unwrap();
        let back: Maze = serde_json::from_str(&json).unwrap();
        assert_eq!(back, maze);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_with_broken_invariants_is_rejected() {
        use serde_json::{json, Value};

        fn decode(field: &str, value: Value) -> Result<Maze, serde_json::Error> {
            let mut v = serde_json::to_value(Maze::new(4)).unwrap();
            v[field] = value;
            serde_json::from_value(v)
        }

        assert!(decode("name", json!("ok")).is_ok());
        assert!(decode("cells", json!([])).is_err());
        assert!(decode("size", json!(1)).is_err());
        assert!(decode("goal_cells", json!([])).is_err());
        assert!(decode("start_cell", json!({ "row": 4, "col": 0 })).is_err());
        assert!(decode("destination", json!({ "row": -1, "col": 2 })).is_err());
        // East wall on (0, 0) without the matching west wall on (0, 1).
        let mut one_sided = vec![0u8; 16];
        one_sided[0] = 2;
        assert!(decode("cells", json!(one_sided)).is_err());

        let err = serde_json::from_str::<Maze>(
            r#"{"size":16,"cells":[],"start_cell":{"row":15,"col":0},
                "goal_cells":[{"row":7,"col":7}],"destination":null,"name":""}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cell count"));
    }
}
