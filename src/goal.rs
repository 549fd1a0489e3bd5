//! Start runway, goal pocket and border sealing.
//!
//! Runs on a carved maze and leaves it with:
//! - the start cell open to the east and closed to the south,
//! - the 2x2 goal pocket open inside and reachable through exactly one of its
//!   eight perimeter walls,
//! - every border-facing wall present.

use rand::Rng;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::MazeError;
use crate::maze::{self, Maze, Pos};

/// The single opening into the goal pocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Entrance {
    /// Goal cell whose wall was opened.
    pub goal_cell: Pos,
    /// Side of `goal_cell` that was opened.
    pub direction: Direction,
    /// Outside cell in front of the opening; becomes the maze destination.
    pub outside: Pos,
}

/// The pocket must be 2x2 and clear of the border, so every perimeter wall
/// has an in-bounds cell behind it.
fn require_pocket(maze: &Maze) -> Result<(), MazeError> {
    if !maze.has_goal_pocket() {
        return Err(MazeError::InvalidConfig("goal zone needs a 2x2 goal pocket"));
    }
    let last = maze.size() as i32 - 1;
    let on_border = maze
        .goal_cells()
        .iter()
        .any(|p| p.row == 0 || p.col == 0 || p.row == last || p.col == last);
    if on_border {
        return Err(MazeError::InvalidConfig("goal pocket touches the border"));
    }
    Ok(())
}

/// The 8 perimeter walls of the goal pocket, two per goal cell, in
/// top-left, top-right, bottom-right, bottom-left order.
pub fn goal_external_walls(maze: &Maze) -> Result<[(Direction, i32, i32); 8], MazeError> {
    require_pocket(maze)?;
    Ok(maze::goal_external_walls(maze.goal_cells()))
}

/// The 4 walls between the goal cells.
pub fn goal_internal_walls(maze: &Maze) -> Result<[(Direction, i32, i32); 4], MazeError> {
    require_pocket(maze)?;
    Ok(maze::goal_internal_walls(maze.goal_cells()))
}

/// Opens the runway east of the start cell and closes its south side.
pub fn carve_start(maze: &mut Maze) {
    let s = maze.start_cell();
    maze.remove_wall(Direction::East, s.row, s.col);
    maze.add_wall(Direction::South, s.row, s.col);
}

/// Seals the goal pocket, opens one random entrance and closes the border.
///
/// Sets the maze destination to the cell in front of the entrance.
pub fn add_valid_walls(maze: &mut Maze, rng: &mut impl Rng) -> Result<Entrance, MazeError> {
    let external = goal_external_walls(maze)?;
    let internal = goal_internal_walls(maze)?;

    carve_start(maze);
    maze.add_walls(external);
    maze.remove_walls(internal);

    let (direction, row, col) = external[rng.random_range(0..external.len())];
    maze.remove_wall(direction, row, col);
    let goal_cell = Pos::new(row, col);
    let outside = goal_cell.step(direction);
    maze.set_destination(Some(outside));

    add_border_walls(maze);

    debug!(?goal_cell, ?direction, "goal pocket entrance opened");
    Ok(Entrance {
        goal_cell,
        direction,
        outside,
    })
}

/// Adds every boundary-facing wall on the outer ring.
pub fn add_border_walls(maze: &mut Maze) {
    let n = maze.size() as i32;
    for col in 0..n {
        maze.add_wall(Direction::North, 0, col);
        maze.add_wall(Direction::South, n - 1, col);
    }
    for row in 0..n {
        maze.add_wall(Direction::West, row, 0);
        maze.add_wall(Direction::East, row, n - 1);
    }
}
