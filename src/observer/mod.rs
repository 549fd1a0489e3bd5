use crate::agent::Mouse;
use crate::maze::{Maze, Pos};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A read-only snapshot of a maze, for dashboards and dumps.
///
/// Snapshotting copies; the maze itself is never touched. Walls and visits are
/// row-major, one byte per cell.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MazeSnapshot {
    pub name: String,
    pub size: usize,
    pub start: Pos,
    pub goal_cells: Vec<Pos>,
    pub destination: Option<Pos>,
    pub walls: Vec<u8>,
    pub visits: Vec<u8>,
    pub mouse: Option<MouseSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MouseSnapshot {
    pub position: Pos,
    pub heading: String,
    pub steps: u32,
    pub collisions: u32,
    pub cells_visited: usize,
    pub arrived: bool,
}

impl MazeSnapshot {
    pub fn of(maze: &Maze) -> Self {
        Self {
            name: maze.name().to_string(),
            size: maze.size(),
            start: maze.start_cell(),
            goal_cells: maze.goal_cells().to_vec(),
            destination: maze.destination(),
            walls: maze.cells().iter().map(|c| c.walls()).collect(),
            visits: maze.cells().iter().map(|c| c.visits()).collect(),
            mouse: None,
        }
    }

    pub fn with_mouse(mut self, mouse: &Mouse) -> Self {
        self.mouse = Some(MouseSnapshot {
            position: mouse.position(),
            heading: mouse.heading().name().to_string(),
            steps: mouse.steps(),
            collisions: mouse.collisions(),
            cells_visited: mouse.visited().len(),
            arrived: mouse.arrived(),
        });
        self
    }

    /// Cells with at least one recorded visit.
    pub fn cells_visited(&self) -> usize {
        self.visits.iter().filter(|&&v| v > 0).count()
    }
}
