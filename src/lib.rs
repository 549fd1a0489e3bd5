//! # micromaze
//!
//! Grid maze engine for agent-navigation experiments.
//!
//! Mazes are square grids of bit-packed cells (four wall bits and a
//! saturating visit counter per byte). They are either parsed from the
//! classic micromouse text format or carved in-process by a growing-tree
//! generator, then post-processed into a sealed 2x2 goal pocket with a single
//! entrance.
//!
//! ## Quick Start
//!
//! ```
//! use micromaze::prelude::*;
//!
//! # fn main() -> Result<(), MazeError> {
//! let maze = generate(Some(42), 0.3, 0.7)?;
//! let start = maze.start_cell();
//!
//! // Sensor-style queries used by controllers.
//! let ahead = maze.first_wall(Direction::North, start.row, start.col, 3);
//! let ring = maze.range_distance_from_goal(start);
//! assert_eq!(ring, 7);
//! # let _ = ahead;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Serialize/Deserialize for mazes, configs and snapshots
//! - `parallel`: evaluate batches of mazes on all cores via rayon
//!
//! ## Modules
//!
//! - [`direction`], [`cell`], [`maze`]: grid representation and queries
//! - [`generate`]: growing-tree carving
//! - [`goal`]: start runway, goal pocket and border sealing
//! - [`connectivity`]: reachability checks and repair
//! - [`loader`]: maze text sources
//! - [`agent`], [`sim`]: the mouse body, controllers and episode runner
//! - [`observer`]: read-only snapshots for dashboards

#[path = "core/direction.rs"]
pub mod direction;

#[path = "core/cell.rs"]
pub mod cell;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/maze.rs"]
pub mod maze;

#[path = "core/ascii.rs"]
mod ascii;

pub mod agent;
pub mod connectivity;
pub mod generate;
pub mod goal;
pub mod loader;
pub mod observer;
pub mod sim;

/// Prelude module for convenient imports.
///
/// ```
/// use micromaze::prelude::*;
/// ```
pub mod prelude {
    pub use crate::agent::{Action, AgentConfig, Controller, Mouse};
    pub use crate::cell::Cell;
    pub use crate::connectivity::{ensure_connected, ConnectivityReport};
    pub use crate::direction::Direction;
    pub use crate::error::MazeError;
    pub use crate::generate::{generate, GeneratedMaze, GeneratorConfig, MazeGenerator};
    pub use crate::goal::{add_border_walls, add_valid_walls, Entrance};
    pub use crate::loader::{load_maze, DirSource, MazeSource};
    pub use crate::maze::{Maze, Pos};
    pub use crate::observer::MazeSnapshot;
    pub use crate::sim::{explore, EpisodeReport, RunStats};
}
