//! The mouse body and the controllers that drive it.
//!
//! A [`Mouse`] turns the maze into a fixed-size input vector and applies one
//! absolute move per step. Decision making lives behind [`Controller`], so a
//! trained network, a closure or one of the built-in policies can all drive
//! the same body.

use hashbrown::HashSet;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::MazeError;
use crate::maze::{Maze, Pos};

/// Length of the vector returned by [`Mouse::sense`].
pub const INPUT_COUNT: usize = 7;

/// Picks an action index from the mouse's inputs.
///
/// Indices `0..4` move north, east, south and west; anything else stays put.
pub trait Controller {
    fn sense_and_act(&mut self, inputs: &[f64]) -> usize;
}

impl<F> Controller for F
where
    F: FnMut(&[f64]) -> usize,
{
    fn sense_and_act(&mut self, inputs: &[f64]) -> usize {
        self(inputs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Action {
    Move(Direction),
    Stay,
}

impl Action {
    pub fn from_index(i: usize) -> Self {
        match Direction::from_index(i) {
            Some(d) => Action::Move(d),
            None => Action::Stay,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Action::Move(d) => d.index(),
            Action::Stay => 4,
        }
    }
}

/// Outcome of a single [`Mouse::act`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StepEvent {
    Moved,
    Bump,
    Stayed,
    ReachedGoal,
    Timeout,
}

impl StepEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            StepEvent::Moved => "moved",
            StepEvent::Bump => "bump",
            StepEvent::Stayed => "stayed",
            StepEvent::ReachedGoal => "reached_goal",
            StepEvent::Timeout => "timeout",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StepEvent::ReachedGoal | StepEvent::Timeout)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AgentConfig {
    /// How many cells the wall sensors look ahead, counting the current one.
    pub sight: usize,
    /// Step limit per episode; `None` means `size * size`.
    pub max_steps: Option<u32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            sight: 1,
            max_steps: None,
        }
    }
}

impl AgentConfig {
    pub fn with_sight(mut self, sight: usize) -> Self {
        self.sight = sight;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn validate(&self) -> Result<(), MazeError> {
        if self.sight == 0 {
            return Err(MazeError::InvalidConfig("sight must be at least 1"));
        }
        if self.max_steps == Some(0) {
            return Err(MazeError::InvalidConfig("max_steps must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Mouse {
    start: Pos,
    position: Pos,
    heading: Direction,
    sight: usize,
    max_steps: u32,
    alive: bool,
    arrived: bool,
    steps: u32,
    collisions: u32,
    visited: HashSet<Pos>,
    closest: Pos,
}

impl Mouse {
    /// A mouse on `maze`'s start cell, facing north.
    pub fn new(maze: &Maze, config: AgentConfig) -> Result<Self, MazeError> {
        config.validate()?;
        let area = (maze.size() * maze.size()) as u32;
        let start = maze.start_cell();
        let mut mouse = Self {
            start,
            position: start,
            heading: Direction::North,
            sight: config.sight,
            max_steps: config.max_steps.unwrap_or(area),
            alive: true,
            arrived: false,
            steps: 0,
            collisions: 0,
            visited: HashSet::new(),
            closest: start,
        };
        mouse.reset();
        Ok(mouse)
    }

    /// Back to the start cell with every counter cleared.
    pub fn reset(&mut self) {
        self.position = self.start;
        self.heading = Direction::North;
        self.alive = true;
        self.arrived = false;
        self.steps = 0;
        self.collisions = 0;
        self.visited.clear();
        self.visited.insert(self.start);
        self.closest = self.start;
    }

    pub fn start(&self) -> Pos {
        self.start
    }

    pub fn position(&self) -> Pos {
        self.position
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn sight(&self) -> usize {
        self.sight
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    pub fn alive(&self) -> bool {
        self.alive
    }

    pub fn arrived(&self) -> bool {
        self.arrived
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn collisions(&self) -> u32 {
        self.collisions
    }

    pub fn visited(&self) -> &HashSet<Pos> {
        &self.visited
    }

    /// Cell with the smallest ring distance reached so far.
    pub fn closest(&self) -> Pos {
        self.closest
    }

    /// Sensor vector:
    /// `[north, east, south, west, x progress, y progress, ring proximity]`.
    ///
    /// Wall sensors read `1 - d / sight` for the first wall `d` cells away and
    /// 0 when nothing is within sight. Progress values are 0 at the start and
    /// 1 level with the destination; proximity is 1 on the innermost ring.
    pub fn sense(&self, maze: &Maze) -> [f64; INPUT_COUNT] {
        let mut inputs = [0.0; INPUT_COUNT];
        for d in Direction::ALL {
            inputs[d.index()] = self.wall_sensor(maze, d);
        }
        inputs[4] = progress(
            maze.x_distance_from_goal(self.start),
            maze.x_distance_from_goal(self.position),
        );
        inputs[5] = progress(
            maze.y_distance_from_goal(self.start),
            maze.y_distance_from_goal(self.position),
        );
        let max_range = (maze.size() / 2).saturating_sub(1) as u32;
        inputs[6] = progress(max_range, maze.range_distance_from_goal(self.position));
        inputs
    }

    fn wall_sensor(&self, maze: &Maze, d: Direction) -> f64 {
        let (r, c) = (self.position.row, self.position.col);
        match maze.first_wall(d, r, c, self.sight) {
            Some(dist) => 1.0 - dist as f64 / self.sight as f64,
            None => 0.0,
        }
    }

    /// Applies one action. Once the episode is over this does nothing and
    /// returns [`StepEvent::Stayed`].
    pub fn act(&mut self, action: Action, maze: &Maze) -> StepEvent {
        if !self.alive {
            return StepEvent::Stayed;
        }
        self.steps += 1;

        let mut event = StepEvent::Stayed;
        if let Action::Move(d) = action {
            self.heading = d;
            match self.open_step(maze, d) {
                Some(next) => {
                    self.position = next;
                    event = StepEvent::Moved;
                }
                None => {
                    self.collisions += 1;
                    event = StepEvent::Bump;
                }
            }
        }

        if maze.range_distance_from_goal(self.position) < maze.range_distance_from_goal(self.closest) {
            self.closest = self.position;
        }
        self.visited.insert(self.position);

        if maze.is_in_goal(self.position) {
            self.arrived = true;
            self.alive = false;
            return StepEvent::ReachedGoal;
        }
        if self.steps >= self.max_steps {
            self.alive = false;
            return StepEvent::Timeout;
        }
        event
    }

    /// The neighbour towards `d` if no wall (or grid edge) is in the way.
    fn open_step(&self, maze: &Maze, d: Direction) -> Option<Pos> {
        let (r, c) = (self.position.row, self.position.col);
        if maze.has_wall(d, r, c).unwrap_or(true) {
            return None;
        }
        maze.neighbor(self.position, d)
    }
}

/// `(max - current) / max`, or 1 when there is no distance to cover.
fn progress(max: u32, current: u32) -> f64 {
    if max == 0 {
        return 1.0;
    }
    (max as f64 - current as f64) / max as f64
}

/// Uniformly random moves from a seeded stream.
#[derive(Debug, Clone)]
pub struct RandomController {
    rng: ChaCha8Rng,
}

impl RandomController {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Controller for RandomController {
    fn sense_and_act(&mut self, _inputs: &[f64]) -> usize {
        self.rng.random_range(0..Direction::ALL.len())
    }
}

/// Right-hand rule: prefer turning right, then straight, left and back.
///
/// Reads walls from the first four inputs, so it expects a mouse with
/// `sight == 1` where a sensor reads exactly 1.0 for a wall on that side.
#[derive(Debug, Clone)]
pub struct WallFollower {
    heading: Direction,
}

impl WallFollower {
    pub fn new() -> Self {
        Self {
            heading: Direction::North,
        }
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }
}

impl Default for WallFollower {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for WallFollower {
    fn sense_and_act(&mut self, inputs: &[f64]) -> usize {
        let h = self.heading;
        let blocked = |d: Direction| inputs.get(d.index()).is_some_and(|&v| v >= 1.0);
        let choice = [h.right(), h, h.left(), h.opposite()]
            .into_iter()
            .find(|&d| !blocked(d))
            .unwrap_or(h);
        self.heading = choice;
        choice.index()
    }
}
