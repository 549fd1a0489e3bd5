//! Growing-tree maze generation.
//!
//! Carving starts at the grid centre and keeps two frontiers:
//! - `leaf_cells`: cells with a single exit, extended newest-first so corridors
//!   run long,
//! - `path_cells`: cells with two or more exits, picked at random when the
//!   generator decides to fork.
//!
//! `fork_chance` sets how often a fork is taken instead of extending the newest
//! corridor; `turn_bias` weights continuing straight against turning.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::connectivity::{ensure_connected, ConnectivityReport};
use crate::direction::Direction;
use crate::error::MazeError;
use crate::goal::{add_valid_walls, Entrance};
use crate::maze::{Maze, Pos, DEFAULT_SIZE};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeneratorConfig {
    /// Grid side; must be even so the goal pocket sits on the centre.
    pub size: usize,
    /// Probability of forking from a random branch cell instead of extending
    /// the newest corridor.
    pub fork_chance: f64,
    /// Weight of continuing in a cell's carving direction; every other
    /// direction gets `1 - turn_bias`.
    pub turn_bias: f64,
    /// Fixed seed; `None` draws a fresh one per maze.
    pub seed: Option<u64>,
    /// Knock down walls after sealing the goal pocket until every cell is
    /// reachable.
    pub repair_connectivity: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            fork_chance: 0.3,
            turn_bias: 0.7,
            seed: None,
            repair_connectivity: true,
        }
    }
}

impl GeneratorConfig {
    pub const MIN_SIZE: usize = 4;
    pub const MAX_SIZE: usize = 64;

    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_fork_chance(mut self, fork_chance: f64) -> Self {
        self.fork_chance = fork_chance;
        self
    }

    pub fn with_turn_bias(mut self, turn_bias: f64) -> Self {
        self.turn_bias = turn_bias;
        self
    }

    pub fn with_repair(mut self, repair: bool) -> Self {
        self.repair_connectivity = repair;
        self
    }

    pub fn validate(&self) -> Result<(), MazeError> {
        if self.size < Self::MIN_SIZE {
            return Err(MazeError::InvalidConfig("size too small"));
        }
        if self.size > Self::MAX_SIZE {
            return Err(MazeError::InvalidConfig("size too large"));
        }
        if self.size % 2 != 0 {
            return Err(MazeError::InvalidConfig("size must be even"));
        }
        if !(0.0..=1.0).contains(&self.fork_chance) {
            return Err(MazeError::InvalidConfig("fork_chance must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.turn_bias) {
            return Err(MazeError::InvalidConfig("turn_bias must be in [0, 1]"));
        }
        Ok(())
    }
}

/// Bookkeeping left over after carving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CarveReport {
    /// Frontier pops performed.
    pub iterations: usize,
    /// Cells never reached; 0 for a complete maze.
    pub cells_remaining: usize,
    pub leaf_cells_left: usize,
    pub path_cells_left: usize,
}

impl CarveReport {
    pub fn is_complete(&self) -> bool {
        self.cells_remaining == 0
    }

    pub fn ensure_complete(&self) -> Result<(), MazeError> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(MazeError::GenerationExhausted {
                unvisited: self.cells_remaining,
            })
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Frontier {
    pos: Pos,
    exits: u32,
}

/// Carving state, dropped once the tree is grown.
struct GrowingTree<'a> {
    maze: &'a mut Maze,
    visited: HashSet<Pos>,
    last_direction: HashMap<Pos, Direction>,
    turn_bias: f64,
}

impl GrowingTree<'_> {
    fn unvisited_neighbor(&self, pos: Pos, d: Direction) -> Option<Pos> {
        self.maze
            .neighbor(pos, d)
            .filter(|next| !self.visited.contains(next))
    }

    fn unvisited_neighbors(&self, pos: Pos) -> usize {
        Direction::ALL
            .iter()
            .filter(|&&d| self.unvisited_neighbor(pos, d).is_some())
            .count()
    }

    fn weight(&self, pos: Pos, d: Direction) -> f64 {
        match self.last_direction.get(&pos) {
            None => 1.0,
            Some(&last) if last == d => self.turn_bias,
            Some(_) => 1.0 - self.turn_bias,
        }
    }

    /// Carves from `pos` into a weighted pick of its unvisited neighbours.
    fn try_carve(&mut self, pos: Pos, rng: &mut impl Rng) -> Option<Pos> {
        let candidates: Vec<(Direction, f64)> = Direction::ALL
            .into_iter()
            .filter(|&d| self.unvisited_neighbor(pos, d).is_some())
            .map(|d| (d, self.weight(pos, d)))
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let d = candidates[weighted_index(&candidates, rng)].0;
        let next = pos.step(d);
        self.maze.remove_wall(d, pos.row, pos.col);
        self.visited.insert(next);
        self.last_direction.insert(next, d);
        Some(next)
    }
}

/// Index drawn proportionally to the weights; uniform if they sum to zero.
fn weighted_index(candidates: &[(Direction, f64)], rng: &mut impl Rng) -> usize {
    let total: f64 = candidates.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return rng.random_range(0..candidates.len());
    }
    let r = rng.random::<f64>() * total;
    let mut cumsum = 0.0;
    for (i, (_, w)) in candidates.iter().enumerate() {
        cumsum += w;
        if r <= cumsum {
            return i;
        }
    }
    candidates.len() - 1
}

fn take_random(cells: &mut Vec<Frontier>, rng: &mut impl Rng) -> Option<Frontier> {
    if cells.is_empty() {
        return None;
    }
    let i = rng.random_range(0..cells.len());
    Some(cells.swap_remove(i))
}

/// Runs the growing tree over `maze`, resetting every wall first.
///
/// Visit counts are left untouched.
pub fn carve(maze: &mut Maze, fork_chance: f64, turn_bias: f64, rng: &mut impl Rng) -> CarveReport {
    maze.fill_walls();
    let n = maze.size() as i32;
    let center = Pos::new(n / 2, n / 2);
    let total = maze.size() * maze.size();

    let mut tree = GrowingTree {
        maze,
        visited: HashSet::with_capacity(total),
        last_direction: HashMap::with_capacity(total),
        turn_bias,
    };
    tree.visited.insert(center);

    let mut leaf_cells: VecDeque<Frontier> = VecDeque::new();
    let mut path_cells: Vec<Frontier> = Vec::new();
    leaf_cells.push_back(Frontier {
        pos: center,
        exits: 0,
    });

    let mut cells_to_add = total - 1;
    let mut iterations = 0;

    while cells_to_add > 0 && (!leaf_cells.is_empty() || !path_cells.is_empty()) {
        iterations += 1;

        let fork = rng.random::<f64>() < fork_chance && !path_cells.is_empty();
        let picked = if fork {
            take_random(&mut path_cells, rng)
        } else {
            match leaf_cells.pop_back() {
                Some(cell) => Some(cell),
                None => take_random(&mut path_cells, rng),
            }
        };
        let Some(cell) = picked else { break };

        let Some(next) = tree.try_carve(cell.pos, rng) else {
            // Exhausted: the cell leaves the frontier.
            continue;
        };
        cells_to_add -= 1;

        if tree.unvisited_neighbors(next) > 0 {
            leaf_cells.push_back(Frontier { pos: next, exits: 1 });
        }

        let exits = cell.exits + 1;
        if tree.unvisited_neighbors(cell.pos) > 0 {
            let requeued = Frontier {
                pos: cell.pos,
                exits,
            };
            if exits <= 1 {
                leaf_cells.push_front(requeued);
            } else {
                path_cells.push(requeued);
            }
        }
    }

    let report = CarveReport {
        iterations,
        cells_remaining: cells_to_add,
        leaf_cells_left: leaf_cells.len(),
        path_cells_left: path_cells.len(),
    };
    if !report.is_complete() {
        warn!(
            unvisited = report.cells_remaining,
            "growing tree ran out of frontier before visiting every cell"
        );
    }
    report
}

/// A finished maze plus what it took to make it.
#[derive(Debug, Clone)]
pub struct GeneratedMaze {
    pub maze: Maze,
    /// Seed the maze was generated from; `None` when an external RNG was used.
    pub seed: Option<u64>,
    pub carve: CarveReport,
    pub entrance: Entrance,
    pub connectivity: Option<ConnectivityReport>,
}

#[derive(Debug, Clone)]
pub struct MazeGenerator {
    config: GeneratorConfig,
}

impl MazeGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, MazeError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates from the configured seed, or from a fresh one that is logged
    /// and returned so the maze can be reproduced.
    pub fn generate(&self) -> Result<GeneratedMaze, MazeError> {
        let seed = match self.config.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u64>();
                debug!(seed, "drew a fresh generation seed");
                seed
            }
        };
        self.generate_seeded(seed)
    }

    pub fn generate_seeded(&self, seed: u64) -> Result<GeneratedMaze, MazeError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut out = self.generate_with_rng(&mut rng)?;
        out.seed = Some(seed);
        out.maze.set_name(format!("generated-{seed}"));
        Ok(out)
    }

    /// Full pipeline with a caller-supplied RNG: carve, build the goal zone
    /// and border, then optionally repair connectivity.
    pub fn generate_with_rng(&self, rng: &mut impl Rng) -> Result<GeneratedMaze, MazeError> {
        let cfg = &self.config;
        debug!(
            size = cfg.size,
            fork_chance = cfg.fork_chance,
            turn_bias = cfg.turn_bias,
            "generating maze"
        );

        let mut maze = Maze::fully_walled(cfg.size).with_name("generated");
        let carve_report = carve(&mut maze, cfg.fork_chance, cfg.turn_bias, rng);
        let entrance = add_valid_walls(&mut maze, rng)?;
        let connectivity = cfg.repair_connectivity.then(|| ensure_connected(&mut maze));

        debug!(iterations = carve_report.iterations, "maze generated");
        Ok(GeneratedMaze {
            maze,
            seed: None,
            carve: carve_report,
            entrance,
            connectivity,
        })
    }
}

/// Generates a 16x16 maze with the goal zone built and connectivity repaired.
pub fn generate(seed: Option<u64>, fork_chance: f64, turn_bias: f64) -> Result<Maze, MazeError> {
    let mut config = GeneratorConfig::default()
        .with_fork_chance(fork_chance)
        .with_turn_bias(turn_bias);
    config.seed = seed;
    Ok(MazeGenerator::new(config)?.generate()?.maze)
}

/// One maze per seed, generated in parallel with the `parallel` feature.
pub fn generate_batch(config: &GeneratorConfig, seeds: &[u64]) -> Result<Vec<GeneratedMaze>, MazeError> {
    let generator = MazeGenerator::new(*config)?;

    #[cfg(feature = "parallel")]
    let out = seeds
        .par_iter()
        .map(|&seed| generator.generate_seeded(seed))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let out = seeds
        .iter()
        .map(|&seed| generator.generate_seeded(seed))
        .collect();

    out
}
