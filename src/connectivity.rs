//! Reachability checks and connectivity repair.
//!
//! Carving produces a spanning tree, but sealing the goal pocket afterwards
//! cuts every tree edge that ran through it, which can split the rest of the
//! maze into pieces. [`ensure_connected`] stitches those pieces back
//! together by knocking down one wall per merge, never touching the pocket
//! perimeter so the single entrance survives.

use std::collections::VecDeque;

use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::maze::{Maze, Pos};

/// Open, in-bounds neighbours of `pos`.
pub fn open_neighbors(maze: &Maze, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
    let cell = maze.contains(pos).then(|| maze.cells()[maze.idx(pos)]);
    Direction::ALL.into_iter().filter_map(move |d| {
        let cell = cell?;
        if cell.has_wall(d) {
            return None;
        }
        maze.neighbor(pos, d)
    })
}

/// BFS step counts from `from`; `None` for unreachable cells.
pub fn distances_from(maze: &Maze, from: Pos) -> Vec<Option<u32>> {
    let mut dist = vec![None; maze.size() * maze.size()];
    if !maze.contains(from) {
        return dist;
    }
    let mut queue = VecDeque::new();
    dist[maze.idx(from)] = Some(0);
    queue.push_back(from);

    while let Some(p) = queue.pop_front() {
        let d = dist[maze.idx(p)].unwrap_or(0);
        for q in open_neighbors(maze, p) {
            let qi = maze.idx(q);
            if dist[qi].is_none() {
                dist[qi] = Some(d + 1);
                queue.push_back(q);
            }
        }
    }
    dist
}

/// Row-major reachability mask from `from`.
pub fn reachable_from(maze: &Maze, from: Pos) -> Vec<bool> {
    distances_from(maze, from)
        .into_iter()
        .map(|d| d.is_some())
        .collect()
}

pub fn is_reachable(maze: &Maze, from: Pos, to: Pos) -> bool {
    if !maze.contains(to) {
        return false;
    }
    distances_from(maze, from)[maze.idx(to)].is_some()
}

/// The reachable cell with the longest shortest path from `from`; ties go to
/// the first cell in row-major order.
pub fn furthest_cell(maze: &Maze, from: Pos) -> Option<(Pos, u32)> {
    let dist = distances_from(maze, from);
    let mut best: Option<(Pos, u32)> = None;
    for pos in maze.positions() {
        if let Some(d) = dist[maze.idx(pos)] {
            if best.map_or(true, |(_, b)| d > b) {
                best = Some((pos, d));
            }
        }
    }
    best
}

/// Connected-component labelling of the open-wall graph.
#[derive(Debug, Clone)]
pub struct Components {
    labels: Vec<usize>,
    sizes: Vec<usize>,
}

impl Components {
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn label_of(&self, maze: &Maze, pos: Pos) -> Option<usize> {
        maze.contains(pos).then(|| self.labels[maze.idx(pos)])
    }

    /// Label of the largest component; ties go to the lowest label.
    pub fn largest(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (label, &size) in self.sizes.iter().enumerate() {
            if best.map_or(true, |b| size > self.sizes[b]) {
                best = Some(label);
            }
        }
        best
    }
}

pub fn label_components(maze: &Maze) -> Components {
    const UNLABELED: usize = usize::MAX;
    let mut labels = vec![UNLABELED; maze.size() * maze.size()];
    let mut sizes = Vec::new();
    let mut queue = VecDeque::new();

    for seed in maze.positions() {
        if labels[maze.idx(seed)] != UNLABELED {
            continue;
        }
        let label = sizes.len();
        let mut size = 0;
        labels[maze.idx(seed)] = label;
        queue.push_back(seed);
        while let Some(p) = queue.pop_front() {
            size += 1;
            for q in open_neighbors(maze, p) {
                let qi = maze.idx(q);
                if labels[qi] == UNLABELED {
                    labels[qi] = label;
                    queue.push_back(q);
                }
            }
        }
        sizes.push(size);
    }

    Components { labels, sizes }
}

/// Outcome of [`ensure_connected`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConnectivityReport {
    pub components_before: usize,
    pub components_after: usize,
    /// Walls knocked down, as `(side, cell)`.
    pub walls_removed: Vec<(Direction, Pos)>,
    pub entrance_reachable: bool,
    pub furthest_from_start: Option<(Pos, u32)>,
}

impl ConnectivityReport {
    pub fn is_connected(&self) -> bool {
        self.components_after == 1
    }
}

/// True for walls on the goal pocket perimeter.
fn is_pocket_wall(maze: &Maze, a: Pos, b: Pos) -> bool {
    maze.has_goal_pocket() && maze.is_in_goal(a) != maze.is_in_goal(b)
}

/// Merges components until the whole grid is one, removing one wall per merge.
///
/// Each round takes the largest component, picks the largest component that
/// borders it, and opens the separating wall whose cell on the large side is
/// closest (Manhattan) to the start cell. Ties break on row, column, then
/// direction order. Goal pocket perimeter walls are never removed.
pub fn ensure_connected(maze: &mut Maze) -> ConnectivityReport {
    let start = maze.start_cell();
    let components_before = label_components(maze).count();
    let mut walls_removed = Vec::new();

    loop {
        let comps = label_components(maze);
        if comps.count() <= 1 {
            break;
        }
        let Some(a) = comps.largest() else { break };

        // (wall side, cell in A, label across the wall)
        let mut candidates: Vec<(Direction, Pos, usize)> = Vec::new();
        for pos in maze.positions() {
            if comps.label_of(maze, pos) != Some(a) {
                continue;
            }
            let cell = maze.cells()[maze.idx(pos)];
            for d in Direction::ALL {
                let Some(other) = comps.label_of(maze, pos.step(d)) else { continue };
                let nb = pos.step(d);
                if other != a && cell.has_wall(d) && !is_pocket_wall(maze, pos, nb) {
                    candidates.push((d, pos, other));
                }
            }
        }

        let Some(b) = candidates
            .iter()
            .map(|&(_, _, label)| label)
            .min_by_key(|&label| (std::cmp::Reverse(comps.sizes[label]), label))
        else {
            warn!(components = comps.count(), "no removable wall joins the remaining components");
            break;
        };

        let Some(&(d, pos, _)) = candidates
            .iter()
            .filter(|&&(_, _, label)| label == b)
            .min_by_key(|&&(d, pos, _)| (pos.manhattan(start), pos.row, pos.col, d.index()))
        else {
            break;
        };

        debug!(?pos, ?d, "knocking down wall to join components");
        maze.remove_wall(d, pos.row, pos.col);
        walls_removed.push((d, pos));
    }

    let components_after = label_components(maze).count();
    if components_before > 1 {
        warn!(
            components_before,
            components_after,
            removed = walls_removed.len(),
            "maze was disconnected; walls knocked down"
        );
    }

    let entrance_reachable = maze
        .destination()
        .is_some_and(|dest| is_reachable(maze, start, dest));

    ConnectivityReport {
        components_before,
        components_after,
        walls_removed,
        entrance_reachable,
        furthest_from_start: furthest_cell(maze, start),
    }
}
