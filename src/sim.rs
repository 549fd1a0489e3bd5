//! Episode runner and aggregate statistics.

use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::agent::{Action, AgentConfig, Controller, Mouse};
use crate::error::MazeError;
use crate::maze::{Maze, Pos};

const RECENT_WINDOW: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EpisodeReport {
    pub maze: String,
    pub arrived: bool,
    pub steps: u32,
    pub collisions: u32,
    pub cells_visited: usize,
    pub final_position: Pos,
    pub distance_from_goal: u32,
    /// Distance to the cell in front of the goal entrance; the goal
    /// distance when the maze has no known entrance.
    pub distance_from_gate: u32,
}

/// Runs one episode from the start cell until the mouse arrives or times out.
///
/// Every cell the mouse occupies gets a visit recorded on `maze`, the start
/// cell included.
pub fn explore(maze: &mut Maze, mouse: &mut Mouse, controller: &mut impl Controller) -> EpisodeReport {
    mouse.reset();
    let start = mouse.start();
    maze.add_visit(start.row, start.col);

    while mouse.alive() {
        let inputs = mouse.sense(maze);
        let action = Action::from_index(controller.sense_and_act(&inputs));
        let before = mouse.position();
        let event = mouse.act(action, maze);

        let here = mouse.position();
        if here != before {
            maze.add_visit(here.row, here.col);
        }
        if event.is_terminal() {
            debug!(maze = maze.name(), event = event.as_str(), steps = mouse.steps(), "episode over");
        }
    }

    EpisodeReport {
        maze: maze.name().to_string(),
        arrived: mouse.arrived(),
        steps: mouse.steps(),
        collisions: mouse.collisions(),
        cells_visited: mouse.visited().len(),
        final_position: mouse.position(),
        distance_from_goal: maze.manhattan_distance_from_goal(mouse.position()),
        distance_from_gate: maze.manhattan_distance_from_gate(mouse.position()),
    }
}

/// Runs one episode per maze on a private copy of each, with a fresh
/// controller from `make_controller(index)`. Parallel with the `parallel`
/// feature.
pub fn explore_all<C, F>(
    mazes: &[Maze],
    config: AgentConfig,
    make_controller: F,
) -> Result<Vec<EpisodeReport>, MazeError>
where
    C: Controller,
    F: Fn(usize) -> C + Sync + Send,
{
    config.validate()?;

    let run = |(i, maze): (usize, &Maze)| -> Result<EpisodeReport, MazeError> {
        let mut maze = maze.clone();
        let mut mouse = Mouse::new(&maze, config)?;
        let mut controller = make_controller(i);
        Ok(explore(&mut maze, &mut mouse, &mut controller))
    };

    #[cfg(feature = "parallel")]
    let reports = mazes.par_iter().enumerate().map(run).collect();

    #[cfg(not(feature = "parallel"))]
    let reports = mazes.iter().enumerate().map(run).collect();

    reports
}

/// Running arrival statistics over many episodes.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunStats {
    pub arrivals: u32,
    pub failures: u32,
    pub episodes: u32,
    pub total_steps: u64,
    pub total_collisions: u64,
    pub recent: Vec<bool>,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            arrivals: 0,
            failures: 0,
            episodes: 0,
            total_steps: 0,
            total_collisions: 0,
            recent: Vec::with_capacity(RECENT_WINDOW),
        }
    }

    pub fn record(&mut self, report: &EpisodeReport) {
        if report.arrived {
            self.arrivals += 1;
        } else {
            self.failures += 1;
        }
        self.total_steps += u64::from(report.steps);
        self.total_collisions += u64::from(report.collisions);

        self.recent.push(report.arrived);
        if self.recent.len() > RECENT_WINDOW {
            self.recent.remove(0);
        }
        self.episodes += 1;
    }

    pub fn arrival_rate(&self) -> f32 {
        if self.episodes == 0 {
            0.0
        } else {
            self.arrivals as f32 / self.episodes as f32
        }
    }

    pub fn mean_steps(&self) -> f64 {
        if self.episodes == 0 {
            0.0
        } else {
            self.total_steps as f64 / f64::from(self.episodes)
        }
    }

    pub fn recent_rate(&self) -> f32 {
        if self.recent.is_empty() {
            return 0.0;
        }
        let arrived = self.recent.iter().filter(|&&x| x).count();
        arrived as f32 / self.recent.len() as f32
    }

    pub fn last_100_rate(&self) -> f32 {
        let start = self.recent.len().saturating_sub(100);
        let slice = &self.recent[start..];
        if slice.is_empty() {
            return 0.0;
        }
        let arrived = slice.iter().filter(|&&x| x).count();
        arrived as f32 / slice.len() as f32
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Extend<&'a EpisodeReport> for RunStats {
    fn extend<I: IntoIterator<Item = &'a EpisodeReport>>(&mut self, iter: I) {
        for report in iter {
            self.record(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{RandomController, WallFollower};
    use crate::direction::Direction;
    use crate::generate::{GeneratorConfig, MazeGenerator};
    use crate::goal::add_border_walls;

    fn corridor() -> Maze {
        // 4x4 with borders; the mouse walks north then east into the goal.
        let mut maze = Maze::new(4);
        add_border_walls(&mut maze);
        maze
    }

    #[test]
    fn explore_records_visits_along_the_path() {
        let mut maze = corridor();
        let mut mouse = Mouse::new(&maze, AgentConfig::default()).unwrap();
        let mut script = [0usize, 1].into_iter();
        let mut controller = move |_: &[f64]| script.next().unwrap_or(4);

        let report = explore(&mut maze, &mut mouse, &mut controller);
        assert!(report.arrived);
        assert_eq!(report.steps, 2);
        assert_eq!(report.final_position, Pos::new(2, 1));
        assert_eq!(report.distance_from_goal, 0);
        assert_eq!(report.cells_visited, 3);

        assert_eq!(maze.get_visits(3, 0).unwrap(), 1);
        assert_eq!(maze.get_visits(2, 0).unwrap(), 1);
        assert_eq!(maze.get_visits(2, 1).unwrap(), 1);
        assert_eq!(maze.get_visits(0, 0).unwrap(), 0);
    }

    #[test]
    fn bumps_do_not_add_visits() {
        let mut maze = corridor();
        let mut mouse = Mouse::new(&maze, AgentConfig::default().with_max_steps(5)).unwrap();
        let mut into_wall = |_: &[f64]| Direction::West.index();

        let report = explore(&mut maze, &mut mouse, &mut into_wall);
        assert!(!report.arrived);
        assert_eq!(report.steps, 5);
        assert_eq!(report.collisions, 5);
        // No entrance on this maze, so the gate distance is the goal distance.
        assert_eq!(report.distance_from_goal, 2);
        assert_eq!(report.distance_from_gate, 2);
        assert_eq!(maze.get_visits(3, 0).unwrap(), 1);
    }

    #[test]
    fn explore_resets_the_mouse_between_episodes() {
        let mut maze = corridor();
        let mut mouse = Mouse::new(&maze, AgentConfig::default().with_max_steps(10)).unwrap();
        let mut random = RandomController::new(1);
        let first = explore(&mut maze, &mut mouse, &mut random);
        let second = explore(&mut maze, &mut mouse, &mut random);
        assert!(first.steps <= 10 && second.steps <= 10);
        assert!(maze.get_visits(3, 0).unwrap() >= 2);
    }

    #[test]
    fn explore_all_leaves_the_input_mazes_untouched() {
        let generator = MazeGenerator::new(GeneratorConfig::with_size(8)).unwrap();
        let mazes: Vec<Maze> = (0..4)
            .map(|seed| generator.generate_seeded(seed).map(|g| g.maze))
            .collect::<Result<_, _>>()
            .unwrap();

        let reports = explore_all(&mazes, AgentConfig::default(), |_| WallFollower::new()).unwrap();
        assert_eq!(reports.len(), 4);
        for (maze, report) in mazes.iter().zip(&reports) {
            assert_eq!(report.maze, maze.name());
            assert!(report.steps >= 1 && report.steps <= 64);
            assert!(maze.cells().iter().all(|c| c.visits() == 0));
            let gate = maze.destination().unwrap();
            assert_eq!(report.distance_from_gate, report.final_position.manhattan(gate));
        }

        let seeded = |i: usize| RandomController::new(i as u64);
        let a = explore_all(&mazes, AgentConfig::default(), seeded).unwrap();
        let b = explore_all(&mazes, AgentConfig::default(), seeded).unwrap();
        assert_eq!(a, b);

        assert!(explore_all(&mazes, AgentConfig::default().with_sight(0), seeded).is_err());
    }

    fn report(arrived: bool) -> EpisodeReport {
        EpisodeReport {
            maze: "m".into(),
            arrived,
            steps: 10,
            collisions: 1,
            cells_visited: 5,
            final_position: Pos::new(0, 0),
            distance_from_goal: 0,
            distance_from_gate: 0,
        }
    }

    #[test]
    fn run_stats_track_rates_and_window() {
        let mut stats = RunStats::new();
        assert_eq!(stats.arrival_rate(), 0.0);
        assert_eq!(stats.last_100_rate(), 0.0);

        for i in 0..250 {
            stats.record(&report(i >= 150));
        }
        assert_eq!(stats.episodes, 250);
        assert_eq!(stats.arrivals, 100);
        assert_eq!(stats.recent.len(), 200);
        assert_eq!(stats.total_steps, 2500);
        assert!((stats.arrival_rate() - 0.4).abs() < 1e-6);
        assert!((stats.recent_rate() - 0.5).abs() < 1e-6);
        assert!((stats.last_100_rate() - 1.0).abs() < 1e-6);
        assert!((stats.mean_steps() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn run_stats_extend_from_reports() {
        let reports = vec![report(true), report(false), report(true), report(true)];
        let mut stats = RunStats::default();
        stats.extend(&reports);
        assert_eq!(stats.episodes, 4);
        assert_eq!(stats.failures, 1);
        assert!((stats.arrival_rate() - 0.75).abs() < 1e-6);
    }
}
