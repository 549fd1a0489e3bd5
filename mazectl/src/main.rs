//! Command-line front end for the micromaze engine.
//!
//! Examples:
//!   mazectl generate --seed 42 --size 16
//!   mazectl generate --fork 0.5 --turn 0.9 --json
//!   mazectl list
//!   mazectl show classic-1.txt
//!   mazectl run classic-1.txt --controller wall
//!   mazectl batch --count 32 --seed 7
//!   mazectl paths
//!
//! Maze files are read from the OS data directory (`micromaze/mazes`) unless
//! `maze_dir` is set in `config.json` or `MICROMAZE_MAZE_DIR` is exported.

mod config;
mod error;
mod paths;

use std::process;

use micromaze::agent::{AgentConfig, Controller, Mouse, RandomController, WallFollower};
use micromaze::generate::{generate_batch, GeneratorConfig, MazeGenerator};
use micromaze::loader::{load_maze, load_random_maze, DirSource, MazeSource};
use micromaze::maze::Maze;
use micromaze::observer::MazeSnapshot;
use micromaze::sim::{explore, explore_all, RunStats};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::config::CliConfig;
use crate::error::CliError;
use crate::paths::AppPaths;

fn usage() -> ! {
    eprintln!("mazectl - generate, inspect and run micromouse mazes\n");
    eprintln!("Usage: mazectl <command> [args]\n");
    eprintln!("Commands:");
    eprintln!("  generate [--seed N] [--size N] [--fork F] [--turn T] [--no-repair] [--json]");
    eprintln!("  show <name> [--json]");
    eprintln!("  list");
    eprintln!("  run [<name>] [--seed N] [--controller random|wall] [--steps N] [--json]");
    eprintln!("  batch [--count K] [--seed N]");
    eprintln!("  paths");
    process::exit(2);
}

/// Positional arguments and `--flag [value]` pairs after the command.
#[derive(Debug, Default)]
struct Args {
    positional: Vec<String>,
    seed: Option<u64>,
    size: Option<usize>,
    fork: Option<f64>,
    turn: Option<f64>,
    controller: Option<String>,
    steps: Option<u32>,
    count: Option<usize>,
    no_repair: bool,
    json: bool,
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T, CliError> {
    let value = value.ok_or_else(|| CliError::usage(format!("{flag} needs a value")))?;
    value
        .parse()
        .map_err(|_| CliError::usage(format!("invalid value for {flag}: {value}")))
}

fn parse_args(raw: Vec<String>) -> Result<Args, CliError> {
    let mut args = Args::default();
    let mut it = raw.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--seed" => args.seed = Some(parse_value(&arg, it.next())?),
            "--size" => args.size = Some(parse_value(&arg, it.next())?),
            "--fork" => args.fork = Some(parse_value(&arg, it.next())?),
            "--turn" => args.turn = Some(parse_value(&arg, it.next())?),
            "--controller" => args.controller = Some(parse_value(&arg, it.next())?),
            "--steps" => args.steps = Some(parse_value(&arg, it.next())?),
            "--count" => args.count = Some(parse_value(&arg, it.next())?),
            "--no-repair" => args.no_repair = true,
            "--json" => args.json = true,
            flag if flag.starts_with("--") => {
                return Err(CliError::usage(format!("unknown flag {flag}")));
            }
            _ => args.positional.push(arg),
        }
    }
    Ok(args)
}

fn generator_config(cfg: &CliConfig, args: &Args) -> GeneratorConfig {
    let mut g = cfg.generator;
    if let Some(size) = args.size {
        g.size = size;
    }
    if let Some(fork) = args.fork {
        g.fork_chance = fork;
    }
    if let Some(turn) = args.turn {
        g.turn_bias = turn;
    }
    if args.seed.is_some() {
        g.seed = args.seed;
    }
    if args.no_repair {
        g.repair_connectivity = false;
    }
    g
}

fn agent_config(cfg: &CliConfig, args: &Args) -> AgentConfig {
    let mut a = cfg.agent;
    if let Some(steps) = args.steps {
        a.max_steps = Some(steps);
    }
    a
}

fn print_maze(maze: &Maze, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(&MazeSnapshot::of(maze))?);
    } else {
        println!("{}", maze.name());
        print!("{maze}");
    }
    Ok(())
}

fn cmd_generate(cfg: &CliConfig, args: &Args) -> Result<(), CliError> {
    let generator = MazeGenerator::new(generator_config(cfg, args))?;
    let out = generator.generate()?;
    if let Some(seed) = out.seed {
        info!("Generated maze with seed {}", seed);
    }
    if let Some(report) = &out.connectivity {
        if !report.walls_removed.is_empty() {
            info!(
                "Connectivity repair removed {} walls ({} components before)",
                report.walls_removed.len(),
                report.components_before
            );
        }
    }
    print_maze(&out.maze, args.json)
}

fn cmd_show(source: &DirSource, args: &Args) -> Result<(), CliError> {
    let name = args
        .positional
        .first()
        .ok_or_else(|| CliError::usage("show needs a maze name"))?;
    print_maze(&load_maze(source, name)?, args.json)
}

fn cmd_list(source: &DirSource) -> Result<(), CliError> {
    let names = source.names()?;
    if names.is_empty() {
        warn!("No mazes in {:?}", source.dir());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// The named maze, a random one from the directory, or a freshly generated
/// one when the directory is empty or missing.
fn pick_maze(cfg: &CliConfig, source: &DirSource, args: &Args) -> Result<Maze, CliError> {
    if let Some(name) = args.positional.first() {
        return Ok(load_maze(source, name)?);
    }
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    match load_random_maze(source, &mut rng) {
        Ok(maze) => Ok(maze),
        Err(e) => {
            warn!("No maze loaded from {:?} ({}); generating one", source.dir(), e);
            Ok(MazeGenerator::new(generator_config(cfg, args))?.generate()?.maze)
        }
    }
}

/// The built-in policies selectable with `--controller`.
enum Pilot {
    Wall(WallFollower),
    Random(RandomController),
}

impl Pilot {
    fn from_args(args: &Args) -> Result<Self, CliError> {
        match args.controller.as_deref().unwrap_or("wall") {
            "wall" => Ok(Pilot::Wall(WallFollower::new())),
            "random" => Ok(Pilot::Random(RandomController::new(args.seed.unwrap_or(0)))),
            other => Err(CliError::usage(format!("unknown controller {other}"))),
        }
    }

    fn decide(&mut self, inputs: &[f64]) -> usize {
        match self {
            Pilot::Wall(c) => c.sense_and_act(inputs),
            Pilot::Random(c) => c.sense_and_act(inputs),
        }
    }
}

fn cmd_run(cfg: &CliConfig, source: &DirSource, args: &Args) -> Result<(), CliError> {
    let mut maze = pick_maze(cfg, source, args)?;
    let mut pilot = Pilot::from_args(args)?;
    let mut mouse = Mouse::new(&maze, agent_config(cfg, args))?;

    let mut controller = |inputs: &[f64]| pilot.decide(inputs);
    let report = explore(&mut maze, &mut mouse, &mut controller);
    if args.json {
        let snapshot = MazeSnapshot::of(&maze).with_mouse(&mouse);
        let out = serde_json::json!({ "report": report, "snapshot": snapshot });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print!("{maze}");
    println!("Maze: {}", report.maze);
    println!("Arrived: {}", report.arrived);
    println!(
        "Last position: ({}, {}) -> {} from goal, {} from the entrance",
        report.final_position.row,
        report.final_position.col,
        report.distance_from_goal,
        report.distance_from_gate
    );
    let area = (maze.size() * maze.size()) as f64;
    println!(
        "Steps: {}, Visited cells: {}, Coverage: {:.2}%, Collisions: {}",
        report.steps,
        report.cells_visited,
        100.0 * report.cells_visited as f64 / area,
        report.collisions
    );
    Ok(())
}

/// `count` consecutive seeds starting at `first`.
fn batch_seeds(first: u64, count: usize) -> Result<Vec<u64>, CliError> {
    let end = first
        .checked_add(count as u64)
        .ok_or_else(|| CliError::usage(format!("--seed {first} with --count {count} runs past the last seed")))?;
    Ok((first..end).collect())
}

fn cmd_batch(cfg: &CliConfig, args: &Args) -> Result<(), CliError> {
    let config = generator_config(cfg, args);
    let seeds = batch_seeds(args.seed.unwrap_or(0), args.count.unwrap_or(16))?;

    let mazes: Vec<Maze> = generate_batch(&config, &seeds)?
        .into_iter()
        .map(|g| g.maze)
        .collect();
    let reports = explore_all(&mazes, agent_config(cfg, args), |_| WallFollower::new())?;

    let mut stats = RunStats::new();
    stats.extend(&reports);
    for r in &reports {
        println!(
            "{:<20} arrived={:<5} steps={:<5} collisions={}",
            r.maze, r.arrived, r.steps, r.collisions
        );
    }
    println!(
        "Episodes: {}  Arrivals: {}  Rate: {:.1}%  Mean steps: {:.1}",
        stats.episodes,
        stats.arrivals,
        100.0 * stats.arrival_rate(),
        stats.mean_steps()
    );
    Ok(())
}

fn cmd_paths(cfg: &CliConfig, paths: &AppPaths) {
    println!("Config file: {}", paths.config_file().display());
    println!("Data dir:    {}", paths.data_dir().display());
    println!("Maze dir:    {}", cfg.maze_dir(paths).display());
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut raw: Vec<String> = std::env::args().skip(1).collect();
    if raw.is_empty() {
        usage();
    }
    let cmd = raw.remove(0);
    let args = match parse_args(raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n");
            usage();
        }
    };

    let paths = AppPaths::new()?;
    let mut cfg = CliConfig::load(&paths.config_file())?;
    cfg.apply_env();
    let source = DirSource::new(cfg.maze_dir(&paths));

    let result = match cmd.as_str() {
        "generate" => cmd_generate(&cfg, &args),
        "show" => cmd_show(&source, &args),
        "list" => cmd_list(&source),
        "run" => cmd_run(&cfg, &source, &args),
        "batch" => cmd_batch(&cfg, &args),
        "paths" => {
            cmd_paths(&cfg, &paths);
            Ok(())
        }
        "help" | "--help" | "-h" => usage(),
        other => {
            eprintln!("Unknown command: {other}\n");
            usage();
        }
    };

    match result {
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}\n");
            usage();
        }
        other => Ok(other?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, CliError> {
        parse_args(list.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn batch_seeds_stop_at_the_last_seed() {
        assert_eq!(batch_seeds(5, 3).unwrap(), vec![5, 6, 7]);
        assert!(batch_seeds(7, 0).unwrap().is_empty());
        assert_eq!(batch_seeds(u64::MAX - 2, 2).unwrap(), vec![u64::MAX - 2, u64::MAX - 1]);
        assert!(matches!(batch_seeds(u64::MAX - 2, 3), Err(CliError::Usage(_))));
        assert!(matches!(batch_seeds(u64::MAX, 16), Err(CliError::Usage(_))));
    }

    #[test]
    fn flags_and_positionals_are_separated() {
        let a = args(&["maze.txt", "--seed", "42", "--controller", "random", "--json"]).unwrap();
        assert_eq!(a.positional, vec!["maze.txt"]);
        assert_eq!(a.seed, Some(42));
        assert_eq!(a.controller.as_deref(), Some("random"));
        assert!(a.json);
        assert!(!a.no_repair);
    }

    #[test]
    fn bad_flags_are_usage_errors() {
        assert!(matches!(args(&["--seed"]), Err(CliError::Usage(_))));
        assert!(matches!(args(&["--size", "big"]), Err(CliError::Usage(_))));
        assert!(matches!(args(&["--bogus"]), Err(CliError::Usage(_))));
    }

    #[test]
    fn flags_override_the_config_file() {
        let cfg = CliConfig::default();
        let a = args(&["--size", "8", "--fork", "0.1", "--no-repair", "--steps", "99"]).unwrap();
        let g = generator_config(&cfg, &a);
        assert_eq!(g.size, 8);
        assert_eq!(g.fork_chance, 0.1);
        assert_eq!(g.turn_bias, cfg.generator.turn_bias);
        assert!(!g.repair_connectivity);
        assert_eq!(agent_config(&cfg, &a).max_steps, Some(99));
    }

    #[test]
    fn unknown_controllers_are_rejected() {
        let a = args(&["--controller", "telepathy"]).unwrap();
        assert!(Pilot::from_args(&a).is_err());
        assert!(matches!(
            Pilot::from_args(&args(&[]).unwrap()),
            Ok(Pilot::Wall(_))
        ));
    }
}
