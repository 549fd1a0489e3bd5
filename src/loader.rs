//! Maze collections on disk or in memory.
//!
//! Names are file names (`classic-1.txt`); loading reads the text, normalises
//! the marker characters some collections use and parses it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::debug;

use crate::error::MazeError;
use crate::maze::Maze;

const MAZE_EXTENSIONS: [&str; 2] = ["txt", "maze"];

/// Maps the post and marker characters of other maze collections onto the
/// plain format: `.` posts become `o`, and goal/start markers (`G`, `S`,
/// `A`) become blanks.
pub fn normalize_maze_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '.' => 'o',
            'G' | 'S' | 'A' => ' ',
            other => other,
        })
        .collect()
}

/// A named collection of maze texts.
pub trait MazeSource {
    /// Available names, sorted.
    fn names(&self) -> Result<Vec<String>, MazeError>;

    /// Raw text of `name`.
    fn load_text(&self, name: &str) -> Result<String, MazeError>;
}

/// Maze files in one directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn is_maze_file(path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| MAZE_EXTENSIONS.contains(&e))
    }
}

impl MazeSource for DirSource {
    fn names(&self) -> Result<Vec<String>, MazeError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !Self::is_maze_file(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn load_text(&self, name: &str) -> Result<String, MazeError> {
        // Plain file names only.
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." || name == "." {
            return Err(MazeError::UnknownMaze(name.to_string()));
        }
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(MazeError::UnknownMaze(name.to_string()));
        }
        debug!(?path, "reading maze file");
        Ok(fs::read_to_string(path)?)
    }
}

/// Mazes held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    mazes: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.mazes.insert(name.into(), text.into());
    }

    pub fn with(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }
}

impl MazeSource for MemorySource {
    fn names(&self) -> Result<Vec<String>, MazeError> {
        Ok(self.mazes.keys().cloned().collect())
    }

    fn load_text(&self, name: &str) -> Result<String, MazeError> {
        self.mazes
            .get(name)
            .cloned()
            .ok_or_else(|| MazeError::UnknownMaze(name.to_string()))
    }
}

/// Loads, normalises and parses one maze.
pub fn load_maze(source: &impl MazeSource, name: &str) -> Result<Maze, MazeError> {
    let text = source.load_text(name)?;
    Maze::parse(name, &normalize_maze_text(&text))
}

pub fn load_random_maze(source: &impl MazeSource, rng: &mut impl Rng) -> Result<Maze, MazeError> {
    let names = source.names()?;
    let name = names.choose(rng).ok_or(MazeError::NoMazes)?;
    load_maze(source, name)
}

/// `count` independent picks, so the same maze may come up more than once.
pub fn load_random_mazes(
    source: &impl MazeSource,
    count: usize,
    rng: &mut impl Rng,
) -> Result<Vec<Maze>, MazeError> {
    let names = source.names()?;
    if names.is_empty() {
        return Err(MazeError::NoMazes);
    }
    (0..count)
        .map(|_| {
            let name = &names[rng.random_range(0..names.len())];
            load_maze(source, name)
        })
        .collect()
}
