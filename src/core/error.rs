use thiserror::Error;

/// Errors surfaced by the maze engine.
#[derive(Debug, Error)]
pub enum MazeError {
    #[error("cell ({row}, {col}) is outside the {size}x{size} grid")]
    OutOfBounds { row: i32, col: i32, size: usize },

    #[error("malformed maze text at line {line}: {reason}")]
    MalformedMazeText { line: usize, reason: String },

    #[error("generation stopped with {unvisited} unreachable cells")]
    GenerationExhausted { unvisited: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("unknown maze: {0}")]
    UnknownMaze(String),

    #[error("maze source has no mazes")]
    NoMazes,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MazeError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        MazeError::MalformedMazeText {
            line,
            reason: reason.into(),
        }
    }
}
