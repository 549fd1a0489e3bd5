//! Text form of a maze.
//!
//! A maze of size N is `2N+1` rows of `4N+1` characters. Even rows hold the
//! north walls of logical row `r = line / 2` (`-` over columns `4c+1..=4c+3`),
//! odd rows hold west walls (`|` at column `4c`) with the cell content in
//! between. Posts at even rows / columns `4c` may be `+` or `o`.
//!
//! ```text
//! +---+---+
//! |   |   |
//! +   +---+
//! |       |
//! +---+---+
//! ```
//!
//! Files from other sources can carry extra markers; run them through
//! [`crate::loader::normalize_maze_text`] before parsing.

use std::fmt;

use crate::direction::Direction;
use crate::error::MazeError;
use crate::maze::Maze;

const POST_CHARS: [char; 5] = ['+', 'o', '-', '|', ' '];

impl Maze {
    /// Parses a maze, inferring its size from the number of rows.
    pub fn parse(name: &str, text: &str) -> Result<Self, MazeError> {
        let lines = significant_lines(text);
        let rows = lines.len();
        if rows < 2 * Maze::MIN_SIZE + 1 || rows % 2 == 0 {
            return Err(MazeError::malformed(
                rows,
                format!("expected an odd number of rows (2N+1), found {rows}"),
            ));
        }
        let size = (rows - 1) / 2;
        if size > Maze::MAX_SIZE {
            return Err(MazeError::malformed(rows, "maze is too large"));
        }
        parse_lines(name, &lines, size)
    }

    /// Parses a maze whose size is known up front; any other row count is
    /// rejected.
    pub fn parse_with_size(name: &str, text: &str, size: usize) -> Result<Self, MazeError> {
        if !(Maze::MIN_SIZE..=Maze::MAX_SIZE).contains(&size) {
            return Err(MazeError::InvalidConfig("maze size out of range"));
        }
        let lines = significant_lines(text);
        if lines.len() != 2 * size + 1 {
            return Err(MazeError::malformed(
                lines.len(),
                format!("expected {} rows, found {}", 2 * size + 1, lines.len()),
            ));
        }
        parse_lines(name, &lines, size)
    }
}

/// Lines with trailing blank lines dropped (`str::lines` already strips `\r\n`).
fn significant_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    lines
}

fn parse_lines(name: &str, lines: &[&str], size: usize) -> Result<Maze, MazeError> {
    let width = 4 * size + 1;
    let mut maze = Maze::new(size).with_name(name);

    for (r, line) in lines.iter().enumerate() {
        let line_no = r + 1;
        let chars: Vec<char> = line.trim_end_matches('\r').chars().collect();
        if chars.len() > width && chars[width..].iter().any(|c| !c.is_whitespace()) {
            return Err(MazeError::malformed(
                line_no,
                format!("row is wider than {width} columns"),
            ));
        }

        let row = (r / 2) as i32;
        for c in 0..width {
            // Short rows are padded with blanks.
            let ch = chars.get(c).copied().unwrap_or(' ');
            let col = (c / 4) as i32;
            let on_post_column = c % 4 == 0;

            match (r % 2 == 0, on_post_column, ch) {
                (true, true, p) if POST_CHARS.contains(&p) => {}
                (true, false, '-') => maze.add_wall(Direction::North, row, col),
                (true, false, ' ') => {}
                (false, true, '|') => maze.add_wall(Direction::West, row, col),
                (false, true, ' ') => {}
                // Cell content (visit counts, markers).
                (false, false, _) => {}
                (_, _, other) => {
                    return Err(MazeError::malformed(
                        line_no,
                        format!("unexpected {other:?} at column {}", c + 1),
                    ));
                }
            }
        }
    }

    maze.find_destination();
    Ok(maze)
}

/// Debug dump with right-aligned visit counts in each cell. Parses back to
/// the same wall layout.
impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.size();
        let cell = |r: usize, c: usize| self.cells()[r * n + c];

        for r in 0..n {
            f.write_str("+")?;
            for c in 0..n {
                let seg = if cell(r, c).has_wall(Direction::North) {
                    "---+"
                } else {
                    "   +"
                };
                f.write_str(seg)?;
            }
            f.write_str("\n")?;

            for c in 0..n {
                let w = if cell(r, c).has_wall(Direction::West) { "|" } else { " " };
                write!(f, "{w}{:>3}", cell(r, c).visits())?;
            }
            let e = if cell(r, n - 1).has_wall(Direction::East) { "|" } else { " " };
            writeln!(f, "{e}")?;
        }

        f.write_str("+")?;
        for c in 0..n {
            let seg = if cell(n - 1, c).has_wall(Direction::South) {
                "---+"
            } else {
                "   +"
            };
            f.write_str(seg)?;
        }
        f.write_str("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::Pos;

    const OPEN_3X3: &str = "\
+---+---+---+
|           |
+   +   +   +
|           |
+   +   +   +
|           |
+---+---+---+
";

    #[test]
    fn open_three_by_three_has_only_border_walls() {
        let maze = Maze::parse("open", OPEN_3X3).unwrap();
        assert_eq!(maze.size(), 3);
        assert_eq!(maze.name(), "open");

        for pos in maze.positions() {
            for d in Direction::ALL {
                let outward = !maze.contains(pos.step(d));
                assert_eq!(
                    maze.has_wall(d, pos.row, pos.col).unwrap(),
                    outward,
                    "{:?} {:?}",
                    pos,
                    d
                );
            }
        }

        assert_eq!(maze.goal_cells(), &[Pos::new(1, 1)]);
        assert_eq!(maze.manhattan_distance_from_goal(Pos::new(0, 0)), 2);
    }

    #[test]
    fn micromouse_posts_and_inner_walls() {
        let text = "\
o---o---o
|   |   |
o   o---o
|       |
o---o---o";
        let maze = Maze::parse("posts", text).unwrap();
        assert_eq!(maze.size(), 2);
        assert!(maze.has_wall(Direction::East, 0, 0).unwrap());
        assert!(maze.has_wall(Direction::West, 0, 1).unwrap());
        assert!(maze.has_wall(Direction::South, 0, 1).unwrap());
        assert!(maze.has_wall(Direction::North, 1, 1).unwrap());
        assert!(!maze.has_wall(Direction::South, 0, 0).unwrap());
        assert!(!maze.has_wall(Direction::East, 1, 0).unwrap());
    }

    #[test]
    fn windows_line_endings_and_trailing_blank_lines() {
        let text = OPEN_3X3.replace('\n', "\r\n") + "\r\n\r\n";
        let maze = Maze::parse("crlf", &text).unwrap();
        assert_eq!(maze.size(), 3);
        assert!(maze.has_wall(Direction::East, 2, 2).unwrap());
    }

    #[test]
    fn rejects_bad_shapes_and_characters() {
        let err = Maze::parse("even", "+---+\n|   |\n").unwrap_err();
        assert!(matches!(err, MazeError::MalformedMazeText { .. }));

        let wide = OPEN_3X3.replacen("+---+---+---+", "+---+---+---+--", 1);
        assert!(Maze::parse("wide", &wide).is_err());

        let bad = OPEN_3X3.replacen("+   +   +   +", "+ x +   +   +", 1);
        match Maze::parse("bad", &bad) {
            Err(MazeError::MalformedMazeText { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected malformed text, got {other:?}"),
        }

        assert!(Maze::parse_with_size("sized", OPEN_3X3, 4).is_err());
        assert!(Maze::parse_with_size("sized", OPEN_3X3, 3).is_ok());
    }

    #[test]
    fn dump_parses_back_to_the_same_walls() {
        let mut maze = Maze::new(4);
        maze.add_walls([
            (Direction::North, 0, 0),
            (Direction::East, 1, 1),
            (Direction::South, 2, 3),
            (Direction::West, 3, 0),
            (Direction::East, 3, 3),
        ]);
        maze.add_visit(1, 1);
        maze.add_visit(1, 1);

        let text = maze.to_string();
        assert!(text.starts_with("+---+   +   +   +\n"));
        assert!(text.contains("  2|"));

        let parsed = Maze::parse("dump", &text).unwrap();
        let walls = |m: &Maze| m.cells().iter().map(|c| c.walls()).collect::<Vec<_>>();
        assert_eq!(walls(&parsed), walls(&maze));
    }
}
