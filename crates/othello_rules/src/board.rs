//! Rectangular grid of cells addressed by `row * width + col`.

use std::str::FromStr;

use crate::error::RulesError;
use crate::side::{Cell, Side};
use serde::{Deserialize, Serialize};

/// The eight compass directions as `(column step, row step)`.
pub(crate) const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// A fixed-size Othello board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BoardFields")]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates an empty board. Dimensions are not validated here; see
    /// [`crate::GameState::initial`].
    pub(crate) fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
        }
    }

    /// Board width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Board height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True for a zero-sized board, which [`crate::GameState::initial`] never builds.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the cell at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns the index for a `(row, col)` pair if it is on the board.
    pub fn index_of(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.height && col < self.width).then(|| row * self.width + col)
    }

    pub(crate) fn set(&mut self, index: usize, cell: Cell) {
        if let Some(slot) = self.cells.get_mut(index) {
            *slot = cell;
        }
    }

    /// Number of cells held by `side`.
    pub fn count(&self, side: Side) -> usize {
        self.cells
            .iter()
            .filter(|cell| **cell == Cell::Occupied(side))
            .count()
    }

    /// Indices walked outward from `start` in one direction, excluding
    /// `start`, stopping at the edge.
    pub(crate) fn ray(&self, start: usize, (dx, dy): (isize, isize)) -> Ray {
        Ray {
            width: self.width as isize,
            height: self.height as isize,
            col: (start % self.width) as isize,
            row: (start / self.width) as isize,
            dx,
            dy,
        }
    }

    /// Formats the board as text: `X` for the first side, `O` for the
    /// second, `.` for empty cells.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.cells.chunks(self.width) {
            for cell in row {
                out.push(match cell {
                    Cell::Empty => '.',
                    Cell::Occupied(Side::First) => 'X',
                    Cell::Occupied(Side::Second) => 'O',
                });
            }
            out.push('\n');
        }
        out
    }
}

/// Parses the format produced by [`Board::render`]: one line per row,
/// `X`, `O` or `.` per cell. Blank lines and surrounding whitespace are
/// ignored. Any rectangle of at least one cell is accepted.
impl FromStr for Board {
    type Err = RulesError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let width = rows.first().map_or(0, |row| row.chars().count());
        if width == 0 {
            return Err(RulesError::BadBoardText("no rows".to_string()));
        }

        let mut cells = Vec::with_capacity(width * rows.len());
        for (r, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(RulesError::BadBoardText(format!(
                    "row {r} is not {width} cells wide"
                )));
            }
            for ch in row.chars() {
                cells.push(match ch {
                    '.' => Cell::Empty,
                    'X' => Cell::Occupied(Side::First),
                    'O' => Cell::Occupied(Side::Second),
                    other => {
                        return Err(RulesError::BadBoardText(format!(
                            "unknown symbol {other:?} in row {r}"
                        )));
                    }
                });
            }
        }

        Ok(Self {
            width,
            height: rows.len(),
            cells,
        })
    }
}

/// Unchecked serialized form of [`Board`].
#[derive(Deserialize)]
struct BoardFields {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl TryFrom<BoardFields> for Board {
    type Error = RulesError;

    fn try_from(fields: BoardFields) -> Result<Self, Self::Error> {
        let BoardFields {
            width,
            height,
            cells,
        } = fields;
        if width == 0 || height == 0 {
            return Err(RulesError::BadBoardText(format!(
                "board is {width}x{height}"
            )));
        }
        if width.checked_mul(height) != Some(cells.len()) {
            return Err(RulesError::BadBoardText(format!(
                "{} cells do not fill a {width}x{height} board",
                cells.len()
            )));
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }
}

/// Iterator over board indices along a compass direction.
#[derive(Debug, Clone)]
pub(crate) struct Ray {
    width: isize,
    height: isize,
    col: isize,
    row: isize,
    dx: isize,
    dy: isize,
}

impl Iterator for Ray {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        self.col += self.dx;
        self.row += self.dy;
        if self.col < 0 || self.col >= self.width || self.row < 0 || self.row >= self.height {
            return None;
        }
        Some((self.row * self.width + self.col) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_stops_at_edge() {
        let board = Board::empty(4, 4);
        // From (row 1, col 1) heading up-left there is exactly one cell.
        let up_left: Vec<_> = board.ray(5, (-1, -1)).collect();
        assert_eq!(up_left, vec![0]);

        let right: Vec<_> = board.ray(5, (1, 0)).collect();
        assert_eq!(right, vec![6, 7]);

        let down: Vec<_> = board.ray(5, (0, 1)).collect();
        assert_eq!(down, vec![9, 13]);
    }

    #[test]
    fn test_ray_does_not_wrap_rows() {
        let board = Board::empty(4, 2);
        let right: Vec<_> = board.ray(3, (1, 0)).collect();
        assert!(right.is_empty());
    }

    #[test]
    fn test_index_of_bounds() {
        let board = Board::empty(6, 4);
        assert_eq!(board.index_of(1, 2), Some(8));
        assert_eq!(board.index_of(4, 0), None);
        assert_eq!(board.index_of(0, 6), None);
    }

    #[test]
    fn test_parse_round_trips_render() {
        let board: Board = "O.\n.X\n".parse().unwrap();
        assert_eq!(board.width(), 2);
        assert_eq!(board.get(3), Some(Cell::Occupied(Side::First)));
        assert_eq!(board.render(), "O.\n.X\n");
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        assert!("XO\nX\n".parse::<Board>().is_err());
        assert!("".parse::<Board>().is_err());
        assert!("X?".parse::<Board>().is_err());
    }

    #[test]
    fn test_deserialize_checks_shape() {
        let board: Board = "XO\n.X\n".parse().unwrap();
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(serde_json::from_str::<Board>(&json).unwrap(), board);

        let zero_width = r#"{"width":0,"height":1,"cells":["Empty"]}"#;
        assert!(serde_json::from_str::<Board>(zero_width).is_err());

        let short = r#"{"width":2,"height":2,"cells":["Empty"]}"#;
        assert!(serde_json::from_str::<Board>(short).is_err());
    }

    #[test]
    fn test_render() {
        let mut board = Board::empty(2, 2);
        board.set(0, Cell::Occupied(Side::Second));
        board.set(1, Cell::Occupied(Side::First));
        assert_eq!(board.render(), "OX\n..\n");
    }
}
