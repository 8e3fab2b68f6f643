//! Game state and the move transition function.
//!
//! A [`GameState`] is an immutable snapshot: [`GameState::apply_move`]
//! returns a fresh state and leaves the original untouched, which is what
//! lets [`crate::History`] keep every position of a game.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::board::{Board, DIRECTIONS};
use crate::error::{MoveError, RulesError};
use crate::side::{Cell, Side};

/// Default board width.
pub const DEFAULT_WIDTH: usize = 8;

/// Default board height.
pub const DEFAULT_HEIGHT: usize = 8;

/// A snapshot of one Othello game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    board: Board,
    current_side: Side,
    game_over: bool,
}

/// Piece counts for both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    /// Cells held by [`Side::First`].
    pub first: usize,
    /// Cells held by [`Side::Second`].
    pub second: usize,
}

impl Score {
    /// Count for one side.
    pub fn of(&self, side: Side) -> usize {
        match side {
            Side::First => self.first,
            Side::Second => self.second,
        }
    }

    /// Side with more pieces, `None` on a tie.
    pub fn leader(&self) -> Option<Side> {
        match self.first.cmp(&self.second) {
            std::cmp::Ordering::Greater => Some(Side::First),
            std::cmp::Ordering::Less => Some(Side::Second),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl GameState {
    /// Builds the standard opening position.
    ///
    /// The centre quad is seeded diagonally: its top-left and bottom-right
    /// cells go to [`Side::Second`], the other two to [`Side::First`].
    /// [`Side::First`] moves first. Only the degenerate 2×2 board starts
    /// already finished, since it has no empty cell.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::InvalidDimensions`] if either dimension is odd
    /// or smaller than 2.
    #[instrument(level = "debug")]
    pub fn initial(width: usize, height: usize) -> Result<Self, RulesError> {
        if width < 2 || height < 2 || width % 2 != 0 || height % 2 != 0 {
            return Err(RulesError::InvalidDimensions { width, height });
        }

        let mut board = Board::empty(width, height);
        let base = (height / 2 - 1) * width + width / 2 - 1;
        board.set(base, Cell::Occupied(Side::Second));
        board.set(base + 1, Cell::Occupied(Side::First));
        board.set(base + width, Cell::Occupied(Side::First));
        board.set(base + width + 1, Cell::Occupied(Side::Second));

        Ok(Self::from_parts(board, Side::First))
    }

    /// Builds an arbitrary position. `game_over` is derived from the board.
    ///
    /// Useful for analysing positions that are not reachable from the
    /// opening, such as endgame puzzles.
    pub fn from_parts(board: Board, current_side: Side) -> Self {
        let mut state = Self {
            board,
            current_side,
            game_over: false,
        };
        state.game_over =
            state.legal_moves(Side::First).is_empty() && state.legal_moves(Side::Second).is_empty();
        state
    }

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side to move next.
    pub fn current_side(&self) -> Side {
        self.current_side
    }

    /// True once neither side has a legal move.
    pub fn game_over(&self) -> bool {
        self.game_over
    }

    /// Cells that would flip if `side` played at `cell`.
    ///
    /// For each compass direction, walks outward over a run of opponent
    /// pieces; the run counts only if it ends on a piece of `side`.
    /// Out-of-range cells capture nothing.
    pub fn captures_for(&self, side: Side, cell: usize) -> BTreeSet<usize> {
        let mut captures = BTreeSet::new();
        if cell >= self.board.len() {
            return captures;
        }

        let opponent = Cell::Occupied(side.opponent());
        for direction in DIRECTIONS {
            let mut run = Vec::new();
            for index in self.board.ray(cell, direction) {
                match self.board.get(index) {
                    Some(c) if c == opponent => run.push(index),
                    Some(Cell::Occupied(s)) if s == side => {
                        captures.extend(run.drain(..));
                        break;
                    }
                    _ => break,
                }
            }
        }
        captures
    }

    /// Empty cells where `side` would capture at least one piece.
    pub fn legal_moves(&self, side: Side) -> BTreeSet<usize> {
        (0..self.board.len())
            .filter(|&cell| self.board.get(cell) == Some(Cell::Empty))
            .filter(|&cell| !self.captures_for(side, cell).is_empty())
            .collect()
    }

    /// Plays `side` at `cell` and returns the resulting state.
    ///
    /// Turn handling follows the Othello pass rule: the opponent moves next
    /// if it has any legal move; otherwise `side` moves again; if neither
    /// side can move the game is over and `current_side` is frozen.
    ///
    /// This does not check whose turn it is. Callers that enforce turn order
    /// compare `side` against [`GameState::current_side`] first.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] if the cell is off the board, occupied, or
    /// captures nothing.
    #[instrument(level = "trace", skip(self))]
    pub fn apply_move(&self, side: Side, cell: usize) -> Result<Self, MoveError> {
        match self.board.get(cell) {
            None => {
                return Err(MoveError::OutOfBounds {
                    cell,
                    len: self.board.len(),
                });
            }
            Some(Cell::Occupied(_)) => return Err(MoveError::Occupied(cell)),
            Some(Cell::Empty) => {}
        }

        let captures = self.captures_for(side, cell);
        if captures.is_empty() {
            return Err(MoveError::NoCaptures(cell));
        }

        let mut board = self.board.clone();
        board.set(cell, Cell::Occupied(side));
        for &captured in &captures {
            board.set(captured, Cell::Occupied(side));
        }
        trace!(captured = captures.len(), "Applied captures");

        let mut next = Self {
            board,
            current_side: side,
            game_over: false,
        };

        if !next.legal_moves(side.opponent()).is_empty() {
            next.current_side = side.opponent();
        } else if next.legal_moves(side).is_empty() {
            next.game_over = true;
        }

        Ok(next)
    }

    /// Piece counts for both sides.
    pub fn score(&self) -> Score {
        Score {
            first: self.board.count(Side::First),
            second: self.board.count(Side::Second),
        }
    }
}
