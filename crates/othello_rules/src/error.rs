//! Error types for board construction and move application.

use derive_more::{Display, Error};

/// A board could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum RulesError {
    /// Width and height must both be even and at least 2 so the
    /// four seed pieces sit exactly on the centre.
    #[display("Invalid board dimensions {width}x{height}: both must be even and at least 2")]
    InvalidDimensions {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// Board text was empty, ragged, or used an unknown symbol.
    #[display("Unreadable board text: {_0}")]
    BadBoardText(#[error(not(source))] String),
}

/// A move was rejected by the board engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// The cell index does not exist on this board.
    #[display("Cell {cell} is outside a board of {len} cells")]
    OutOfBounds {
        /// Requested cell.
        cell: usize,
        /// Number of cells on the board.
        len: usize,
    },

    /// The cell already holds a piece.
    #[display("Cell {_0} is already occupied")]
    Occupied(#[error(not(source))] usize),

    /// Playing here would flip nothing.
    #[display("Cell {_0} captures nothing")]
    NoCaptures(#[error(not(source))] usize),
}
