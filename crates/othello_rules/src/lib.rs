//! Pure Othello board logic.
//!
//! Everything here is a deterministic function of its inputs: building the
//! opening position, computing captures and legal moves, applying a move
//! under the pass rule, and scoring. No I/O, no shared state.
//!
//! # Example
//!
//! ```
//! use othello_rules::{GameState, Side};
//!
//! let opening = GameState::initial(8, 8)?;
//! let next = opening.apply_move(Side::First, 19)?;
//! assert_eq!(next.current_side(), Side::Second);
//! assert_eq!(next.score().first, 4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

mod board;
mod error;
mod history;
mod side;
mod state;

pub use board::Board;
pub use error::{MoveError, RulesError};
pub use history::History;
pub use side::{Cell, Side};
pub use state::{DEFAULT_HEIGHT, DEFAULT_WIDTH, GameState, Score};
