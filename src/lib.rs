//! Othello match server library.
//!
//! Pairs remote connections into two-player Othello games, keeps the
//! authoritative board for each game, relays validated moves, and tells
//! every connected client how many games are waiting for each side.
//!
//! # Architecture
//!
//! - **Rules** (`othello_rules` crate): pure board engine
//! - **Session**: one game, its two seats and its event output
//! - **Coordinator**: session registry, matchmaking, event delivery
//! - **Protocol / Connection**: JSON frames over a WebSocket
//! - **Server**: axum router, `/ws` and `/health`
//!
//! # Example
//!
//! ```no_run
//! use othello_match::{ServerConfig, server};
//!
//! # async fn example() -> Result<(), othello_match::ServerError> {
//! let config = ServerConfig::default().with_port(0);
//! let (addr, _handle) = server::start(&config).await?;
//! println!("listening on ws://{addr}/ws");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod connection;
mod coordinator;
mod protocol;
pub mod server;
mod session;

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - Connection adapter
pub use connection::{handle_frame, serve_socket};

// Crate-level exports - Matchmaking
pub use coordinator::MatchCoordinator;

// Crate-level exports - Wire protocol
pub use protocol::{EndReason, Intent, ServerMessage, WaitingCounts, decode};

// Crate-level exports - Server
pub use server::{AppState, ServerError, router};

// Crate-level exports - Sessions
pub use session::{ConnectionId, GameSession, Lifecycle, SessionEvent, SessionId, SharedSession};

// Crate-level exports - Game types
pub use othello_rules::{Board, Cell, GameState, History, MoveError, RulesError, Score, Side};
