//! Command-line interface for othello_match.

use clap::{Parser, Subcommand};

/// Othello Match - pairs remote players into Othello games
#[derive(Parser, Debug)]
#[command(name = "othello_match")]
#[command(about = "Match server for two-player Othello over WebSockets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the match server
    Serve {
        /// Path to the TOML config file (defaults are used if it is missing)
        #[arg(short, long, default_value = "othello.toml")]
        config: std::path::PathBuf,

        /// Override the port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Replay a sequence of moves offline and print the resulting board
    Replay {
        /// Cell indices, played alternately by whichever side is to move
        moves: Vec<usize>,

        /// Board width
        #[arg(long, default_value_t = othello_rules::DEFAULT_WIDTH)]
        width: usize,

        /// Board height
        #[arg(long, default_value_t = othello_rules::DEFAULT_HEIGHT)]
        height: usize,

        /// Step back this many moves before printing
        #[arg(long, default_value_t = 0)]
        undo: usize,
    },
}
