//! Othello Match - CLI entry point.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use othello_rules::{GameState, History};
use othello_match::{ServerConfig, server};
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    initialize_tracing();

    match cli.command {
        Command::Serve { config, port, host } => run_server(config, port, host).await,
        Command::Replay {
            moves,
            width,
            height,
            undo,
        } => replay(&moves, width, height, undo),
    }
}

/// Run the match server until Ctrl+C.
#[instrument]
async fn run_server(
    config_path: std::path::PathBuf,
    port: Option<u16>,
    host: Option<String>,
) -> Result<()> {
    let mut config = ServerConfig::load_or_default(&config_path)?;
    if let Some(port) = port {
        info!(port, "Overriding port");
        config = config.with_port(port);
    }
    if let Some(host) = host {
        info!(%host, "Overriding host");
        config = config.with_host(host);
    }

    info!(?config, "Starting Othello match server");
    server::run(&config).await?;
    Ok(())
}

/// Plays `moves` from the opening and prints the final position.
#[instrument]
fn replay(moves: &[usize], width: usize, height: usize, undo: usize) -> Result<()> {
    let mut history = History::new(GameState::initial(width, height)?);

    for (ply, &cell) in moves.iter().enumerate() {
        let state = history.current();
        let side = state.current_side();
        let next = state
            .apply_move(side, cell)
            .with_context(|| format!("move {} ({side} at {cell}) is illegal", ply + 1))?;
        history.push(next);
    }

    for _ in 0..undo {
        if !history.undo() {
            break;
        }
    }

    let state = history.current();
    let score = state.score();
    println!("{}", state.board().render());
    println!("position {} of {}", history.cursor(), history.len() - 1);
    println!("black {} - white {}", score.first, score.second);
    if state.game_over() {
        match score.leader() {
            Some(winner) => println!("game over, {winner} wins"),
            None => println!("game over, draw"),
        }
    } else {
        println!("{} to move", state.current_side());
    }
    Ok(())
}

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,othello_match=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
