//! HTTP/WebSocket front door.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::Request;
use axum::response::Response;
use axum::routing::get;
use derive_more::{Display, Error};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tracing::{debug, error, info, instrument};

use crate::config::ServerConfig;
use crate::connection::serve_socket;
use crate::coordinator::MatchCoordinator;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    coordinator: Arc<MatchCoordinator>,
    keep_alive: Duration,
}

impl AppState {
    /// Wraps a coordinator for the router.
    pub fn new(coordinator: Arc<MatchCoordinator>, keep_alive: Duration) -> Self {
        Self {
            coordinator,
            keep_alive,
        }
    }

    /// The coordinator behind every socket.
    pub fn coordinator(&self) -> &Arc<MatchCoordinator> {
        &self.coordinator
    }
}

/// Builds the router: `/ws` for games, `/health` for probes.
#[instrument(skip(state))]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(state)
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state.coordinator, state.keep_alive))
}

async fn health() -> &'static str {
    "ok"
}

/// Binds per `config` and serves on a background task.
///
/// Returns the bound address (useful with port 0) and the server task.
#[instrument(skip(config))]
pub async fn start(config: &ServerConfig) -> Result<(SocketAddr, JoinHandle<()>), ServerError> {
    let (listener, app) = prepare(config).await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Server exited with error");
        }
    });

    info!(%addr, "Server started");
    Ok((addr, handle))
}

/// Binds per `config` and serves until Ctrl+C.
#[instrument(skip(config))]
pub async fn run(config: &ServerConfig) -> Result<(), ServerError> {
    let (listener, app) = prepare(config).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "Match server ready at ws://{addr}/ws");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C");
            }
            info!("Shutting down");
        })
        .await?;
    Ok(())
}

async fn prepare(config: &ServerConfig) -> Result<(TcpListener, Router), ServerError> {
    config
        .validate()
        .map_err(|e| ServerError::new(e.to_string()))?;

    let coordinator = MatchCoordinator::new(*config.board_width(), *config.board_height())
        .map_err(|e| ServerError::new(e.to_string()))?;
    let state = AppState::new(Arc::new(coordinator), config.keep_alive());

    let listener = TcpListener::bind((config.host().as_str(), *config.port())).await?;
    Ok((listener, router(state)))
}

/// Server startup or I/O failure.
#[derive(Debug, Clone, Display, Error)]
#[display("Server error: {} at {}:{}", message, file, line)]
pub struct ServerError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ServerError {
    /// Creates a new server error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<std::io::Error> for ServerError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("I/O error: {}", err))
    }
}
