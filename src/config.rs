//! Server configuration loaded from TOML.

use std::path::Path;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use othello_rules::{DEFAULT_HEIGHT, DEFAULT_WIDTH, GameState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Runtime settings for the match server.
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    host: String,

    /// Port to bind. Zero picks a free port.
    port: u16,

    /// Board width in cells.
    board_width: usize,

    /// Board height in cells.
    board_height: usize,

    /// Seconds between keep-alive pings on idle sockets.
    keep_alive_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9898,
            board_width: DEFAULT_WIDTH,
            board_height: DEFAULT_HEIGHT,
            keep_alive_secs: 55,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file and validates it.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise falls back to defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Replaces the bind host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Replaces the bind port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Replaces the board size.
    pub fn with_board(mut self, width: usize, height: usize) -> Self {
        self.board_width = width;
        self.board_height = height;
        self
    }

    /// Keep-alive interval as a [`Duration`].
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Checks that the board can be seeded and the keep-alive is non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        GameState::initial(self.board_width, self.board_height)
            .map_err(|e| ConfigError::new(e.to_string()))?;
        if self.keep_alive_secs == 0 {
            return Err(ConfigError::new("keep_alive_secs must be at least 1"));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
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
