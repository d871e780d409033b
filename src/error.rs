// Error types for piwatch

use thiserror::Error;

/// Result type alias using anyhow::Error
pub type Result<T> = anyhow::Result<T>;

/// Piwatch-specific error types
#[derive(Error, Debug)]
pub enum PiwatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required credential: {0}")]
    MissingCredential(&'static str),

    #[error("System bus error: {0}")]
    SystemBus(String),

    #[error("Failed to query service '{service}': {message}")]
    ServiceProbe { service: String, message: String },

    #[error("Failed to run '{command}': {message}")]
    Process { command: String, message: String },

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("State file error: {0}")]
    State(String),

    #[error("Unknown task '{0}' (expected all, os_update, pihole_update, gravity or clear_logs)")]
    UnknownTask(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
