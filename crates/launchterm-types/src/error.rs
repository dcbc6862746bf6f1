//! Error types for launchterm.

use std::io;

/// Errors produced by the launchterm crates.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("command error: {0}")]
    Command(String),

    #[error("alias error: {0}")]
    Alias(String),

    #[error("shell error: {0}")]
    Shell(String),

    #[error("app error: {0}")]
    App(String),

    #[error("redirect error: {0}")]
    Redirect(String),

    #[error("worker error: {0}")]
    Worker(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LaunchError>;
