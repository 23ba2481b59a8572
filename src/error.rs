//! Error types for deskloop
//!
//! Only failures that must not enter the retry loop are errors. Everything an
//! executor reports about the outside world is carried as data in an
//! `Attempt` and classified by a `Verifier`.

use std::time::Duration;

use thiserror::Error;

/// All error types that can occur in deskloop
#[derive(Debug, Error)]
pub enum DeskloopError {
    /// The task was rejected before entering the loop
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// The request cap for the current window is spent
    #[error("Rate limited: retry in {:.1}s", .0.as_secs_f64())]
    RateLimited(Duration),

    /// No controller is registered for the domain
    #[error("No runner registered for domain: {0}")]
    UnknownDomain(String),

    /// The executor could not be reached at all
    #[error("Executor error: {0}")]
    Executor(String),

    /// A loop state machine was driven out of order
    #[error("Invalid loop state: {0}")]
    InvalidState(String),

    /// Run journal error
    #[error("Journal error: {0}")]
    Journal(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for deskloop operations
pub type Result<T> = std::result::Result<T, DeskloopError>;
