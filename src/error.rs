//! Crate-level error type.

use crate::analyzer::formatter::FormatError;
use crate::cluster::ClusterError;
use thiserror::Error;

/// Errors surfaced by the command handlers.
#[derive(Debug, Error)]
pub enum KubeSweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cluster connection error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("{0}")]
    Format(#[from] FormatError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown filter '{name}'; known filters: {}", .known.join(", "))]
    UnknownFilter { name: String, known: Vec<String> },

    #[error("Filter '{0}' is not active")]
    FilterNotActive(String),

    #[error("Unknown integration '{name}'; available: {}", .available.join(", "))]
    UnknownIntegration {
        name: String,
        available: Vec<String>,
    },

    #[error("{0} problem(s) detected")]
    ProblemsDetected(usize),
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    ParsingFailed(String),

    #[error("Failed to write configuration: {0}")]
    WriteFailed(String),

    #[error("No home directory found for the default config location")]
    NoHomeDirectory,
}

pub type Result<T> = std::result::Result<T, KubeSweepError>;
