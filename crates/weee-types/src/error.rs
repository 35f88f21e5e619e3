//! Error types for weee-checker

use thiserror::Error;

/// Configuration-file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

/// Arbitration oracle failures. Both variants are recovered locally by
/// falling back to the rule-based result; they never fail a request.
#[derive(Debug, Error)]
pub enum ArbiterError {
    #[error("Arbiter unavailable: {0}")]
    Unavailable(String),

    #[error("Arbiter returned an unparseable response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed detector output: {0}")]
    MalformedDetectorOutput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
