// src/error.rs

//! Unified error handling for the relay.

use std::fmt;

use thiserror::Error;

use crate::services::PublishState;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
///
/// Per-record problems are not represented here; see
/// [`MalformedRecord`](crate::models::MalformedRecord).
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration or operator input is unusable
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Upstream dataset returned something we cannot use
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Broker unreachable, refused, timed out or rejected credentials
    #[error("Connection error ({broker}): {message}")]
    Connection { broker: String, message: String },

    /// Queue exists with incompatible properties
    #[error("Queue declaration mismatch for '{queue}': {message}")]
    QueueMismatch { queue: String, message: String },

    /// Failure after the connection was established
    #[error("Publish error in state {stage}: {message}")]
    Publish { stage: PublishState, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a fetch error.
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    /// Create a connection error for the given broker address.
    pub fn connection(broker: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Connection {
            broker: broker.into(),
            message: message.to_string(),
        }
    }

    /// Create a queue declaration mismatch error.
    pub fn queue_mismatch(queue: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::QueueMismatch {
            queue: queue.into(),
            message: message.to_string(),
        }
    }

    /// Create a publish error tagged with the last state reached.
    pub fn publish(stage: PublishState, message: impl fmt::Display) -> Self {
        Self::Publish {
            stage,
            message: message.to_string(),
        }
    }

    /// Process exit code for this error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Toml(_) | Self::Url(_) => 2,
            Self::Connection { .. } | Self::QueueMismatch { .. } | Self::Publish { .. } => 3,
            _ => 1,
        }
    }
}
