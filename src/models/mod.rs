// src/models/mod.rs

//! Domain models for the relay.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod geo;
mod message;
mod record;

// Re-export all public types
pub use config::{BrokerConfig, Config, DatasetConfig, LoggingConfig, MAX_LIMIT, PipelineConfig};
pub use geo::{GeoPoint, ReferencePoint};
pub use message::{MessageFormatter, OutboundMessage, round_km};
pub use record::{MalformedRecord, NormalizedRecord, RawRecord};

/// Counters and timing for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: chrono::DateTime<chrono::Utc>,
    /// Raw records returned by the dataset
    pub fetched: usize,
    /// Records that survived normalization
    pub accepted: usize,
    /// Records excluded as malformed or beyond the limit
    pub dropped: usize,
    /// Messages handed to the broker
    pub published: usize,
}
