//! Service layer for the relay.
//!
//! This module contains the collaborators at the edges of the pipeline:
//! - Dataset fetching (`DatasetClient`)
//! - Queue publishing (`AmqpPublisher`)

mod dataset;
mod publisher;

pub use dataset::{DatasetClient, DatasetSource, parse_records};
pub use publisher::{AmqpPublisher, MessagePublisher, PERSISTENT_DELIVERY, PublishState};
