// src/lib.rs

//! Meteor Relay Library
//!
//! Fetches meteorite landings, measures each one against a reference point,
//! and publishes the results one by one onto a durable AMQP queue.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
