//! Utility functions and helpers.

pub mod geodesic;
pub mod http;

pub use geodesic::distance_km;
