//! Pipeline entry points for relay operations.
//!
//! - `run_relay`: Fetch, normalize and publish every record
//! - `preview`: Same as `run_relay` up to formatting, nothing is published
//! - `run_validate`: Check configuration without touching the network

pub mod normalize;
pub mod relay;
pub mod validate;

pub use normalize::{NormalizeOutcome, normalize};
pub use relay::{preview, run_relay};
pub use validate::run_validate;
