// src/pipeline/validate.rs

use crate::error::Result;
use crate::models::Config;

/// Validate configuration and report the effective settings.
pub fn run_validate(config: &Config) -> Result<()> {
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    let reference = config.reference()?;
    log::info!("✓ Config OK");
    log::info!(
        "    Dataset: {}/resource/{}.json (limit {})",
        config.dataset.base_url.trim_end_matches('/'),
        config.dataset.dataset_id,
        config.dataset.limit
    );
    log::info!(
        "    Broker: {} (vhost '{}', queue '{}', connect timeout {}s)",
        config.broker.address(),
        config.broker.vhost,
        config.broker.queue,
        config.broker.connect_timeout_secs
    );
    log::info!(
        "    Reference point: {}, pacing {} ms",
        reference,
        config.pipeline.pace_ms
    );
    Ok(())
}
