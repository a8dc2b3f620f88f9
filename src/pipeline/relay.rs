// src/pipeline/relay.rs

//! Enrich-and-publish pipeline.

use chrono::Utc;

use crate::error::Result;
use crate::models::{Config, MessageFormatter, OutboundMessage, ReferencePoint, RunStats};
use crate::pipeline::normalize::{NormalizeOutcome, normalize};
use crate::services::{DatasetSource, MessagePublisher};
use crate::utils::distance_km;

/// Run the relay: fetch, normalize, then publish every record in year order.
///
/// Records are published one at a time with `pipeline.pace_ms` between them.
/// The first publish failure aborts the run.
pub async fn run_relay(
    config: &Config,
    source: &dyn DatasetSource,
    publisher: &dyn MessagePublisher,
) -> Result<RunStats> {
    let start_time = Utc::now();
    let reference = prepare(config)?;

    if let Some(url) = config.broker.monitor_url() {
        log::info!("Monitor queues at {}", url);
    }

    let raw = source.fetch(config.dataset.limit).await?;
    let fetched = raw.len();
    let outcome = normalize(&raw, config.dataset.limit);
    log_outcome(fetched, &outcome);

    let formatter = MessageFormatter::new(&config.pipeline.entity);
    let pace = config.pipeline.pace();
    let total = outcome.records.len();
    let mut published = 0;

    for (index, record) in outcome.records.iter().enumerate() {
        if index > 0 && !pace.is_zero() {
            tokio::time::sleep(pace).await;
        }

        let distance = distance_km(reference, record.location);
        let message = OutboundMessage::new(
            &config.broker.queue,
            formatter.format(record, distance),
        );

        if let Err(e) = publisher.publish(&message).await {
            log::error!(
                "Publishing stopped after {}/{} messages ({} -> {})",
                published,
                total,
                record.name,
                message.queue()
            );
            return Err(e);
        }

        published += 1;
        log::info!(" [x] Sent {}", message.body());
    }

    let stats = RunStats {
        start_time,
        end_time: Utc::now(),
        fetched,
        accepted: total,
        dropped: outcome.dropped(),
        published,
    };

    log::info!(
        "Relay complete: {} published, {} fetched, {} dropped in {:.1}s",
        stats.published,
        stats.fetched,
        stats.dropped,
        (stats.end_time - stats.start_time).num_milliseconds() as f64 / 1000.0
    );

    Ok(stats)
}

/// Fetch, normalize and format without publishing.
pub async fn preview(config: &Config, source: &dyn DatasetSource) -> Result<Vec<OutboundMessage>> {
    let reference = prepare(config)?;

    let raw = source.fetch(config.dataset.limit).await?;
    let outcome = normalize(&raw, config.dataset.limit);
    log_outcome(raw.len(), &outcome);

    let formatter = MessageFormatter::new(&config.pipeline.entity);
    Ok(outcome
        .records
        .iter()
        .map(|record| {
            let distance = distance_km(reference, record.location);
            OutboundMessage::new(&config.broker.queue, formatter.format(record, distance))
        })
        .collect())
}

fn prepare(config: &Config) -> Result<ReferencePoint> {
    config.validate()?;
    let reference = config.reference()?;
    log::info!(
        "Reference point {}, queue '{}' on {}",
        reference,
        config.broker.queue,
        config.broker.address()
    );
    Ok(reference)
}

fn log_outcome(fetched: usize, outcome: &NormalizeOutcome) {
    log::info!(
        "Normalized {} of {} records ({} malformed, {} over limit)",
        outcome.records.len(),
        fetched,
        outcome.malformed,
        outcome.over_limit
    );
}
