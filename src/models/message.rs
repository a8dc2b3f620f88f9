//! Outbound queue messages.

use crate::models::NormalizedRecord;

/// A formatted message bound for a single queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    queue: String,
    body: String,
}

impl OutboundMessage {
    pub fn new(queue: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            body: body.into(),
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Renders enriched records into the message body downstream consumers parse.
///
/// Output shape:
/// `<entity> <name> has fallen at <raw-location>. This is <distance> km from your location.`
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    entity: String,
}

impl MessageFormatter {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
        }
    }

    /// Format a record with its full-precision distance; rounding happens here.
    ///
    /// The distance is printed as the shortest decimal that round-trips, so
    /// trailing zeros are dropped but at least one fractional digit remains
    /// (`6040.5`, `0.0`, `10007.54`).
    pub fn format(&self, record: &NormalizedRecord, distance_km: f64) -> String {
        format!(
            "{} {} has fallen at {}. This is {:?} km from your location.",
            self.entity,
            record.name,
            record.raw_location,
            round_km(distance_km)
        )
    }
}

/// Round a distance to two decimal places.
pub fn round_km(distance_km: f64) -> f64 {
    (distance_km * 100.0).round() / 100.0
}
