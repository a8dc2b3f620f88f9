// src/pipeline/normalize.rs

//! Raw record normalization.

use crate::models::{NormalizedRecord, RawRecord};

/// Summary of a normalization pass.
#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    /// Accepted records, ascending by year, fetch order within a year
    pub records: Vec<NormalizedRecord>,
    /// Records excluded as malformed
    pub malformed: usize,
    /// Valid records left out because the limit was reached
    pub over_limit: usize,
}

impl NormalizeOutcome {
    pub fn dropped(&self) -> usize {
        self.malformed + self.over_limit
    }
}

/// Normalize raw records, accepting at most `limit` in fetch order, then sort by year.
pub fn normalize(raw: &[RawRecord], limit: usize) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome::default();

    for (index, record) in raw.iter().enumerate() {
        match NormalizedRecord::try_from(record) {
            Ok(normalized) if outcome.records.len() < limit => outcome.records.push(normalized),
            Ok(_) => outcome.over_limit += 1,
            Err(reason) => {
                outcome.malformed += 1;
                log::debug!("Dropping record #{}: {}", index, reason);
            }
        }
    }

    // Vec::sort_by_key is stable
    outcome.records.sort_by_key(|r| r.year);
    outcome
}
