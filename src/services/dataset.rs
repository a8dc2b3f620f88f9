// src/services/dataset.rs

//! Upstream dataset access.
//!
//! Fetches one page of records from a Socrata (SODA) JSON endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{DatasetConfig, RawRecord};
use crate::utils::http;

/// A read-only provider of raw records.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch at most `limit` raw records in upstream order.
    async fn fetch(&self, limit: usize) -> Result<Vec<RawRecord>>;
}

/// Socrata dataset client.
pub struct DatasetClient {
    client: Client,
    base_url: String,
    dataset_id: String,
}

impl DatasetClient {
    /// Create a new dataset client with the given configuration.
    pub fn new(config: &DatasetConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config)?,
            base_url: config.base_url.clone(),
            dataset_id: config.dataset_id.clone(),
        })
    }

    /// Resource URL for one page of `limit` rows.
    pub fn resource_url(&self, limit: usize) -> Result<Url> {
        resource_url(&self.base_url, &self.dataset_id, limit)
    }
}

#[async_trait]
impl DatasetSource for DatasetClient {
    async fn fetch(&self, limit: usize) -> Result<Vec<RawRecord>> {
        let url = self.resource_url(limit)?;
        log::info!("Fetching up to {} records from {}", limit, url);

        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let records = parse_records(&body)?;
        log::info!("Fetched {} raw records", records.len());
        Ok(records)
    }
}

fn resource_url(base_url: &str, dataset_id: &str, limit: usize) -> Result<Url> {
    let mut url = Url::parse(base_url)?.join(&format!("resource/{dataset_id}.json"))?;
    url.query_pairs_mut()
        .append_pair("$limit", &limit.to_string());
    Ok(url)
}

/// Parse a SODA response body into raw records.
///
/// Array elements that are not objects become empty records so the
/// normalizer accounts for them like any other partial row.
pub fn parse_records(body: &str) -> Result<Vec<RawRecord>> {
    match serde_json::from_str::<Value>(body)? {
        Value::Array(rows) => Ok(rows
            .into_iter()
            .map(|row| match row {
                Value::Object(fields) => RawRecord::new(fields),
                other => {
                    log::debug!("Non-object row in dataset response: {}", other);
                    RawRecord::default()
                }
            })
            .collect()),
        Value::Object(fields) => {
            let message = fields
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("response is an object, expected an array of rows");
            Err(AppError::fetch(message))
        }
        other => Err(AppError::fetch(format!(
            "unexpected response, expected an array of rows: {other}"
        ))),
    }
}
