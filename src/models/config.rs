//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{GeoPoint, ReferencePoint};

/// Socrata rejects `$limit` values above this.
pub const MAX_LIMIT: usize = 50_000;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream dataset API settings
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// AMQP broker and queue settings
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Enrichment and pacing settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// The configured reference point, validated.
    pub fn reference(&self) -> Result<ReferencePoint> {
        let reference = self.pipeline.reference.ok_or_else(|| {
            AppError::config("pipeline.reference is not set (use --lat and --lon)")
        })?;
        if !reference.is_valid() {
            return Err(AppError::config(format!(
                "reference point {reference} is out of range"
            )));
        }
        Ok(reference)
    }

    /// Validate configuration values before any network activity.
    pub fn validate(&self) -> Result<()> {
        self.reference()?;

        if self.dataset.limit == 0 || self.dataset.limit > MAX_LIMIT {
            return Err(AppError::config(format!(
                "dataset.limit must be between 1 and {MAX_LIMIT}, got {}",
                self.dataset.limit
            )));
        }
        Url::parse(&self.dataset.base_url).map_err(|e| {
            AppError::config(format!(
                "dataset.base_url '{}' is invalid: {e}",
                self.dataset.base_url
            ))
        })?;
        if self.dataset.dataset_id.trim().is_empty() {
            return Err(AppError::config("dataset.dataset_id is empty"));
        }
        if self.dataset.user_agent.trim().is_empty() {
            return Err(AppError::config("dataset.user_agent is empty"));
        }
        if self.dataset.timeout_secs == 0 {
            return Err(AppError::config("dataset.timeout_secs must be > 0"));
        }
        if self.broker.host.trim().is_empty() {
            return Err(AppError::config("broker.host is empty"));
        }
        if self.broker.port == 0 {
            return Err(AppError::config("broker.port must be > 0"));
        }
        if self.broker.queue.trim().is_empty() {
            return Err(AppError::config("broker.queue is empty"));
        }
        if self.broker.connect_timeout_secs == 0 {
            return Err(AppError::config(
                "broker.connect_timeout_secs must be > 0",
            ));
        }
        Ok(())
    }
}

/// Upstream Socrata dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Base URL of the Socrata domain
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Dataset identifier (four-by-four)
    #[serde(default = "defaults::dataset_id")]
    pub dataset_id: String,

    /// Maximum number of records to fetch and accept
    #[serde(default = "defaults::limit")]
    pub limit: usize,

    /// Optional Socrata application token, sent as `X-App-Token`
    #[serde(default)]
    pub app_token: Option<String>,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::http_timeout")]
    pub timeout_secs: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            dataset_id: defaults::dataset_id(),
            limit: defaults::limit(),
            app_token: None,
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::http_timeout(),
        }
    }
}

/// AMQP broker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "defaults::host")]
    pub host: String,

    #[serde(default = "defaults::port")]
    pub port: u16,

    #[serde(default = "defaults::username")]
    pub username: String,

    #[serde(default = "defaults::password")]
    pub password: String,

    #[serde(default = "defaults::vhost")]
    pub vhost: String,

    /// Durable queue that receives every message
    #[serde(default = "defaults::queue")]
    pub queue: String,

    /// Upper bound on connection establishment, in seconds
    #[serde(default = "defaults::connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Management UI shown to the operator at startup; empty disables the hint
    #[serde(default = "defaults::management_url")]
    pub management_url: String,
}

impl BrokerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// The management UI link, if one is configured.
    pub fn monitor_url(&self) -> Option<&str> {
        let url = self.management_url.trim();
        (!url.is_empty()).then_some(url)
    }

    /// `host:port`, used in diagnostics.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            username: defaults::username(),
            password: defaults::password(),
            vhost: defaults::vhost(),
            queue: defaults::queue(),
            connect_timeout_secs: defaults::connect_timeout(),
            management_url: defaults::management_url(),
        }
    }
}

/// Enrichment and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Operator location; required before a run
    #[serde(default)]
    pub reference: Option<GeoPoint>,

    /// Delay between consecutive publishes in milliseconds
    #[serde(default = "defaults::pace_ms")]
    pub pace_ms: u64,

    /// Leading word of every message
    #[serde(default = "defaults::entity")]
    pub entity: String,
}

impl PipelineConfig {
    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reference: None,
            pace_ms: defaults::pace_ms(),
            entity: defaults::entity(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Dataset defaults
    pub fn base_url() -> String {
        "https://data.nasa.gov".into()
    }
    pub fn dataset_id() -> String {
        "gh4g-9sfh".into()
    }
    pub fn limit() -> usize {
        200
    }
    pub fn user_agent() -> String {
        concat!("meteor-relay/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn http_timeout() -> u64 {
        30
    }

    // Broker defaults
    pub fn host() -> String {
        "localhost".into()
    }
    pub fn port() -> u16 {
        5672
    }
    pub fn username() -> String {
        "guest".into()
    }
    pub fn password() -> String {
        "guest".into()
    }
    pub fn vhost() -> String {
        "/".into()
    }
    pub fn queue() -> String {
        "meteorite".into()
    }
    pub fn connect_timeout() -> u64 {
        10
    }
    pub fn management_url() -> String {
        "http://localhost:15672/#/queues".into()
    }

    // Pipeline defaults
    pub fn pace_ms() -> u64 {
        4000
    }
    pub fn entity() -> String {
        "Meteorite".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.pipeline.reference = Some(GeoPoint::new(40.0, -94.0));
        config
    }

    #[test]
    fn test_validate_valid_config_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_reference() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_out_of_range_reference() {
        let mut config = valid_config();
        config.pipeline.reference = Some(GeoPoint::new(95.0, 0.0));
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        config.pipeline.reference = Some(GeoPoint::new(0.0, 181.0));
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_limit() {
        let mut config = valid_config();
        config.dataset.limit = 0;
        assert!(config.validate().is_err());

        config.dataset.limit = MAX_LIMIT + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_queue() {
        let mut config = valid_config();
        config.broker.queue = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = valid_config();
        config.dataset.base_url = "data.nasa.gov".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_empty_management_url_disables_hint() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[broker]\nmanagement_url = \"\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.broker.monitor_url(), None);
        assert_eq!(
            Config::default().broker.monitor_url(),
            Some("http://localhost:15672/#/queues")
        );
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[broker]
host = "rabbit.internal"

[pipeline]
reference = {{ latitude = 40.35, longitude = -94.88 }}
pace_ms = 250
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.broker.host, "rabbit.internal");
        assert_eq!(config.broker.port, 5672);
        assert_eq!(config.broker.queue, "meteorite");
        assert_eq!(config.pipeline.pace_ms, 250);
        assert_eq!(config.pipeline.entity, "Meteorite");
        assert_eq!(config.dataset.limit, 200);
        assert_eq!(config.pipeline.reference, Some(GeoPoint::new(40.35, -94.88)));
        assert!(config.validate().is_ok());
    }
}
