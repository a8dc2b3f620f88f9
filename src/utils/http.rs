// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::DatasetConfig;

/// Header Socrata reads the application token from.
pub const APP_TOKEN_HEADER: &str = "x-app-token";

/// Create a configured asynchronous HTTP client for the dataset API.
pub fn create_async_client(config: &DatasetConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(default_headers(config)?)
        .build()?;
    Ok(client)
}

fn default_headers(config: &DatasetConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    if let Some(token) = config.app_token.as_deref().filter(|t| !t.is_empty()) {
        let value = HeaderValue::from_str(token)
            .map_err(|e| AppError::config(format!("dataset.app_token is not a valid header: {e}")))?;
        headers.insert(APP_TOKEN_HEADER, value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_token_header() {
        let config = DatasetConfig {
            app_token: Some("token123".to_string()),
            ..DatasetConfig::default()
        };
        let headers = default_headers(&config).unwrap();
        assert_eq!(headers.get(APP_TOKEN_HEADER).unwrap(), "token123");
    }

    #[test]
    fn test_no_token_without_config() {
        let headers = default_headers(&DatasetConfig::default()).unwrap();
        assert!(headers.get(APP_TOKEN_HEADER).is_none());
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn test_rejects_token_with_newline() {
        let config = DatasetConfig {
            app_token: Some("bad\ntoken".to_string()),
            ..DatasetConfig::default()
        };
        assert!(matches!(default_headers(&config), Err(AppError::Config(_))));
    }
}
