//! Sportradar REST client
//!
//! One thin wrapper for all three Sportradar products we consume (NFL, NBA,
//! odds comparison). No retry or backoff; a failed call is an `Err` and the
//! tool layer turns it into an error-status JSON for the model.

use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::config::Config;
use crate::http::get_client;

/// Sportradar answers are expected within this window
const REQUEST_TIMEOUT_SECS: u64 = 10;

const NFL_BASE_URL: &str = "https://api.sportradar.com/nfl/official/production/v7/en";
const NBA_BASE_URL: &str = "https://api.sportradar.com/nba/production/v8/en";
const ODDS_BASE_URL: &str = "https://api.sportradar.com/oddscomparison-prematch/production/v2/en";

#[derive(Debug, Clone)]
pub struct SportradarClient {
    base_url: String,
    api_key: String,
}

impl SportradarClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Client for the NFL official v7 API
    pub fn nfl(config: &Config) -> Self {
        Self::new(NFL_BASE_URL, &config.sportradar_api_key)
    }

    /// Client for the NBA v8 API
    pub fn nba(config: &Config) -> Self {
        Self::new(NBA_BASE_URL, &config.sportradar_api_key)
    }

    /// Client for the prematch odds-comparison v2 API
    pub fn odds(config: &Config) -> Self {
        Self::new(ODDS_BASE_URL, &config.sportradar_api_key)
    }

    /// GET an endpoint relative to the product base URL
    ///
    /// The API key travels as a query parameter. A 2xx body that embeds a
    /// `{code, message}` error payload is promoted to an `Err` too.
    pub async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_matches('/'));

        let response = get_client()
            .get(&url)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .with_context(|| format!("Sportradar request to '{endpoint}' failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, endpoint, "Sportradar API error");
            anyhow::bail!("Sportradar API error {status}: {body}");
        }

        let data: Value = response
            .json()
            .await
            .with_context(|| format!("Invalid JSON from Sportradar endpoint '{endpoint}'"))?;

        if let (Some(code), Some(message)) = (data.get("code"), data.get("message"))
            && code.as_i64() != Some(200)
        {
            anyhow::bail!("API Error {code}: {message}");
        }

        Ok(data)
    }
}
