//! Shared HTTP client utilities
//!
//! This module provides shared, lazily-initialized HTTP clients for all
//! outbound calls. Using a single client per purpose allows connection
//! pooling and avoids resource duplication.

use reqwest::Client;
use std::sync::OnceLock;
use std::time::Duration;

/// Default HTTP timeout for API requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Scraping requests get a shorter timeout; pages either load or they don't
const SCRAPE_TIMEOUT_SECS: u64 = 20;

/// Browser user agent for scraping public sports pages, which reject
/// obvious bot agents
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

/// Global HTTP client for API calls (60s timeout)
static API_CLIENT: OnceLock<Client> = OnceLock::new();

/// Global HTTP client for page scraping (browser UA, 20s timeout)
static SCRAPE_CLIENT: OnceLock<Client> = OnceLock::new();

/// Get or create the shared HTTP client for API calls
///
/// This client has a 60-second timeout, suitable for chat completions
/// and the sports/search REST APIs.
pub fn get_client() -> &'static Client {
    API_CLIENT.get_or_init(|| {
        Client::builder()
            .user_agent("reki/1.0")
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client - this should never fail")
    })
}

/// Get or create the shared HTTP client for scraping public pages
pub fn get_scrape_client() -> &'static Client {
    SCRAPE_CLIENT.get_or_init(|| {
        Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(SCRAPE_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client - this should never fail")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_client_returns_same_instance() {
        let client1 = get_client();
        let client2 = get_client();
        assert!(std::ptr::eq(client1, client2));
    }

    #[test]
    fn test_get_scrape_client_returns_same_instance() {
        let client1 = get_scrape_client();
        let client2 = get_scrape_client();
        assert!(std::ptr::eq(client1, client2));
    }
}
