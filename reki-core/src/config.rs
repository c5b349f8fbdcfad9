//! Application configuration from environment
//!
//! Required keys fail at load time with a named error; everything else has a
//! default. An invalid `TIMEZONE` is also a load-time error, never a
//! per-request one.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::path::PathBuf;

/// Default bind address for the chat proxy
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8005";

/// OpenAI-compatible endpoint of the Gemini API
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub xai_api_key: Option<String>,
    pub xai_base_url: Option<String>,
    pub brave_api_key: String,
    pub sportradar_api_key: String,
    pub timezone: Tz,
    /// System prompt template with `{current_date}` / `{sports_state}` holes
    pub system_prompt_path: PathBuf,
    /// Flat JSON state file spliced into the system prompt
    pub sports_state_path: PathBuf,
    pub server_addr: String,
}

impl Config {
    /// Load configuration from the .env file and environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Not an error if .env is absent

        let gemini_api_key = std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY not set")?;
        let brave_api_key = std::env::var("BRAVE_API_KEY").context("BRAVE_API_KEY not set")?;
        let sportradar_api_key =
            std::env::var("SPORTRADAR_API_KEY").context("SPORTRADAR_API_KEY not set")?;

        let gemini_base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());

        let xai_api_key = std::env::var("XAI_API_KEY").ok();
        let xai_base_url = std::env::var("XAI_BASE_URL").ok();

        let timezone_name = std::env::var("TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let timezone: Tz = timezone_name
            .parse()
            .ok()
            .with_context(|| format!("Invalid timezone specified: {timezone_name}"))?;

        let system_prompt_path = std::env::var("SYSTEM_PROMPT_PATH")
            .unwrap_or_else(|_| "system_prompt.txt".to_string())
            .into();
        let sports_state_path = std::env::var("SPORTS_STATE_PATH")
            .unwrap_or_else(|_| "sports_state.json".to_string())
            .into();

        let server_addr =
            std::env::var("REKI_SERVER_ADDR").unwrap_or_else(|_| DEFAULT_SERVER_ADDR.to_string());

        Ok(Self {
            gemini_api_key,
            gemini_base_url,
            xai_api_key,
            xai_base_url,
            brave_api_key,
            sportradar_api_key,
            timezone,
            system_prompt_path,
            sports_state_path,
            server_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono_tz::Tz;

    #[test]
    fn test_timezone_names_parse() {
        assert!("UTC".parse::<Tz>().is_ok());
        assert!("America/New_York".parse::<Tz>().is_ok());
        assert!("Not/AZone".parse::<Tz>().is_err());
    }
}
