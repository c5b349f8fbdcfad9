//! Web search tool backed by the Brave Search API

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use super::{Tool, required_str};
use crate::http::get_client;

const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";

/// The model only needs a few results; the rest is noise in its context
const MAX_RESULTS: usize = 3;

pub struct BraveSearchTool {
    api_key: String,
}

impl BraveSearchTool {
    pub fn new(api_key: String) -> Self {
        Self { api_key }
    }

    async fn search(&self, query: &str) -> Result<Value> {
        info!(query, "performing Brave search");

        let response = get_client()
            .get(BRAVE_SEARCH_URL)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query)])
            .send()
            .await
            .context("Brave Search request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Brave Search API error {status}: {body}");
        }

        let results: Value = response
            .json()
            .await
            .context("Could not decode search results from Brave API")?;

        Ok(simplify_results(&results))
    }
}

/// Reduce a Brave response to the top results with title, url and snippet
pub fn simplify_results(results: &Value) -> Value {
    let simplified: Vec<Value> = results["web"]["results"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .take(MAX_RESULTS)
                .map(|item| {
                    json!({
                        "title": item.get("title").cloned().unwrap_or(Value::Null),
                        "url": item.get("url").cloned().unwrap_or(Value::Null),
                        "snippet": item.get("description").cloned().unwrap_or(Value::Null),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Value::Array(simplified)
}

#[async_trait]
impl Tool for BraveSearchTool {
    fn name(&self) -> &'static str {
        "brave_search"
    }

    fn description(&self) -> &'static str {
        "Use this tool to find real-time information from the internet, including news, facts, \
         and answers to general knowledge questions. Input should be a clear and specific search query."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "A specific and clear search query to find information on the internet. \
                                    For example: 'latest news on AI advancements' or 'who won the 2022 world cup'."
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let query = required_str(&args, "query")?;
        self.search(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplify_results_takes_top_three() {
        let raw = json!({
            "web": {
                "results": [
                    {"title": "a", "url": "u1", "description": "d1", "extra": 1},
                    {"title": "b", "url": "u2", "description": "d2"},
                    {"title": "c", "url": "u3", "description": "d3"},
                    {"title": "d", "url": "u4", "description": "d4"},
                ]
            }
        });
        let simplified = simplify_results(&raw);
        let items = simplified.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["title"], "a");
        assert_eq!(items[0]["snippet"], "d1");
        assert!(items[0].get("extra").is_none());
    }

    #[test]
    fn test_simplify_results_handles_empty_response() {
        let simplified = simplify_results(&json!({}));
        assert_eq!(simplified, json!([]));
    }
}
