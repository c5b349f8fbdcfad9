//! Tool registry for model function calling
//!
//! A static mapping from function name to an implementation wrapping a REST
//! API call. The registry renders the OpenAI `tools` schema array and
//! executes model-issued calls; a failing tool becomes an error-status JSON
//! result rather than aborting the whole request.

pub mod nba;
pub mod nfl;
pub mod odds;
pub mod search;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::sportradar::SportradarClient;
use nba::{NbaApi, NbaContext};
use nfl::NflApi;
use odds::OddsApi;

/// One callable function exposed to the model
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON Schema for the function arguments
    fn parameters(&self) -> Value;
    async fn call(&self, args: Value) -> Result<Value>;
}

/// The error-status shape tools put on the wire instead of failing the chat
pub fn error_status(message: impl std::fmt::Display) -> Value {
    json!({ "status": "error", "message": message.to_string() })
}

/// Ordered collection of the tools offered to the model
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Render the OpenAI `tools` array for a chat-completion request
    pub fn openai_schema(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.parameters(),
                    }
                })
            })
            .collect()
    }

    /// Execute a model-issued call by function name
    ///
    /// Returns `None` for an unknown name (the call is skipped). Argument
    /// parse failures and tool errors come back as error-status JSON so the
    /// model can read what went wrong.
    pub async fn execute(&self, name: &str, raw_arguments: &str) -> Option<Value> {
        let tool = match self.get(name) {
            Some(tool) => tool,
            None => {
                warn!(name, "model requested an unknown tool; skipping");
                return None;
            }
        };

        let args = if raw_arguments.trim().is_empty() {
            json!({})
        } else {
            match serde_json::from_str(raw_arguments) {
                Ok(args) => args,
                Err(e) => {
                    warn!(name, error = %e, "tool arguments are not valid JSON");
                    return Some(error_status(format!("Invalid tool arguments: {e}")));
                }
            }
        };

        info!(name, "executing tool");
        match tool.call(args).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(name, error = %e, "tool call failed");
                Some(error_status(e))
            }
        }
    }

    /// Build the full sports-analyst suite: web search, NFL, NBA, odds, and
    /// the cache-clearing helper. The returned [`NbaContext`] is the shared
    /// snapshot the prompt builder reads.
    pub fn sports_suite(config: &Config) -> (Self, Arc<NbaContext>) {
        let context = Arc::new(NbaContext::default());

        let nfl = Arc::new(NflApi::new(SportradarClient::nfl(config)));
        let nba = Arc::new(NbaApi::new(SportradarClient::nba(config), context.clone()));
        let odds = Arc::new(OddsApi::new(SportradarClient::odds(config)));

        let mut registry = Self::new();
        registry.register(Arc::new(search::BraveSearchTool::new(
            config.brave_api_key.clone(),
        )));
        registry.register(Arc::new(nfl::NflScheduleTool(nfl.clone())));
        registry.register(Arc::new(nfl::NflFindGameTool(nfl.clone())));
        registry.register(Arc::new(nfl::NflGameStatisticsTool(nfl.clone())));
        registry.register(Arc::new(nfl::NflGameRosterTool(nfl.clone())));
        registry.register(Arc::new(nfl::NflTeamSeasonStatsTool(nfl)));
        registry.register(Arc::new(nba::NbaDailyScheduleTool(nba.clone())));
        registry.register(Arc::new(nba::NbaDailyInjuriesTool(nba.clone())));
        registry.register(Arc::new(nba::NbaGameSummaryTool(nba.clone())));
        registry.register(Arc::new(nba::NbaSeasonalStatsTool(nba.clone())));
        registry.register(Arc::new(nba::NbaTeamsListTool(nba)));
        registry.register(Arc::new(odds::DailyScheduleOddsTool(odds.clone())));
        registry.register(Arc::new(odds::SportEventMarketsTool(odds)));
        registry.register(Arc::new(ClearCachesTool(context.clone())));

        (registry, context)
    }
}

/// Empties the NBA context snapshots the prompt builder references
pub struct ClearCachesTool(pub Arc<NbaContext>);

#[async_trait]
impl Tool for ClearCachesTool {
    fn name(&self) -> &'static str {
        "clear_caches"
    }

    fn description(&self) -> &'static str {
        "Clears all temporary data caches for NBA games and teams."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn call(&self, _args: Value) -> Result<Value> {
        self.0.clear();
        Ok(json!({ "status": "Caches cleared successfully." }))
    }
}

/// Pull a required string argument out of a JSON object
pub(crate) fn required_str(args: &Value, key: &str) -> Result<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("missing required argument '{key}'"))
}

/// Pull an optional string argument with a default
pub(crate) fn str_or(args: &Value, key: &str, default: &str) -> String {
    args.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Pull a required integer argument out of a JSON object
pub(crate) fn required_i64(args: &Value, key: &str) -> Result<i64> {
    args.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| anyhow::anyhow!("missing required argument '{key}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn description(&self) -> &'static str {
            "Echoes its arguments back."
        }
        fn parameters(&self) -> Value {
            json!({ "type": "object", "properties": {}, "required": [] })
        }
        async fn call(&self, args: Value) -> Result<Value> {
            Ok(args)
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn description(&self) -> &'static str {
            "Always fails."
        }
        fn parameters(&self) -> Value {
            json!({ "type": "object", "properties": {}, "required": [] })
        }
        async fn call(&self, _args: Value) -> Result<Value> {
            anyhow::bail!("backend unavailable")
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(FailingTool));
        registry
    }

    #[test]
    fn test_openai_schema_shape() {
        let schema = registry().openai_schema();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema[0]["type"], "function");
        assert_eq!(schema[0]["function"]["name"], "echo");
        assert!(schema[0]["function"]["parameters"].is_object());
    }

    #[tokio::test]
    async fn test_execute_passes_parsed_arguments() {
        let result = registry().execute("echo", r#"{"query":"x"}"#).await;
        assert_eq!(result, Some(json!({"query": "x"})));
    }

    #[tokio::test]
    async fn test_execute_empty_arguments_become_object() {
        let result = registry().execute("echo", "").await;
        assert_eq!(result, Some(json!({})));
    }

    #[tokio::test]
    async fn test_execute_unknown_tool_is_skipped() {
        assert!(registry().execute("nope", "{}").await.is_none());
    }

    #[tokio::test]
    async fn test_execute_invalid_arguments_report_error_status() {
        let result = registry().execute("echo", "{not json").await.unwrap();
        assert_eq!(result["status"], "error");
    }

    #[tokio::test]
    async fn test_execute_tool_failure_reports_error_status() {
        let result = registry().execute("failing", "{}").await.unwrap();
        assert_eq!(result["status"], "error");
        assert!(
            result["message"]
                .as_str()
                .unwrap()
                .contains("backend unavailable")
        );
    }
}
