//! Upstream model provider client
//!
//! Routes a served model id to its hosting provider (Gemini's
//! OpenAI-compatible endpoint or the xAI API), performs the chat-completion
//! calls, and parses streamed SSE responses into typed chunks. No retries,
//! no backoff: one request, one answer.

use futures::StreamExt;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::UpstreamError;
use crate::http::get_client;
use crate::models::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, FunctionCall, ModelInfo,
    ModelsResponse, ToolCall, ToolCallDelta,
};

/// Owner of a served model; selects credentials and base URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOwner {
    Google,
    Xai,
}

impl ModelOwner {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelOwner::Google => "google",
            ModelOwner::Xai => "xai",
        }
    }
}

/// A model we are willing to proxy
#[derive(Debug, Clone, Copy)]
pub struct ServedModel {
    pub id: &'static str,
    pub owned_by: ModelOwner,
}

/// The static serving list exposed through `/v1/models`
pub const SERVED_MODELS: &[ServedModel] = &[
    ServedModel {
        id: "gemini-2.5-flash",
        owned_by: ModelOwner::Google,
    },
    ServedModel {
        id: "gemini-2.5-flash-lite",
        owned_by: ModelOwner::Google,
    },
    ServedModel {
        id: "grok-4-fast-reasoning",
        owned_by: ModelOwner::Xai,
    },
];

/// Resolved provider endpoint for one request
#[derive(Debug, Clone)]
pub struct Provider {
    base_url: String,
    api_key: String,
}

impl Provider {
    /// Resolve a model id to its provider using the configured credentials
    pub fn for_model(model: &str, config: &Config) -> Result<Self, UpstreamError> {
        let served = SERVED_MODELS
            .iter()
            .find(|m| m.id == model)
            .ok_or_else(|| UpstreamError::UnknownModel(model.to_string()))?;

        match served.owned_by {
            ModelOwner::Google => Ok(Self {
                base_url: config.gemini_base_url.clone(),
                api_key: config.gemini_api_key.clone(),
            }),
            ModelOwner::Xai => {
                let api_key = config
                    .xai_api_key
                    .clone()
                    .ok_or(UpstreamError::MissingCredentials("XAI_API_KEY"))?;
                let base_url = config
                    .xai_base_url
                    .clone()
                    .ok_or(UpstreamError::MissingCredentials("XAI_BASE_URL"))?;
                Ok(Self { base_url, api_key })
            }
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

async fn send(
    provider: &Provider,
    request: &ChatCompletionRequest,
) -> Result<reqwest::Response, UpstreamError> {
    let response = get_client()
        .post(provider.completions_url())
        .bearer_auth(&provider.api_key)
        .header("Content-Type", "application/json")
        .json(request)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!(status, "upstream API error");
        return Err(UpstreamError::Api { status, body });
    }

    Ok(response)
}

/// One non-streaming chat completion call
pub async fn chat_completion(
    provider: &Provider,
    request: &ChatCompletionRequest,
) -> Result<ChatCompletionResponse, UpstreamError> {
    let start = Instant::now();
    let request = ChatCompletionRequest {
        stream: None,
        ..request.clone()
    };

    let response = send(provider, &request).await?;
    let completion: ChatCompletionResponse = response.json().await?;

    info!(
        model = %request.model,
        duration_ms = %start.elapsed().as_millis(),
        "chat completion finished"
    );
    Ok(completion)
}

/// Everything gathered while consuming one streamed completion
#[derive(Debug, Default)]
pub struct StreamOutcome {
    /// Concatenated content deltas
    pub content: String,
    /// Every chunk, in arrival order, for replaying to a client
    pub chunks: Vec<ChatCompletionChunk>,
    /// Fully accumulated tool calls, if the model requested any
    pub tool_calls: Vec<ToolCall>,
}

/// One streaming chat completion call, fully consumed
///
/// `on_chunk` fires for every parsed chunk as it arrives; callers that need
/// to inspect the outcome before forwarding anything pass a no-op and replay
/// `StreamOutcome::chunks` afterwards.
pub async fn stream_completion(
    provider: &Provider,
    request: &ChatCompletionRequest,
    mut on_chunk: impl FnMut(&ChatCompletionChunk),
) -> Result<StreamOutcome, UpstreamError> {
    let start = Instant::now();
    let request = request.clone().streaming();

    let response = send(provider, &request).await?;
    let mut body = response.bytes_stream();

    let mut parser = SseParser::new();
    let mut accumulator = ToolCallAccumulator::default();
    let mut outcome = StreamOutcome::default();
    let mut done = false;

    while let Some(bytes) = body.next().await {
        let bytes = bytes.map_err(UpstreamError::Transport)?;
        for data in parser.push(&bytes) {
            if data == "[DONE]" {
                done = true;
                break;
            }
            let chunk: ChatCompletionChunk = serde_json::from_str(&data)?;
            for delta in chunk.tool_call_deltas() {
                accumulator.push(delta);
            }
            if let Some(content) = chunk.content() {
                outcome.content.push_str(content);
            }
            on_chunk(&chunk);
            outcome.chunks.push(chunk);
        }
        if done {
            break;
        }
    }

    outcome.tool_calls = accumulator.finish();
    info!(
        model = %request.model,
        chunks = outcome.chunks.len(),
        tool_calls = outcome.tool_calls.len(),
        duration_ms = %start.elapsed().as_millis(),
        "stream consumed"
    );
    Ok(outcome)
}

/// Incremental Server-Sent-Events parser
///
/// Feeds on raw body bytes and yields the `data:` payload of each complete
/// event. Events may be split across reads at any byte boundary; both LF and
/// CRLF event separators are accepted.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a body read and return the data payloads completed by it
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));

        let mut payloads = Vec::new();
        loop {
            let lf = self.buffer.find("\n\n");
            let crlf = self.buffer.find("\r\n\r\n");
            let (end, sep_len) = match (lf, crlf) {
                (Some(l), Some(c)) if c < l => (c, 4),
                (Some(l), _) => (l, 2),
                (None, Some(c)) => (c, 4),
                (None, None) => break,
            };

            let event: String = self.buffer.drain(..end + sep_len).collect();
            for line in event.lines() {
                if let Some(data) = line.trim_end_matches('\r').strip_prefix("data:") {
                    payloads.push(data.trim_start().to_string());
                }
            }
        }
        payloads
    }
}

/// Folds indexed tool-call fragments from stream chunks into complete calls
///
/// A fragment with an id starts a new call; fragments without one extend the
/// latest call's argument string.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: Vec<ToolCall>,
}

impl ToolCallAccumulator {
    pub fn push(&mut self, delta: &ToolCallDelta) {
        if let Some(id) = delta.id.as_deref().filter(|id| !id.is_empty()) {
            self.calls.push(ToolCall {
                id: id.to_string(),
                call_type: "function".to_string(),
                function: FunctionCall {
                    name: delta
                        .function
                        .as_ref()
                        .and_then(|f| f.name.clone())
                        .unwrap_or_default(),
                    arguments: delta
                        .function
                        .as_ref()
                        .and_then(|f| f.arguments.clone())
                        .unwrap_or_default(),
                },
            });
            return;
        }

        let Some(function) = &delta.function else {
            return;
        };
        let Some(last) = self.calls.last_mut() else {
            warn!("tool-call fragment arrived before any call id; dropping");
            return;
        };
        if let Some(name) = &function.name
            && last.function.name.is_empty()
        {
            last.function.name = name.clone();
        }
        if let Some(arguments) = &function.arguments {
            last.function.arguments.push_str(arguments);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn finish(self) -> Vec<ToolCall> {
        self.calls
    }
}

/// Build the `/v1/models` listing for the serving list
pub fn models_response(created: u64) -> ModelsResponse {
    let data = SERVED_MODELS
        .iter()
        .map(|m| ModelInfo {
            id: m.id.to_string(),
            object: "model".to_string(),
            created,
            owned_by: m.owned_by.as_str().to_string(),
        })
        .collect();
    ModelsResponse {
        object: "list".to_string(),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FunctionDelta;

    fn fragment(
        id: Option<&str>,
        name: Option<&str>,
        arguments: Option<&str>,
    ) -> ToolCallDelta {
        ToolCallDelta {
            index: None,
            id: id.map(str::to_string),
            call_type: id.map(|_| "function".to_string()),
            function: Some(FunctionDelta {
                name: name.map(str::to_string),
                arguments: arguments.map(str::to_string),
            }),
        }
    }

    #[test]
    fn test_sse_parser_single_event() {
        let mut parser = SseParser::new();
        let payloads = parser.push(b"data: {\"a\":1}\n\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string()]);
    }

    #[test]
    fn test_sse_parser_event_split_across_reads() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"data: {\"content\":").is_empty());
        let payloads = parser.push(b" \"hi\"}\n\ndata: [DONE]\n\n");
        assert_eq!(
            payloads,
            vec!["{\"content\": \"hi\"}".to_string(), "[DONE]".to_string()]
        );
    }

    #[test]
    fn test_sse_parser_crlf_separators() {
        let mut parser = SseParser::new();
        let payloads = parser.push(b"data: one\r\n\r\ndata: two\r\n\r\n");
        assert_eq!(payloads, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_sse_parser_ignores_non_data_lines() {
        let mut parser = SseParser::new();
        let payloads = parser.push(b": keep-alive\nevent: message\ndata: x\n\n");
        assert_eq!(payloads, vec!["x".to_string()]);
    }

    #[test]
    fn test_accumulator_builds_call_from_fragments() {
        let mut acc = ToolCallAccumulator::default();
        acc.push(&fragment(Some("call_1"), Some("brave_search"), Some("")));
        acc.push(&fragment(None, None, Some("{\"query\":")));
        acc.push(&fragment(None, None, Some("\"nba scores\"}")));

        let calls = acc.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].function.name, "brave_search");
        assert_eq!(calls[0].function.arguments, "{\"query\":\"nba scores\"}");
    }

    #[test]
    fn test_accumulator_separates_multiple_calls() {
        let mut acc = ToolCallAccumulator::default();
        acc.push(&fragment(Some("call_1"), Some("get_nba_teams_list"), Some("{}")));
        acc.push(&fragment(Some("call_2"), Some("brave_search"), None));
        acc.push(&fragment(None, None, Some("{\"query\":\"x\"}")));

        let calls = acc.finish();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].function.name, "get_nba_teams_list");
        assert_eq!(calls[1].function.arguments, "{\"query\":\"x\"}");
    }

    #[test]
    fn test_accumulator_drops_orphan_fragment() {
        let mut acc = ToolCallAccumulator::default();
        acc.push(&fragment(None, None, Some("{\"orphan\":true}")));
        assert!(acc.finish().is_empty());
    }

    #[test]
    fn test_models_response_lists_all_served_models() {
        let listing = models_response(1700000000);
        assert_eq!(listing.object, "list");
        assert_eq!(listing.data.len(), SERVED_MODELS.len());
        assert!(
            listing
                .data
                .iter()
                .any(|m| m.id == "grok-4-fast-reasoning" && m.owned_by == "xai")
        );
    }
}
