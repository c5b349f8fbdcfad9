//! Tool-call orchestration loop
//!
//! The heart of the proxy: stream the model's first answer, and if it asked
//! for tools, execute them and stream a second, final answer. At most two
//! round-trips; the first response's content is buffered so nothing reaches
//! the caller until we know whether tools are involved.

use tracing::{info, warn};

use crate::error::UpstreamError;
use crate::models::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ToolCall,
};
use crate::tools::ToolRegistry;
use crate::upstream::{self, Provider};

/// Execute every requested tool and extend the conversation with the
/// assistant's call message plus one tool-result message per executed call.
/// Unknown function names are skipped.
async fn tool_round(registry: &ToolRegistry, tool_calls: Vec<ToolCall>, messages: &mut Vec<ChatMessage>) {
    messages.push(ChatMessage::assistant_tool_calls(tool_calls.clone()));

    for call in tool_calls {
        let name = call.function.name.clone();
        match registry.execute(&name, &call.function.arguments).await {
            Some(result) => {
                messages.push(ChatMessage::tool(call.id, name, result.to_string()));
            }
            None => {
                warn!(%name, "skipping unknown tool call");
            }
        }
    }
}

/// Run the streaming loop; `on_chunk` receives every chunk destined for the
/// caller. Returns the final answer's concatenated content.
pub async fn run_chat_stream(
    provider: &Provider,
    registry: &ToolRegistry,
    model: &str,
    mut messages: Vec<ChatMessage>,
    mut on_chunk: impl FnMut(&ChatCompletionChunk),
) -> Result<String, UpstreamError> {
    let request = ChatCompletionRequest::new(model, messages.clone())
        .with_tools(registry.openai_schema());

    // Consume the first response without forwarding anything
    let first = upstream::stream_completion(provider, &request, |_| {}).await?;

    if first.tool_calls.is_empty() {
        for chunk in &first.chunks {
            on_chunk(chunk);
        }
        return Ok(first.content);
    }

    info!(count = first.tool_calls.len(), "model requested tool calls");
    tool_round(registry, first.tool_calls, &mut messages).await;

    let request =
        ChatCompletionRequest::new(model, messages).with_tools(registry.openai_schema());
    let second = upstream::stream_completion(provider, &request, &mut on_chunk).await?;
    Ok(second.content)
}

/// Run the same loop without streaming and return the final completion
pub async fn run_chat(
    provider: &Provider,
    registry: &ToolRegistry,
    model: &str,
    mut messages: Vec<ChatMessage>,
) -> Result<ChatCompletionResponse, UpstreamError> {
    let request = ChatCompletionRequest::new(model, messages.clone())
        .with_tools(registry.openai_schema());
    let first = upstream::chat_completion(provider, &request).await?;

    let tool_calls = first
        .message()
        .and_then(|m| m.tool_calls.clone())
        .unwrap_or_default();
    if tool_calls.is_empty() {
        return Ok(first);
    }

    info!(count = tool_calls.len(), "model requested tool calls");
    tool_round(registry, tool_calls, &mut messages).await;

    let request =
        ChatCompletionRequest::new(model, messages).with_tools(registry.openai_schema());
    upstream::chat_completion(provider, &request).await
}
