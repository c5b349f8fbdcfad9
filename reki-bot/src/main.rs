//! Reki Telegram front-end
//!
//! A thin shell: every text message is forwarded to the chat proxy without
//! streaming and the answer is relayed back. When the proxy surfaces a
//! tool-call-only response, the user is told which analysis is running.

use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info};

use reki_core::http::get_client;
use reki_core::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

const DEFAULT_API_URL: &str = "http://127.0.0.1:8005/v1/chat/completions";
const DEFAULT_MODEL: &str = "grok-4-fast-reasoning";

const GREETING: &str = "Welcome to Reki, your AI Sports Analyst. How can I assist you?";
const EMPTY_FALLBACK: &str = "Sorry, I couldn't generate a response. Please try again.";
const TRANSPORT_FALLBACK: &str =
    "Sorry, I'm having trouble connecting to my brain. Please try again later.";

#[derive(Clone)]
struct BotConfig {
    api_url: String,
    model: String,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    /// Greet the user
    Start,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    dotenvy::dotenv().ok();

    let token =
        std::env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN not set")?;
    let config = Arc::new(BotConfig {
        api_url: std::env::var("REKI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        model: std::env::var("REKI_BOT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
    });

    info!(api_url = %config.api_url, model = %config.model, "starting Telegram bot");
    let bot = Bot::new(token);

    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::endpoint(handle_chat));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![config])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(bot: Bot, msg: Message, command: Command) -> ResponseResult<()> {
    match command {
        Command::Start => {
            bot.send_message(msg.chat.id, GREETING).await?;
        }
    }
    Ok(())
}

async fn handle_chat(bot: Bot, msg: Message, config: Arc<BotConfig>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let reply = match ask_proxy(&config, text).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(error = %e, "proxy request failed");
            TRANSPORT_FALLBACK.to_string()
        }
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Forward one message to the proxy and render the answer for Telegram
async fn ask_proxy(config: &BotConfig, text: &str) -> Result<String> {
    let request =
        ChatCompletionRequest::new(&config.model, vec![ChatMessage::user(text)]);

    let response = get_client()
        .post(&config.api_url)
        .json(&request)
        .send()
        .await
        .context("request to chat proxy failed")?;

    if !response.status().is_success() {
        anyhow::bail!("chat proxy returned {}", response.status());
    }

    let completion: ChatCompletionResponse = response
        .json()
        .await
        .context("could not parse proxy response")?;

    Ok(render_reply(&completion))
}

/// Pick the user-facing text out of a completion
fn render_reply(completion: &ChatCompletionResponse) -> String {
    let Some(message) = completion.message() else {
        return EMPTY_FALLBACK.to_string();
    };

    if let Some(calls) = message.tool_calls.as_deref()
        && let Some(first) = calls.first()
    {
        info!(tool = %first.function.name, "model requested a tool");
        return format!(
            "Reki is running analysis with the {} tool...",
            first.function.name
        );
    }

    match message.content.as_deref() {
        Some(content) if !content.is_empty() => content.to_string(),
        _ => EMPTY_FALLBACK.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reki_core::models::{Choice, FunctionCall, ToolCall};

    fn completion_with(message: ChatMessage) -> ChatCompletionResponse {
        ChatCompletionResponse {
            id: "chatcmpl-1".to_string(),
            object: "chat.completion".to_string(),
            created: 0,
            model: "grok-4-fast-reasoning".to_string(),
            choices: vec![Choice {
                index: 0,
                message,
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
        }
    }

    #[test]
    fn test_render_reply_plain_content() {
        let completion = completion_with(ChatMessage::assistant("The Bills won."));
        assert_eq!(render_reply(&completion), "The Bills won.");
    }

    #[test]
    fn test_render_reply_reports_tool_call() {
        let call = ToolCall {
            id: "call_1".to_string(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: "get_nba_daily_schedule".to_string(),
                arguments: "{}".to_string(),
            },
        };
        let completion = completion_with(ChatMessage::assistant_tool_calls(vec![call]));
        assert!(render_reply(&completion).contains("get_nba_daily_schedule"));
    }

    #[test]
    fn test_render_reply_empty_message_falls_back() {
        let mut message = ChatMessage::assistant("");
        message.content = None;
        let completion = completion_with(message);
        assert_eq!(render_reply(&completion), EMPTY_FALLBACK);
    }
}
