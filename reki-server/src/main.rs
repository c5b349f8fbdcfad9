//! Reki chat proxy
//!
//! OpenAI-compatible endpoint that injects the sports-analyst system prompt,
//! runs the tool-call orchestration loop against the upstream model, and
//! streams the result as SSE.

mod error;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use error::AppError;
use reki_core::models::ModelsResponse;
use reki_core::tools::nba::NbaContext;
use reki_core::{
    ChatCompletionRequest, ChatMessage, Config, Provider, ToolRegistry, agent, prompt, upstream,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    registry: Arc<ToolRegistry>,
    nba_context: Arc<NbaContext>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let config = Config::from_env()?;
    if config.xai_api_key.is_none() {
        warn!("XAI_API_KEY not set - xAI models will fail to route");
    }

    let (registry, nba_context) = ToolRegistry::sports_suite(&config);
    info!("Registered tools: {}", registry.names().join(", "));

    let addr = config.server_addr.clone();
    let state = AppState {
        config: Arc::new(config),
        registry: Arc::new(registry),
        nba_context,
    };

    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/models", get(list_models))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting Reki proxy v{VERSION} on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "reki-server" }))
}

async fn list_models() -> Json<ModelsResponse> {
    Json(upstream::models_response(Utc::now().timestamp() as u64))
}

async fn chat_completions(
    State(state): State<AppState>,
    Json(request): Json<ChatCompletionRequest>,
) -> Result<Response, AppError> {
    info!(
        model = %request.model,
        messages = request.messages.len(),
        stream = request.wants_stream(),
        "received chat request"
    );

    let provider = Provider::for_model(&request.model, &state.config)?;
    let system_prompt = prompt::build_system_prompt(&state.config, &state.nba_context)?;
    let messages = prompt::conversation(system_prompt, request.messages.clone());

    if request.wants_stream() {
        Ok(stream_response(state, provider, request.model, messages))
    } else {
        let completion =
            agent::run_chat(&provider, &state.registry, &request.model, messages).await?;
        Ok(Json(completion).into_response())
    }
}

/// Drive the orchestration loop in a task and bridge its chunks onto an SSE
/// stream. A mid-stream failure becomes a `data: {"error": ...}` event; the
/// stream always ends with `data: [DONE]`.
fn stream_response(
    state: AppState,
    provider: Provider,
    model: String,
    messages: Vec<ChatMessage>,
) -> Response {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(256);

    tokio::spawn(async move {
        let chunk_tx = tx.clone();
        let result = agent::run_chat_stream(
            &provider,
            &state.registry,
            &model,
            messages,
            move |chunk| {
                if let Ok(event) = Event::default().json_data(chunk) {
                    let _ = chunk_tx.try_send(Ok(event));
                }
            },
        )
        .await;

        if let Err(e) = result {
            error!(error = %e, "error during stream");
            let payload = json!({ "error": e.to_string() });
            let _ = tx.send(Ok(Event::default().data(payload.to_string()))).await;
        }
        let _ = tx.send(Ok(Event::default().data("[DONE]"))).await;
    });

    Sse::new(ReceiverStream::new(rx))
        .keep_alive(KeepAlive::default())
        .into_response()
}
