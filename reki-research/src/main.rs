//! Reki web-research service
//!
//! Scrapes the NBA schedule, top stories, and betting news on demand and
//! persists each report to a flat JSON file. The daily scheduler in the CLI
//! hits the news endpoints once a day; `/schedule` is on demand.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use reki_core::research::{
    self, BETTING_NEWS_FILE, NEWS_FILE, NewsReport, SCHEDULE_FILE, ScheduleReport,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address, matching the scheduler's default base URL
const DEFAULT_ADDR: &str = "0.0.0.0:8007";

#[derive(Clone)]
struct AppState {
    data_dir: PathBuf,
}

/// A scrape that went wrong, mapped onto a status + JSON body
struct ServiceError {
    status: StatusCode,
    message: String,
}

impl ServiceError {
    fn not_found(message: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.to_string(),
        }
    }

    fn internal(message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        error!(status = %self.status, message = %self.message, "research request failed");
        (self.status, Json(json!({ "detail": self.message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ScheduleRequest {
    /// Defaults to today when absent
    #[serde(default)]
    game_date: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    dotenvy::dotenv().ok();

    let addr = std::env::var("REKI_RESEARCH_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let data_dir: PathBuf = std::env::var("REKI_DATA_DIR")
        .unwrap_or_else(|_| ".".to_string())
        .into();

    let state = AppState { data_dir };

    let app = Router::new()
        .route("/schedule", post(schedule))
        .route("/news", post(news))
        .route("/betting-news", post(betting_news))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting Reki research service v{VERSION} on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "reki-research" }))
}

async fn schedule(
    State(state): State<AppState>,
    request: Option<Json<ScheduleRequest>>,
) -> Result<Json<ScheduleReport>, ServiceError> {
    let game_date = request
        .and_then(|Json(r)| r.game_date)
        .unwrap_or_else(|| Utc::now().date_naive());
    info!(%game_date, "received schedule request");

    let games = research::fetch_nba_schedule(game_date)
        .await
        .map_err(|_| ServiceError::internal("Failed to fetch NBA schedule data."))?;

    if games.is_empty() {
        return Err(ServiceError::not_found(
            "No games found or failed to parse schedule for the given date.",
        ));
    }

    let report = ScheduleReport::new(game_date, games);
    research::save_json(&report, &state.data_dir, SCHEDULE_FILE)
        .map_err(|_| ServiceError::internal("Failed to persist schedule report."))?;

    Ok(Json(report))
}

async fn news(State(state): State<AppState>) -> Result<Json<NewsReport>, ServiceError> {
    info!("received news request");

    let articles = research::fetch_nba_news()
        .await
        .map_err(|_| ServiceError::internal("Failed to fetch NBA news data."))?;

    if articles.is_empty() {
        return Err(ServiceError::not_found(
            "No news found or failed to parse news data.",
        ));
    }

    let report = NewsReport::new(articles);
    research::save_json(&report, &state.data_dir, NEWS_FILE)
        .map_err(|_| ServiceError::internal("Failed to persist news report."))?;

    Ok(Json(report))
}

async fn betting_news(State(state): State<AppState>) -> Result<Json<NewsReport>, ServiceError> {
    info!("received betting news request");

    let articles = research::fetch_betting_news()
        .await
        .map_err(|_| ServiceError::internal("Failed to fetch betting news data."))?;

    if articles.is_empty() {
        return Err(ServiceError::not_found(
            "No betting news found or failed to parse data.",
        ));
    }

    let report = NewsReport::new(articles);
    research::save_json(&report, &state.data_dir, BETTING_NEWS_FILE)
        .map_err(|_| ServiceError::internal("Failed to persist betting news report."))?;

    Ok(Json(report))
}
