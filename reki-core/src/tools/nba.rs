//! NBA tools backed by the Sportradar NBA API
//!
//! Besides answering the model, the schedule and teams lookups leave a
//! compact snapshot in [`NbaContext`]; the prompt builder splices it into
//! the system prompt so follow-up questions can reference game ids without
//! a second lookup.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

use super::{Tool, required_i64, required_str};
use crate::cache::TtlCache;
use crate::sportradar::SportradarClient;

/// The daily schedule is stable enough to hold for half a day
const SCHEDULE_TTL: Duration = Duration::from_secs(43_200);

/// A game line remembered for the system prompt
#[derive(Debug, Clone)]
pub struct GameSnapshot {
    pub id: String,
    pub home: String,
    pub away: String,
}

/// A team line remembered for follow-up id lookups
#[derive(Debug, Clone)]
pub struct TeamSnapshot {
    pub id: String,
    pub name: String,
    pub alias: String,
}

/// Snapshots of the last schedule and teams lookups, shared with the prompt
/// builder and reset by the `clear_caches` tool
#[derive(Debug, Default)]
pub struct NbaContext {
    schedule: Mutex<Vec<GameSnapshot>>,
    teams: Mutex<Vec<TeamSnapshot>>,
}

impl NbaContext {
    /// Replace the schedule snapshot from a daily-schedule payload
    pub fn record_schedule(&self, response: &Value) {
        let Some(games) = response["games"].as_array() else {
            return;
        };
        let snapshot: Vec<GameSnapshot> = games
            .iter()
            .map(|game| GameSnapshot {
                id: game["id"].as_str().unwrap_or_default().to_string(),
                home: game["home"]["name"].as_str().unwrap_or_default().to_string(),
                away: game["away"]["name"].as_str().unwrap_or_default().to_string(),
            })
            .collect();
        info!(games = snapshot.len(), "recorded NBA schedule snapshot");
        *self.schedule.lock().expect("context mutex poisoned") = snapshot;
    }

    /// Replace the teams snapshot from a teams-list payload
    pub fn record_teams(&self, response: &Value) {
        let Some(teams) = response["teams"].as_array() else {
            return;
        };
        let snapshot: Vec<TeamSnapshot> = teams
            .iter()
            .map(|team| TeamSnapshot {
                id: team["id"].as_str().unwrap_or_default().to_string(),
                name: team["name"].as_str().unwrap_or_default().to_string(),
                alias: team["alias"].as_str().unwrap_or_default().to_string(),
            })
            .collect();
        *self.teams.lock().expect("context mutex poisoned") = snapshot;
    }

    /// Render the schedule snapshot as prompt lines; empty when none exists
    pub fn schedule_lines(&self) -> Vec<String> {
        self.schedule
            .lock()
            .expect("context mutex poisoned")
            .iter()
            .map(|game| {
                format!(
                    "Game ID: {}, Teams: {} vs {}",
                    game.id, game.away, game.home
                )
            })
            .collect()
    }

    pub fn clear(&self) {
        self.schedule.lock().expect("context mutex poisoned").clear();
        self.teams.lock().expect("context mutex poisoned").clear();
    }
}

pub struct NbaApi {
    client: SportradarClient,
    schedule_cache: TtlCache<(i64, i64, i64), Value>,
    context: Arc<NbaContext>,
}

impl NbaApi {
    pub fn new(client: SportradarClient, context: Arc<NbaContext>) -> Self {
        Self {
            client,
            schedule_cache: TtlCache::new(SCHEDULE_TTL),
            context,
        }
    }

    /// Daily schedule for a date; cached, and snapshotted for the prompt
    pub async fn daily_schedule(&self, year: i64, month: i64, day: i64) -> Result<Value> {
        let schedule = match self.schedule_cache.get(&(year, month, day)) {
            Some(schedule) => schedule,
            None => {
                let schedule = self
                    .client
                    .get(&format!("games/{year}/{month}/{day}/schedule.json"), &[])
                    .await?;
                self.schedule_cache.insert((year, month, day), schedule.clone());
                schedule
            }
        };
        self.context.record_schedule(&schedule);
        Ok(schedule)
    }

    pub async fn daily_injuries(&self, year: i64, month: i64, day: i64) -> Result<Value> {
        self.client
            .get(&format!("league/{year}/{month}/{day}/daily_injuries.json"), &[])
            .await
    }

    pub async fn game_summary(&self, game_id: &str) -> Result<Value> {
        self.client
            .get(&format!("games/{game_id}/summary.json"), &[])
            .await
    }

    pub async fn seasonal_stats(
        &self,
        season_year: &str,
        season_type: &str,
        team_id: &str,
    ) -> Result<Value> {
        self.client
            .get(
                &format!("seasons/{season_year}/{season_type}/teams/{team_id}/statistics.json"),
                &[],
            )
            .await
    }

    /// All NBA teams; snapshotted so the model can resolve ids later
    pub async fn teams_list(&self) -> Result<Value> {
        let teams = self.client.get("league/teams.json", &[]).await?;
        self.context.record_teams(&teams);
        Ok(teams)
    }
}

pub struct NbaDailyScheduleTool(pub Arc<NbaApi>);

#[async_trait]
impl Tool for NbaDailyScheduleTool {
    fn name(&self) -> &'static str {
        "get_nba_daily_schedule"
    }

    fn description(&self) -> &'static str {
        "Fetches the NBA daily schedule for a given date."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "year": { "type": "integer", "description": "The year of the schedule to fetch." },
                "month": { "type": "integer", "description": "The month of the schedule to fetch." },
                "day": { "type": "integer", "description": "The day of the schedule to fetch." }
            },
            "required": ["year", "month", "day"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let year = required_i64(&args, "year")?;
        let month = required_i64(&args, "month")?;
        let day = required_i64(&args, "day")?;
        self.0.daily_schedule(year, month, day).await
    }
}

pub struct NbaDailyInjuriesTool(pub Arc<NbaApi>);

#[async_trait]
impl Tool for NbaDailyInjuriesTool {
    fn name(&self) -> &'static str {
        "get_nba_daily_injuries"
    }

    fn description(&self) -> &'static str {
        "Fetches the NBA daily injuries for a given date."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "year": { "type": "integer", "description": "The year of the injuries to fetch." },
                "month": { "type": "integer", "description": "The month of the injuries to fetch." },
                "day": { "type": "integer", "description": "The day of the injuries to fetch." }
            },
            "required": ["year", "month", "day"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let year = required_i64(&args, "year")?;
        let month = required_i64(&args, "month")?;
        let day = required_i64(&args, "day")?;
        self.0.daily_injuries(year, month, day).await
    }
}

pub struct NbaGameSummaryTool(pub Arc<NbaApi>);

#[async_trait]
impl Tool for NbaGameSummaryTool {
    fn name(&self) -> &'static str {
        "get_nba_game_summary"
    }

    fn description(&self) -> &'static str {
        "Fetches a comprehensive game summary for a given NBA game, including live scores, team stats, and player rosters."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "game_id": {
                    "type": "string",
                    "description": "The unique identifier for the NBA game."
                }
            },
            "required": ["game_id"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let game_id = required_str(&args, "game_id")?;
        self.0.game_summary(&game_id).await
    }
}

pub struct NbaSeasonalStatsTool(pub Arc<NbaApi>);

#[async_trait]
impl Tool for NbaSeasonalStatsTool {
    fn name(&self) -> &'static str {
        "get_nba_seasonal_stats"
    }

    fn description(&self) -> &'static str {
        "Fetches complete team and player seasonal statistics for a given NBA team, season, and season type."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "season_year": {
                    "type": "string",
                    "description": "The year of the season (e.g., '2023')."
                },
                "season_type": {
                    "type": "string",
                    "description": "The type of season. Can be 'REG' for regular season, 'PRE' for preseason, or 'PST' for postseason."
                },
                "team_id": {
                    "type": "string",
                    "description": "The unique identifier for the NBA team."
                }
            },
            "required": ["season_year", "season_type", "team_id"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let season_year = required_str(&args, "season_year")?;
        let season_type = required_str(&args, "season_type")?;
        let team_id = required_str(&args, "team_id")?;
        self.0
            .seasonal_stats(&season_year, &season_type, &team_id)
            .await
    }
}

pub struct NbaTeamsListTool(pub Arc<NbaApi>);

#[async_trait]
impl Tool for NbaTeamsListTool {
    fn name(&self) -> &'static str {
        "get_nba_teams_list"
    }

    fn description(&self) -> &'static str {
        "Fetches a list of all NBA teams, including their names, aliases, and unique IDs."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn call(&self, _args: Value) -> Result<Value> {
        self.0.teams_list().await
    }
}
