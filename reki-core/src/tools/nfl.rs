//! NFL tools backed by the Sportradar NFL official API
//!
//! The weekly schedule is the anchor: it is cached for a day and reused to
//! resolve games by team names and date. Team identifiers accept full
//! names, mascots, abbreviations, or raw Sportradar UUIDs.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use uuid::Uuid;

use super::{Tool, error_status, required_str, str_or};
use crate::cache::TtlCache;
use crate::sportradar::SportradarClient;

/// The weekly schedule changes once a week; refetch daily at most
const SCHEDULE_TTL: Duration = Duration::from_secs(86_400);

/// Full team name → Sportradar team UUID
const NFL_TEAMS: &[(&str, &str)] = &[
    ("San Francisco 49ers", "f0e724b0-4cbf-495a-be47-013907608da9"),
    ("Chicago Bears", "7b112545-38e6-483c-a55c-96cf6ee49cb8"),
    ("Cincinnati Bengals", "ad4ae08f-d808-42d5-a1e6-e9bc4e34d123"),
    ("Buffalo Bills", "768c92aa-75ff-4a43-bcc0-f2798c2e1724"),
    ("Denver Broncos", "ce92bd47-93d5-4fe9-ada4-0fc681e6caa0"),
    ("Cleveland Browns", "d5a2eb42-8065-4174-ab79-0a6fa820e35e"),
    ("Tampa Bay Buccaneers", "4254d319-1bc7-4f81-b4ab-b5e6f3402b69"),
    ("Arizona Cardinals", "de760528-1dc0-416a-a978-b510d20692ff"),
    ("Los Angeles Chargers", "1f6dcffb-9823-43cd-9ff4-e7a8466749b5"),
    ("Kansas City Chiefs", "6680d28d-d4d2-49f6-aace-5292d3ec02c2"),
    ("Indianapolis Colts", "82cf9565-6eb9-4f01-bdbd-5aa0d472fcd9"),
    ("Washington Commanders", "22052ff7-c065-42ee-bc8f-c4691c50e624"),
    ("Dallas Cowboys", "e627eec7-bbae-4fa4-8e73-8e1d6bc5c060"),
    ("Miami Dolphins", "4809ecb0-abd3-451d-9c4a-92a90b83ca06"),
    ("Philadelphia Eagles", "386bdbf9-9eea-4869-bb9a-274b0bc66e80"),
    ("Atlanta Falcons", "e6aa13a4-0055-48a9-bc41-be28dc106929"),
    ("New York Giants", "04aa1c9d-66da-489d-b16a-1dee3f2eec4d"),
    ("Jacksonville Jaguars", "f7ddd7fa-0bae-4f90-bc8e-669e4d6cf2de"),
    ("New York Jets", "5fee86ae-74ab-4bdd-8416-42a9dd9964f3"),
    ("Detroit Lions", "c5a59daa-53a7-4de0-851f-fb12be893e9e"),
    ("Green Bay Packers", "a20471b4-a8d9-40c7-95ad-90cc30e46932"),
    ("Carolina Panthers", "f14bf5cc-9a82-4a38-bc15-d39f75ed5314"),
    ("New England Patriots", "97354895-8c77-4fd4-a860-32e62ea7382a"),
    ("Las Vegas Raiders", "7d4fcc64-9cb5-4d1b-8e75-8a906d1e1576"),
    ("Los Angeles Rams", "2eff2a03-54d4-46ba-890e-2bc3925548f3"),
    ("Baltimore Ravens", "ebd87119-b331-4469-9ea6-d51fe3ce2f1c"),
    ("New Orleans Saints", "0d855753-ea21-4953-89f9-0e20aff9eb73"),
    ("Seattle Seahawks", "3d08af9e-c767-4f88-a7dc-b920c6d2b4a8"),
    ("Pittsburgh Steelers", "cb2f9f1f-ac67-424e-9e72-1475cb0ed398"),
    ("Team TBD", "23ed0bf0-f058-11ee-9989-93cc4251593a"),
    ("Houston Texans", "82d2d380-3834-4938-835f-aec541e5ece7"),
    ("Tennessee Titans", "d26a1ca5-722d-4274-8f97-c92e49c96315"),
    ("Minnesota Vikings", "33405046-04ee-4058-a950-d606f8c30852"),
];

/// Abbreviation → full team name
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("ARI", "Arizona Cardinals"),
    ("ATL", "Atlanta Falcons"),
    ("BAL", "Baltimore Ravens"),
    ("BUF", "Buffalo Bills"),
    ("CAR", "Carolina Panthers"),
    ("CHI", "Chicago Bears"),
    ("CIN", "Cincinnati Bengals"),
    ("CLE", "Cleveland Browns"),
    ("DAL", "Dallas Cowboys"),
    ("DEN", "Denver Broncos"),
    ("DET", "Detroit Lions"),
    ("GB", "Green Bay Packers"),
    ("HOU", "Houston Texans"),
    ("IND", "Indianapolis Colts"),
    ("JAX", "Jacksonville Jaguars"),
    ("KC", "Kansas City Chiefs"),
    ("LV", "Las Vegas Raiders"),
    ("LAC", "Los Angeles Chargers"),
    ("LAR", "Los Angeles Rams"),
    ("MIA", "Miami Dolphins"),
    ("MIN", "Minnesota Vikings"),
    ("NE", "New England Patriots"),
    ("NO", "New Orleans Saints"),
    ("NYG", "New York Giants"),
    ("NYJ", "New York Jets"),
    ("PHI", "Philadelphia Eagles"),
    ("PIT", "Pittsburgh Steelers"),
    ("SF", "San Francisco 49ers"),
    ("SEA", "Seattle Seahawks"),
    ("TB", "Tampa Bay Buccaneers"),
    ("TEN", "Tennessee Titans"),
    ("WAS", "Washington Commanders"),
];

/// Lowercased full name / mascot / abbreviation → team UUID
static TEAM_LOOKUP: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    let mut lookup = HashMap::new();
    for (full_name, team_id) in NFL_TEAMS {
        lookup.insert(full_name.to_lowercase(), *team_id);
        if let Some(mascot) = full_name.split_whitespace().last() {
            lookup.insert(mascot.to_lowercase(), *team_id);
        }
    }
    let by_name: HashMap<&str, &str> = NFL_TEAMS.iter().copied().collect();
    for (abbr, full_name) in ABBREVIATIONS {
        if let Some(team_id) = by_name.get(full_name) {
            lookup.insert(abbr.to_lowercase(), *team_id);
        }
    }
    lookup
});

/// Resolve a team identifier (name, mascot, abbreviation, or UUID)
pub fn resolve_team_id(identifier: &str) -> Option<String> {
    if let Some(team_id) = TEAM_LOOKUP.get(&identifier.to_lowercase()) {
        return Some((*team_id).to_string());
    }
    // Bare Sportradar UUIDs pass through untouched
    Uuid::parse_str(identifier)
        .ok()
        .map(|_| identifier.to_string())
}

/// Search a weekly schedule payload for a game between two teams on a date
///
/// Team names match by lowercased substring, in either home/away order.
pub fn find_game_in_schedule(schedule: &Value, team1: &str, team2: &str, date: NaiveDate) -> Value {
    let team1_lower = team1.to_lowercase();
    let team2_lower = team2.to_lowercase();

    let games = schedule["week"]["games"].as_array().cloned().unwrap_or_default();
    for game in games {
        let Some(scheduled) = game["scheduled"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        else {
            continue;
        };
        if scheduled.date_naive() != date {
            continue;
        }

        let home = game["home"]["name"].as_str().unwrap_or_default().to_lowercase();
        let away = game["away"]["name"].as_str().unwrap_or_default().to_lowercase();

        if (home.contains(&team1_lower) && away.contains(&team2_lower))
            || (home.contains(&team2_lower) && away.contains(&team1_lower))
        {
            return json!({ "status": "ok", "game": game });
        }
    }

    json!({
        "status": "not_found",
        "message": format!("No game found between {team1} and {team2} on {date}.")
    })
}

pub struct NflApi {
    client: SportradarClient,
    schedule_cache: TtlCache<(), Value>,
}

impl NflApi {
    pub fn new(client: SportradarClient) -> Self {
        Self {
            client,
            schedule_cache: TtlCache::new(SCHEDULE_TTL),
        }
    }

    /// The current week's schedule, cached for a day
    pub async fn current_week_schedule(&self) -> Result<Value> {
        if let Some(schedule) = self.schedule_cache.get(&()) {
            return Ok(schedule);
        }
        let schedule = self
            .client
            .get("games/current_week/schedule.json", &[])
            .await?;
        self.schedule_cache.insert((), schedule.clone());
        Ok(schedule)
    }

    pub async fn find_game(&self, team1: &str, team2: &str, date: &str) -> Result<Value> {
        let Ok(date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
            return Ok(error_status("Invalid date format. Please use YYYY-MM-DD."));
        };
        let schedule = self.current_week_schedule().await?;
        Ok(find_game_in_schedule(&schedule, team1, team2, date))
    }

    pub async fn game_statistics(&self, game_id: &str) -> Result<Value> {
        self.client
            .get(&format!("games/{game_id}/statistics.json"), &[])
            .await
    }

    pub async fn game_roster(&self, game_id: &str) -> Result<Value> {
        self.client
            .get(&format!("games/{game_id}/roster.json"), &[])
            .await
    }

    pub async fn team_season_stats(
        &self,
        team_identifier: &str,
        season_year: &str,
        season_type: &str,
    ) -> Result<Value> {
        let Some(team_id) = resolve_team_id(team_identifier) else {
            return Ok(error_status(format!(
                "Could not find a valid team ID for '{team_identifier}'"
            )));
        };
        self.client
            .get(
                &format!("seasons/{season_year}/{season_type}/teams/{team_id}/statistics.json"),
                &[],
            )
            .await
    }
}

pub struct NflScheduleTool(pub Arc<NflApi>);

#[async_trait]
impl Tool for NflScheduleTool {
    fn name(&self) -> &'static str {
        "get_nfl_current_week_schedule"
    }

    fn description(&self) -> &'static str {
        "Fetches the NFL schedule for the current week, including game IDs, teams, venue, and broadcast info."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn call(&self, _args: Value) -> Result<Value> {
        self.0.current_week_schedule().await
    }
}

pub struct NflFindGameTool(pub Arc<NflApi>);

#[async_trait]
impl Tool for NflFindGameTool {
    fn name(&self) -> &'static str {
        "find_nfl_game_by_teams_and_date"
    }

    fn description(&self) -> &'static str {
        "Finds a specific NFL game by the names of the two teams and the date of the game."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "team1": {
                    "type": "string",
                    "description": "The name of the first NFL team (e.g., 'Seattle Seahawks')."
                },
                "team2": {
                    "type": "string",
                    "description": "The name of the second NFL team (e.g., 'Houston Texans')."
                },
                "date": {
                    "type": "string",
                    "description": "The date of the game in YYYY-MM-DD format."
                }
            },
            "required": ["team1", "team2", "date"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let team1 = required_str(&args, "team1")?;
        let team2 = required_str(&args, "team2")?;
        let date = required_str(&args, "date")?;
        self.0.find_game(&team1, &team2, &date).await
    }
}

pub struct NflGameStatisticsTool(pub Arc<NflApi>);

#[async_trait]
impl Tool for NflGameStatisticsTool {
    fn name(&self) -> &'static str {
        "get_nfl_game_statistics"
    }

    fn description(&self) -> &'static str {
        "Fetches detailed statistics for a specific NFL game using its unique game ID."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "game_id": {
                    "type": "string",
                    "description": "The unique identifier for the NFL game."
                }
            },
            "required": ["game_id"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let game_id = required_str(&args, "game_id")?;
        self.0.game_statistics(&game_id).await
    }
}

pub struct NflGameRosterTool(pub Arc<NflApi>);

#[async_trait]
impl Tool for NflGameRosterTool {
    fn name(&self) -> &'static str {
        "get_nfl_game_roster"
    }

    fn description(&self) -> &'static str {
        "Fetches the complete game roster for both teams in a specific NFL game."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "game_id": {
                    "type": "string",
                    "description": "The unique identifier for the NFL game."
                }
            },
            "required": ["game_id"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let game_id = required_str(&args, "game_id")?;
        self.0.game_roster(&game_id).await
    }
}

pub struct NflTeamSeasonStatsTool(pub Arc<NflApi>);

#[async_trait]
impl Tool for NflTeamSeasonStatsTool {
    fn name(&self) -> &'static str {
        "get_nfl_team_season_stats"
    }

    fn description(&self) -> &'static str {
        "Fetches the seasonal statistics for a specific NFL team."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "team_identifier": {
                    "type": "string",
                    "description": "The name, abbreviation, or unique identifier for the NFL team."
                },
                "season_year": {
                    "type": "string",
                    "description": "The year of the season."
                },
                "season_type": {
                    "type": "string",
                    "description": "The type of season (e.g., REG, PRE, PST)."
                }
            },
            "required": ["team_identifier", "season_year", "season_type"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let team_identifier = required_str(&args, "team_identifier")?;
        let season_year = str_or(&args, "season_year", "2025");
        let season_type = str_or(&args, "season_type", "reg");
        self.0
            .team_season_stats(&team_identifier, &season_year, &season_type)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_team_id_by_full_name() {
        assert_eq!(
            resolve_team_id("Jacksonville Jaguars").as_deref(),
            Some("f7ddd7fa-0bae-4f90-bc8e-669e4d6cf2de")
        );
    }

    #[test]
    fn test_resolve_team_id_by_mascot_and_abbreviation() {
        assert_eq!(
            resolve_team_id("Ravens").as_deref(),
            Some("ebd87119-b331-4469-9ea6-d51fe3ce2f1c")
        );
        assert_eq!(
            resolve_team_id("kc").as_deref(),
            Some("6680d28d-d4d2-49f6-aace-5292d3ec02c2")
        );
    }

    #[test]
    fn test_resolve_team_id_passes_raw_uuid_through() {
        let raw = "f0e724b0-4cbf-495a-be47-013907608da9";
        assert_eq!(resolve_team_id(raw).as_deref(), Some(raw));
    }

    #[test]
    fn test_resolve_team_id_rejects_unknown() {
        assert_eq!(resolve_team_id("Springfield Isotopes"), None);
    }

    fn sample_schedule() -> Value {
        json!({
            "week": {
                "games": [
                    {
                        "id": "game-1",
                        "scheduled": "2025-09-07T17:00:00+00:00",
                        "home": { "name": "Seattle Seahawks" },
                        "away": { "name": "Houston Texans" }
                    },
                    {
                        "id": "game-2",
                        "scheduled": "2025-09-08T00:20:00+00:00",
                        "home": { "name": "Buffalo Bills" },
                        "away": { "name": "Baltimore Ravens" }
                    }
                ]
            }
        })
    }

    #[test]
    fn test_find_game_matches_either_order() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 7).unwrap();
        let found = find_game_in_schedule(&sample_schedule(), "Texans", "Seahawks", date);
        assert_eq!(found["status"], "ok");
        assert_eq!(found["game"]["id"], "game-1");
    }

    #[test]
    fn test_find_game_respects_the_date() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 9).unwrap();
        let found = find_game_in_schedule(&sample_schedule(), "Texans", "Seahawks", date);
        assert_eq!(found["status"], "not_found");
    }

    #[test]
    fn test_find_game_misses_unlisted_teams() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 7).unwrap();
        let found = find_game_in_schedule(&sample_schedule(), "Bears", "Packers", date);
        assert_eq!(found["status"], "not_found");
    }
}
