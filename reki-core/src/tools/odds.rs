//! Betting-odds tools backed by the Sportradar odds-comparison API
//!
//! The market payloads are huge; we keep only the moneyline/spread/total
//! markets and strip each bookmaker outcome down to the fields the model
//! actually reads.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

use super::{Tool, error_status, required_str};
use crate::cache::TtlCache;
use crate::sportradar::SportradarClient;

/// Odds move during the day; keep schedules for an hour at most
const SCHEDULE_TTL: Duration = Duration::from_secs(3_600);

/// Sport name → Sportradar sport id
const SPORT_IDS: &[(&str, &str)] = &[
    ("basketball", "sr:sport:2"),
    ("american_football", "sr:sport:16"),
];

/// Markets worth showing; everything else is dropped
const TARGET_MARKETS: &[&str] = &["moneyline", "spread", "total"];

fn sport_id(sport_name: &str) -> Option<&'static str> {
    SPORT_IDS
        .iter()
        .find(|(name, _)| *name == sport_name.to_lowercase())
        .map(|(_, id)| *id)
}

fn valid_sports() -> Vec<&'static str> {
    SPORT_IDS.iter().map(|(name, _)| *name).collect()
}

/// Keep only the target markets and slim each book down to essentials
pub fn filter_markets(mut data: Value) -> Value {
    let Some(markets) = data.get("markets").and_then(Value::as_array).cloned() else {
        return data;
    };

    let filtered: Vec<Value> = markets
        .into_iter()
        .filter(|market| {
            let name = market["name"].as_str().unwrap_or_default().to_lowercase();
            TARGET_MARKETS.iter().any(|target| name.contains(target))
        })
        .map(|mut market| {
            let books: Vec<Value> = market["books"]
                .as_array()
                .map(|books| {
                    books
                        .iter()
                        .map(|book| {
                            let outcomes: Vec<Value> = book["outcomes"]
                                .as_array()
                                .map(|outcomes| {
                                    outcomes
                                        .iter()
                                        .map(|o| {
                                            json!({
                                                "type": o.get("type").cloned().unwrap_or(Value::Null),
                                                "odds_decimal": o.get("odds_decimal").cloned().unwrap_or(Value::Null),
                                                "odds_american": o.get("odds_american").cloned().unwrap_or(Value::Null),
                                                "total": o.get("total").cloned().unwrap_or(Value::Null),
                                            })
                                        })
                                        .collect()
                                })
                                .unwrap_or_default();
                            json!({
                                "name": book.get("name").cloned().unwrap_or(Value::Null),
                                "outcomes": outcomes,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            market["books"] = Value::Array(books);
            market
        })
        .collect();

    data["markets"] = Value::Array(filtered);
    json!({ "status": "ok", "data": data })
}

pub struct OddsApi {
    client: SportradarClient,
    schedule_cache: TtlCache<(String, String), Value>,
}

impl OddsApi {
    pub fn new(client: SportradarClient) -> Self {
        Self {
            client,
            schedule_cache: TtlCache::new(SCHEDULE_TTL),
        }
    }

    /// Scheduled events for a sport and date; each carries the
    /// sport_event_id needed to fetch market odds
    pub async fn daily_schedule_odds(&self, sport_name: &str, date: &str) -> Result<Value> {
        let Some(sport_id) = sport_id(sport_name) else {
            return Ok(error_status(format!(
                "Invalid sport name: {sport_name}. Valid options are: {:?}",
                valid_sports()
            )));
        };

        let key = (sport_id.to_string(), date.to_string());
        if let Some(schedule) = self.schedule_cache.get(&key) {
            return Ok(schedule);
        }

        let schedule = self
            .client
            .get(&format!("sports/{sport_id}/schedules/{date}/schedules.json"), &[])
            .await?;
        self.schedule_cache.insert(key, schedule.clone());
        Ok(schedule)
    }

    /// Pre-match markets for one event, filtered to the essentials
    pub async fn sport_event_markets(&self, sport_event_id: &str) -> Result<Value> {
        let markets = self
            .client
            .get(
                &format!("sport_events/{sport_event_id}/sport_event_markets.json"),
                &[],
            )
            .await?;
        Ok(filter_markets(markets))
    }
}

pub struct DailyScheduleOddsTool(pub Arc<OddsApi>);

#[async_trait]
impl Tool for DailyScheduleOddsTool {
    fn name(&self) -> &'static str {
        "get_daily_schedule_odds"
    }

    fn description(&self) -> &'static str {
        "Fetches the daily schedule for a given sport, returning a list of scheduled events and \
         their unique sport_event_id, which is required to fetch market odds."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "sport_name": {
                    "type": "string",
                    "description": "The sport to look up. Valid options: 'basketball', 'american_football'."
                },
                "date": {
                    "type": "string",
                    "description": "The date of the schedule in YYYY-MM-DD format."
                }
            },
            "required": ["sport_name", "date"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let sport_name = required_str(&args, "sport_name")?;
        let date = required_str(&args, "date")?;
        self.0.daily_schedule_odds(&sport_name, &date).await
    }
}

pub struct SportEventMarketsTool(pub Arc<OddsApi>);

#[async_trait]
impl Tool for SportEventMarketsTool {
    fn name(&self) -> &'static str {
        "get_sport_event_markets"
    }

    fn description(&self) -> &'static str {
        "Fetches the available pre-match markets (moneyline, spread, total) for a specific sport \
         event, returning only essential fields."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "sport_event_id": {
                    "type": "string",
                    "description": "The unique identifier of the sport event, e.g. 'sr:sport_event:12345'."
                }
            },
            "required": ["sport_event_id"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let sport_event_id = required_str(&args, "sport_event_id")?;
        self.0.sport_event_markets(&sport_event_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sport_id_mapping() {
        assert_eq!(sport_id("basketball"), Some("sr:sport:2"));
        assert_eq!(sport_id("American_Football"), Some("sr:sport:16"));
        assert_eq!(sport_id("cricket"), None);
    }

    fn sample_markets() -> Value {
        json!({
            "sport_event": { "id": "sr:sport_event:1" },
            "markets": [
                {
                    "name": "2way moneyline",
                    "books": [{
                        "name": "BookA",
                        "external_id": "xyz",
                        "outcomes": [{
                            "type": "home",
                            "odds_decimal": "1.91",
                            "odds_american": "-110",
                            "total": null,
                            "external_outcome_id": "abc"
                        }]
                    }]
                },
                { "name": "player props", "books": [] },
                { "name": "Total points", "books": [] }
            ]
        })
    }

    #[test]
    fn test_filter_markets_keeps_only_targets() {
        let filtered = filter_markets(sample_markets());
        assert_eq!(filtered["status"], "ok");
        let markets = filtered["data"]["markets"].as_array().unwrap();
        assert_eq!(markets.len(), 2);
        assert_eq!(markets[0]["name"], "2way moneyline");
        assert_eq!(markets[1]["name"], "Total points");
    }

    #[test]
    fn test_filter_markets_slims_outcomes() {
        let filtered = filter_markets(sample_markets());
        let outcome = &filtered["data"]["markets"][0]["books"][0]["outcomes"][0];
        assert_eq!(outcome["odds_american"], "-110");
        assert!(outcome.get("external_outcome_id").is_none());
        let book = &filtered["data"]["markets"][0]["books"][0];
        assert!(book.get("external_id").is_none());
    }

    #[test]
    fn test_filter_markets_passes_through_without_markets_key() {
        let payload = json!({ "status": "error", "message": "nope" });
        assert_eq!(filter_markets(payload.clone()), payload);
    }
}
