//! Web research scraping and flat-JSON persistence
//!
//! Pulls the NBA schedule and news pages plus a betting-news feed, reduces
//! them to small structs, and writes them to flat JSON files. This is the
//! data the daily scheduler refreshes.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

use crate::http::get_scrape_client;

/// Where the persisted reports live, relative to the data directory
pub const SCHEDULE_FILE: &str = "nba_schedule.json";
pub const NEWS_FILE: &str = "nba_news.json";
pub const BETTING_NEWS_FILE: &str = "betting_news.json";

const NBA_GAMES_URL: &str = "https://www.nba.com/games";
const NBA_NEWS_URL: &str = "https://www.nba.com/news/category/top-stories";
const BETTING_NEWS_URL: &str = "https://www.bettingnews.com/nba/";

// Pre-compiled CSS selectors for the scraped pages
static GAME_CARD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.GameCard_gc__3_16k").expect("Invalid GAME_CARD_SELECTOR")
});
static TEAM_NAME_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("span.MatchupCardTeamName_teamName__3i-sP").expect("Invalid TEAM_NAME_SELECTOR")
});
static ARTICLE_LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a.Article_articleLink__2d20x").expect("Invalid ARTICLE_LINK_SELECTOR")
});
static HEADLINE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2").expect("Invalid HEADLINE_SELECTOR"));
static BETTING_ITEM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.news-item").expect("Invalid BETTING_ITEM_SELECTOR"));
static BETTING_TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3").expect("Invalid BETTING_TITLE_SELECTOR"));
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("Invalid ANCHOR_SELECTOR"));

/// One matchup scraped from the games page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePair {
    pub away_team: String,
    pub home_team: String,
}

/// One headline with its link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
}

/// Persisted schedule payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub date: String,
    pub last_updated: String,
    pub games: Vec<GamePair>,
}

impl ScheduleReport {
    pub fn new(date: NaiveDate, games: Vec<GamePair>) -> Self {
        Self {
            date: date.to_string(),
            last_updated: Utc::now().to_rfc3339(),
            games,
        }
    }
}

/// Persisted news payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsReport {
    pub last_updated: String,
    pub articles: Vec<Article>,
}

impl NewsReport {
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            last_updated: Utc::now().to_rfc3339(),
            articles,
        }
    }
}

/// Extract matchups from the nba.com games page
pub fn parse_schedule(html: &str) -> Vec<GamePair> {
    let document = Html::parse_document(html);
    document
        .select(&GAME_CARD_SELECTOR)
        .filter_map(|card| {
            let teams: Vec<String> = card
                .select(&TEAM_NAME_SELECTOR)
                .map(|name| name.text().collect::<String>().trim().to_string())
                .collect();
            match teams.as_slice() {
                [away, home] => Some(GamePair {
                    away_team: away.clone(),
                    home_team: home.clone(),
                }),
                _ => None,
            }
        })
        .collect()
}

/// Extract top-stories headlines from nba.com
pub fn parse_news(html: &str) -> Vec<Article> {
    let document = Html::parse_document(html);
    document
        .select(&ARTICLE_LINK_SELECTOR)
        .filter_map(|item| {
            let title = item
                .select(&HEADLINE_SELECTOR)
                .next()
                .map(|h| h.text().collect::<String>().trim().to_string())?;
            let href = item.value().attr("href")?;
            Some(Article {
                title,
                link: format!("https://www.nba.com{href}"),
            })
        })
        .filter(|article| !article.title.is_empty())
        .collect()
}

/// Extract NBA betting headlines from bettingnews.com
pub fn parse_betting_news(html: &str) -> Vec<Article> {
    let document = Html::parse_document(html);
    document
        .select(&BETTING_ITEM_SELECTOR)
        .filter_map(|item| {
            let title = item
                .select(&BETTING_TITLE_SELECTOR)
                .next()
                .map(|h| h.text().collect::<String>().trim().to_string())?;
            let link = item
                .select(&ANCHOR_SELECTOR)
                .next()
                .and_then(|a| a.value().attr("href"))?
                .to_string();
            Some(Article { title, link })
        })
        .filter(|article| !article.title.is_empty())
        .collect()
}

/// Fetch and parse the NBA schedule for a date
pub async fn fetch_nba_schedule(game_date: NaiveDate) -> Result<Vec<GamePair>> {
    let url = format!("{NBA_GAMES_URL}?date={game_date}");
    info!(%url, "fetching NBA schedule");
    let html = fetch_page(&url).await?;
    Ok(parse_schedule(&html))
}

/// Fetch and parse the NBA top stories
pub async fn fetch_nba_news() -> Result<Vec<Article>> {
    info!(url = NBA_NEWS_URL, "fetching NBA news");
    let html = fetch_page(NBA_NEWS_URL).await?;
    Ok(parse_news(&html))
}

/// Fetch and parse the NBA betting news
pub async fn fetch_betting_news() -> Result<Vec<Article>> {
    info!(url = BETTING_NEWS_URL, "fetching betting news");
    let html = fetch_page(BETTING_NEWS_URL).await?;
    Ok(parse_betting_news(&html))
}

async fn fetch_page(url: &str) -> Result<String> {
    let response = get_scrape_client()
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!("Fetching {url} returned {}", response.status());
    }

    response.text().await.context("Failed to read page body")
}

/// Write a report to a JSON file in the data directory
pub fn save_json<T: Serialize>(data: &T, dir: &Path, filename: &str) -> Result<()> {
    let path = dir.join(filename);
    let json = serde_json::to_string_pretty(data).context("Failed to serialize report")?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "saved report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schedule_extracts_matchups() {
        let html = r#"
            <html><body>
              <div class="GameCard_gc__3_16k">
                <span class="MatchupCardTeamName_teamName__3i-sP"> Heat </span>
                <span class="MatchupCardTeamName_teamName__3i-sP">Celtics</span>
              </div>
              <div class="GameCard_gc__3_16k">
                <span class="MatchupCardTeamName_teamName__3i-sP">Suns</span>
              </div>
            </body></html>"#;
        let games = parse_schedule(html);
        assert_eq!(
            games,
            vec![GamePair {
                away_team: "Heat".to_string(),
                home_team: "Celtics".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_news_builds_absolute_links() {
        let html = r#"
            <html><body>
              <a class="Article_articleLink__2d20x" href="/news/story-1">
                <h2>Big trade</h2>
              </a>
              <a class="Article_articleLink__2d20x" href="/news/story-2"></a>
            </body></html>"#;
        let articles = parse_news(html);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Big trade");
        assert_eq!(articles[0].link, "https://www.nba.com/news/story-1");
    }

    #[test]
    fn test_parse_betting_news_reads_item_anchor() {
        let html = r#"
            <html><body>
              <div class="news-item">
                <h3>Odds shift</h3>
                <a href="https://www.bettingnews.com/nba/odds-shift/">read</a>
              </div>
              <div class="news-item"><p>no headline</p></div>
            </body></html>"#;
        let articles = parse_betting_news(html);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].link, "https://www.bettingnews.com/nba/odds-shift/");
    }

    #[test]
    fn test_parse_schedule_empty_page() {
        assert!(parse_schedule("<html><body></body></html>").is_empty());
    }
}
