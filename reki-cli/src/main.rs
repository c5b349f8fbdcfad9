use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime, Timelike};
use clap::{Parser, Subcommand};
use std::io::Write;
use tracing::{error, info, warn};

use reki_core::tools::nba::NbaContext;
use reki_core::{ChatMessage, Config, Provider, ToolRegistry, agent, http, prompt};

#[derive(Parser)]
#[command(name = "reki")]
#[command(about = "Reki sports-analyst agent tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal chat with the agent
    Chat {
        /// Model to use
        #[arg(short, long, default_value = "gemini-2.5-flash-lite")]
        model: String,
    },

    /// Run the daily research trigger (news + betting news)
    Daily {
        /// Local time of day to fire, HH:MM
        #[arg(short, long, default_value = "10:45")]
        time: String,

        /// Base URL of the research service
        #[arg(short, long, default_value = "http://localhost:8007")]
        base_url: String,
    },

    /// Invoke a registered tool directly
    Tool {
        /// Function name, e.g. get_nba_teams_list
        name: String,

        /// JSON arguments
        #[arg(default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { model } => chat_command(model).await?,
        Commands::Daily { time, base_url } => daily_command(&time, &base_url).await?,
        Commands::Tool { name, args } => tool_command(&name, &args).await?,
    }

    Ok(())
}

async fn chat_command(model: String) -> Result<()> {
    let config = Config::from_env()?;
    let provider = Provider::for_model(&model, &config)?;
    let (registry, nba_context) = ToolRegistry::sports_suite(&config);

    println!("Reki is ready. Ask me something! (Type 'quit' to exit)");

    let mut history: Vec<ChatMessage> = Vec::new();
    let stdin = std::io::stdin();

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") {
            break;
        }

        history.push(ChatMessage::user(line));
        let messages = conversation_for_turn(&config, &nba_context, &history)?;

        print!("Agent: ");
        std::io::stdout().flush()?;

        let answer = agent::run_chat_stream(&provider, &registry, &model, messages, |chunk| {
            if let Some(content) = chunk.content() {
                print!("{content}");
                let _ = std::io::stdout().flush();
            }
        })
        .await;

        println!();
        match answer {
            Ok(content) => history.push(ChatMessage::assistant(content)),
            Err(e) => {
                error!(error = %e, "chat turn failed");
                // Drop the failed turn so history stays consistent
                history.pop();
            }
        }
    }

    Ok(())
}

fn conversation_for_turn(
    config: &Config,
    nba_context: &NbaContext,
    history: &[ChatMessage],
) -> Result<Vec<ChatMessage>> {
    let system_prompt = prompt::build_system_prompt(config, nba_context)?;
    Ok(prompt::conversation(system_prompt, history.to_vec()))
}

async fn daily_command(time: &str, base_url: &str) -> Result<()> {
    let fire_at = parse_fire_time(time)?;
    info!("Scheduler started. Research runs daily at {time} (local time)");

    loop {
        let now = Local::now();
        let next = next_run(now, fire_at);
        let wait = (next - now)
            .to_std()
            .unwrap_or_else(|_| std::time::Duration::from_secs(0));
        info!("Next research run at {}", next.format("%Y-%m-%d %H:%M"));
        tokio::time::sleep(wait).await;

        run_daily_research(base_url).await;
    }
}

/// Trigger the research endpoints; failures are logged, never fatal
async fn run_daily_research(base_url: &str) {
    info!("Scheduler triggered. Running daily research tasks");

    for endpoint in ["news", "betting-news"] {
        let url = format!("{}/{endpoint}", base_url.trim_end_matches('/'));
        match http::get_client().post(&url).send().await {
            Ok(response) if response.status().is_success() => {
                info!(endpoint, status = %response.status(), "research request successful");
            }
            Ok(response) => {
                warn!(endpoint, status = %response.status(), "research request rejected");
            }
            Err(e) => {
                warn!(endpoint, error = %e, "research request failed");
            }
        }
    }
}

fn parse_fire_time(time: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .with_context(|| format!("Invalid time '{time}', expected HH:MM"))
}

/// The next occurrence of `fire_at` strictly after `now`
fn next_run(now: DateTime<Local>, fire_at: NaiveTime) -> DateTime<Local> {
    let today = now
        .with_hour(fire_at.hour())
        .and_then(|t| t.with_minute(fire_at.minute()))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);

    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

async fn tool_command(name: &str, args: &str) -> Result<()> {
    let config = Config::from_env()?;
    let (registry, _nba_context) = ToolRegistry::sports_suite(&config);

    let Some(result) = registry.execute(name, args).await else {
        anyhow::bail!(
            "unknown tool '{name}'; registered tools: {}",
            registry.names().join(", ")
        );
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_fire_time() {
        assert!(parse_fire_time("10:45").is_ok());
        assert!(parse_fire_time("25:00").is_err());
        assert!(parse_fire_time("morning").is_err());
    }

    #[test]
    fn test_next_run_later_today() {
        let now = Local.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        let fire_at = NaiveTime::from_hms_opt(10, 45, 0).unwrap();
        let next = next_run(now, fire_at);
        assert_eq!(next.hour(), 10);
        assert_eq!(next.minute(), 45);
        assert_eq!(next.date_naive(), now.date_naive());
    }

    #[test]
    fn test_next_run_rolls_to_tomorrow() {
        let now = Local.with_ymd_and_hms(2025, 6, 2, 11, 0, 0).unwrap();
        let fire_at = NaiveTime::from_hms_opt(10, 45, 0).unwrap();
        let next = next_run(now, fire_at);
        assert_eq!(next.date_naive(), now.date_naive().succ_opt().unwrap());
    }
}
