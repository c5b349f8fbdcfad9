//! System-prompt assembly
//!
//! Every proxied request gets a fresh system prompt: the template file with
//! the current date (in the configured timezone) and the sports state file
//! spliced in, plus the last NBA schedule snapshot so the model can answer
//! follow-ups about game ids without another lookup.

use anyhow::{Context, Result};
use chrono::Utc;

use crate::config::Config;
use crate::models::ChatMessage;
use crate::tools::nba::NbaContext;

/// Upstream requests carry at most this many history messages
pub const HISTORY_LIMIT: usize = 10;

/// Hole in the template filled with the formatted current date
const DATE_PLACEHOLDER: &str = "{current_date}";

/// Hole in the template filled with the sports state file contents
const STATE_PLACEHOLDER: &str = "{sports_state}";

/// Build the system prompt for one request
pub fn build_system_prompt(config: &Config, context: &NbaContext) -> Result<String> {
    let template = std::fs::read_to_string(&config.system_prompt_path)
        .with_context(|| format!("{} not found", config.system_prompt_path.display()))?;

    let now = Utc::now().with_timezone(&config.timezone);
    let current_date = now.format("%A, %B %d, %Y %I:%M %p %Z").to_string();

    // The state file is only required when the template references it
    let sports_state = if template.contains(STATE_PLACEHOLDER) {
        Some(
            std::fs::read_to_string(&config.sports_state_path)
                .with_context(|| format!("{} not found", config.sports_state_path.display()))?,
        )
    } else {
        None
    };

    let prompt = render_template(&template, &current_date, sports_state.as_deref());
    Ok(append_schedule_context(prompt, &context.schedule_lines()))
}

/// Fill the template holes
pub fn render_template(template: &str, current_date: &str, sports_state: Option<&str>) -> String {
    let mut prompt = template.trim().replace(DATE_PLACEHOLDER, current_date);
    if let Some(state) = sports_state {
        prompt = prompt.replace(STATE_PLACEHOLDER, state);
    }
    prompt
}

/// Append the remembered NBA schedule, if any
pub fn append_schedule_context(mut prompt: String, schedule_lines: &[String]) -> String {
    if schedule_lines.is_empty() {
        return prompt;
    }
    prompt.push_str(
        "\n\nFor your reference, here is the last NBA schedule you looked up. \
         Use the game_id from this list for any follow-up questions:\n",
    );
    prompt.push_str(&schedule_lines.join("\n"));
    prompt
}

/// Prepend the system prompt and keep only the newest history messages
pub fn conversation(system_prompt: String, mut history: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let tail = if history.len() > HISTORY_LIMIT {
        history.split_off(history.len() - HISTORY_LIMIT)
    } else {
        history
    };

    let mut messages = Vec::with_capacity(tail.len() + 1);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(tail);
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template_fills_both_holes() {
        let template = "You are Reki.\nToday: {current_date}\nState: {sports_state}";
        let rendered = render_template(template, "Monday, June 02, 2025", Some("{\"nba\":[]}"));
        assert!(rendered.contains("Today: Monday, June 02, 2025"));
        assert!(rendered.contains("State: {\"nba\":[]}"));
    }

    #[test]
    fn test_render_template_without_state_hole() {
        let rendered = render_template("Date is {current_date}.", "now", None);
        assert_eq!(rendered, "Date is now.");
    }

    #[test]
    fn test_append_schedule_context_noop_when_empty() {
        let prompt = append_schedule_context("base".to_string(), &[]);
        assert_eq!(prompt, "base");
    }

    #[test]
    fn test_append_schedule_context_lists_games() {
        let lines = vec!["Game ID: g1, Teams: A vs B".to_string()];
        let prompt = append_schedule_context("base".to_string(), &lines);
        assert!(prompt.contains("last NBA schedule"));
        assert!(prompt.ends_with("Game ID: g1, Teams: A vs B"));
    }

    #[test]
    fn test_conversation_truncates_to_newest_messages() {
        let history: Vec<ChatMessage> = (0..15).map(|i| ChatMessage::user(format!("m{i}"))).collect();
        let messages = conversation("sys".to_string(), history);

        assert_eq!(messages.len(), HISTORY_LIMIT + 1);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content.as_deref(), Some("m5"));
        assert_eq!(messages.last().unwrap().content.as_deref(), Some("m14"));
    }

    #[test]
    fn test_conversation_keeps_short_history_whole() {
        let history = vec![ChatMessage::user("hi")];
        let messages = conversation("sys".to_string(), history);
        assert_eq!(messages.len(), 2);
    }
}
