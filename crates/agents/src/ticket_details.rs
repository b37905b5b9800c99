//! Deriving incident fields from a free-form request.
//!
//! The heuristic in [`TicketDetails::from_request`] always succeeds. The
//! optional [`TicketDetailsInterpreter`] asks the reasoning service for a
//! better summary and falls back to the heuristic for anything it cannot
//! supply.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use switchboard_common::{Result, SwitchboardError};
use switchboard_llm::{LlmClient, LlmRequest};
use tracing::{debug, warn};

const SHORT_DESCRIPTION_PREVIEW: usize = 50;

const DEVICE_WORDS: &[&str] = &["laptop", "computer", "pc", "monitor", "screen"];
const FAILURE_WORDS: &[&str] = &["broken", "won't", "doesn't", "failed"];

const HIGH_IMPACT: &[&str] = &["high", "critical", "urgent", "emergency"];
const MEDIUM_IMPACT: &[&str] = &["medium", "moderate"];
const LOW_IMPACT: &[&str] = &["low", "minor"];

const HIGH_URGENCY: &[&str] = &["urgent", "urgently", "asap", "immediate", "high urgency"];
const MEDIUM_URGENCY: &[&str] = &["medium urgency", "moderate"];
const LOW_URGENCY: &[&str] = &["low urgency", "when convenient"];

const TICKET_DETAILS_PROMPT: &str = r#"You are a specialised Ticket Details Interpreter for a UK audience.

Extract or infer ServiceNow incident fields from the user's description of an IT problem.

RULES:
1. short_description: the core issue in one line ("My laptop won't turn on" -> "Laptop not powering on")
2. description: the full user input, expanded if very brief
3. impact: "1" High (hardware failures, cannot work), "2" Medium (single application), "3" Low (minor issues, questions)
4. urgency: "1" High (urgent, emergency, cannot work), "2" Medium (need help, when possible), "3" Low (when convenient, no rush)

Return ONLY a JSON object:
{"short_description": "...", "description": "...", "impact": "2", "urgency": "2"}
"#;

/// ServiceNow impact/urgency scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Level {
    High,
    #[default]
    Medium,
    Low,
}

impl Level {
    pub fn code(&self) -> &'static str {
        match self {
            Level::High => "1",
            Level::Medium => "2",
            Level::Low => "3",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "1" => Some(Level::High),
            "2" => Some(Level::Medium),
            "3" => Some(Level::Low),
            _ => None,
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::from_code(s),
            Value::Number(n) => n.as_u64().and_then(|n| Self::from_code(&n.to_string())),
            _ => None,
        }
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.code().to_string()
    }
}

impl TryFrom<String> for Level {
    type Error = String;

    fn try_from(code: String) -> std::result::Result<Self, Self::Error> {
        Level::from_code(&code).ok_or_else(|| format!("invalid level '{code}', expected 1, 2 or 3"))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDetails {
    pub short_description: String,
    pub description: String,
    pub impact: Level,
    pub urgency: Level,
}

impl TicketDetails {
    /// Keyword heuristic over the raw request text.
    pub fn from_request(text: &str) -> Self {
        let text = text.trim();
        let lower = text.to_lowercase();

        Self {
            short_description: summarize(text, &lower),
            description: text.to_string(),
            impact: level_for(&lower, HIGH_IMPACT, MEDIUM_IMPACT, LOW_IMPACT),
            urgency: level_for(&lower, HIGH_URGENCY, MEDIUM_URGENCY, LOW_URGENCY),
        }
    }
}

fn summarize(text: &str, lower: &str) -> String {
    if DEVICE_WORDS.iter().any(|w| lower.contains(w)) {
        let words: Vec<&str> = text.split_whitespace().collect();
        if let Some(i) = failure_word_index(&words) {
            let start = i.saturating_sub(2);
            let end = (i + 3).min(words.len());
            return words[start..end].join(" ");
        }
    }

    if text.chars().count() > SHORT_DESCRIPTION_PREVIEW {
        let head: String = text.chars().take(SHORT_DESCRIPTION_PREVIEW).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn failure_word_index(words: &[&str]) -> Option<usize> {
    words.iter().enumerate().position(|(i, word)| {
        let word = word.to_lowercase();
        FAILURE_WORDS.iter().any(|f| word.contains(f))
            || (word == "not"
                && words
                    .get(i + 1)
                    .is_some_and(|next| next.to_lowercase().starts_with("working")))
    })
}

fn level_for(lower: &str, high: &[&str], medium: &[&str], low: &[&str]) -> Level {
    if high.iter().any(|w| lower.contains(w)) {
        Level::High
    } else if medium.iter().any(|w| lower.contains(w)) {
        Level::Medium
    } else if low.iter().any(|w| lower.contains(w)) {
        Level::Low
    } else {
        Level::Medium
    }
}

/// Reasoning-service interpretation of ticket fields.
pub struct TicketDetailsInterpreter {
    llm: Arc<dyn LlmClient>,
}

impl TicketDetailsInterpreter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Interpret `text`, falling back to the heuristic on any failure.
    pub async fn interpret(&self, text: &str) -> TicketDetails {
        let fallback = TicketDetails::from_request(text);
        match self.try_interpret(text, &fallback).await {
            Ok(details) => details,
            Err(e) => {
                warn!(error = %e, "Ticket detail interpretation failed, using keyword heuristic");
                fallback
            }
        }
    }

    async fn try_interpret(&self, text: &str, fallback: &TicketDetails) -> Result<TicketDetails> {
        let request = LlmRequest::prompt(format!("User input: {text}"))
            .with_system_prompt(TICKET_DETAILS_PROMPT)
            .with_temperature(0.0);

        let response = self.llm.complete(request).await?;
        debug!(reply = %response.content, "Ticket detail interpreter reply");

        parse_details_reply(&response.content, fallback)
    }
}

/// Parse the interpreter's JSON reply, filling gaps from `fallback`.
pub fn parse_details_reply(reply: &str, fallback: &TicketDetails) -> Result<TicketDetails> {
    let json_str = extract_json_object(reply).ok_or_else(|| {
        SwitchboardError::Provider("no JSON object in ticket details reply".to_string())
    })?;
    let parsed: Value = serde_json::from_str(json_str)?;

    Ok(TicketDetails {
        short_description: text_field(&parsed, "short_description", &fallback.short_description),
        description: text_field(&parsed, "description", &fallback.description),
        impact: parsed
            .get("impact")
            .and_then(Level::from_json)
            .unwrap_or(fallback.impact),
        urgency: parsed
            .get("urgency")
            .and_then(Level::from_json)
            .unwrap_or(fallback.urgency),
    })
}

fn text_field(parsed: &Value, key: &str, default: &str) -> String {
    parsed
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Return the first balanced `{...}` span in `s`.
pub fn extract_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0;
    let mut end = start;

    for (i, c) in s[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = start + i + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    if depth == 0 && end > start {
        Some(&s[start..end])
    } else {
        None
    }
}
