//! Dialogue states and reply validation for the multi-step conversations.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The question the bot is waiting for an answer to.
///
/// The string forms are the ones persisted in session records and must stay
/// stable across releases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
    NameConfirmation,
    Weight,
    Height,
    Age,
    /// Waiting for a `set_sex` callback
    Sex,
    /// Waiting for a `set_activity` callback
    Activity,
    AskAi,
    IntroResponse,
    NotifyTime,
}

impl DialogState {
    pub const ALL: [DialogState; 9] = [
        DialogState::NameConfirmation,
        DialogState::Weight,
        DialogState::Height,
        DialogState::Age,
        DialogState::Sex,
        DialogState::Activity,
        DialogState::AskAi,
        DialogState::IntroResponse,
        DialogState::NotifyTime,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DialogState::NameConfirmation => "name_confirmation",
            DialogState::Weight => "weight",
            DialogState::Height => "height",
            DialogState::Age => "age",
            DialogState::Sex => "sex",
            DialogState::Activity => "activity",
            DialogState::AskAi => "ask_ai",
            DialogState::IntroResponse => "intro_response",
            DialogState::NotifyTime => "notify_time",
        }
    }

    /// States that only advance through inline buttons
    pub fn expects_callback(self) -> bool {
        matches!(self, DialogState::Sex | DialogState::Activity)
    }
}

impl fmt::Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialogState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DialogState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

lazy_static! {
    static ref TIME_PATTERN: Regex =
        Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("time pattern is valid");
}

const AFFIRMATIVE_WORDS: &[&str] = &["да", "ага", "yes", "ок", "ok", "верно", "подтверждаю"];
const CANCEL_WORDS: &[&str] = &["отмена", "стоп", "cancel", "/cancel"];

/// Parse a weight, height or age reply.
///
/// Accepts a decimal comma; the value must be finite and strictly positive.
pub fn parse_positive_number(input: &str) -> Option<f64> {
    let normalized = input.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Some(value),
        _ => None,
    }
}

/// Largest accepted reply per numeric question (kg, cm, years)
pub const MAX_WEIGHT_KG: f64 = 500.0;
pub const MAX_HEIGHT_CM: f64 = 300.0;
pub const MAX_AGE_YEARS: f64 = 150.0;

/// Parse the reply to a weight, height or age question, rejecting values
/// outside the plausible range for that question
pub fn parse_measurement(state: DialogState, input: &str) -> Option<f64> {
    let max = match state {
        DialogState::Weight => MAX_WEIGHT_KG,
        DialogState::Height => MAX_HEIGHT_CM,
        DialogState::Age => MAX_AGE_YEARS,
        _ => return None,
    };
    parse_positive_number(input).filter(|value| *value <= max)
}

/// Validate a 24-hour `HH:MM` notification time
pub fn validate_notify_time(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();
    if TIME_PATTERN.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err("invalid-notify-time")
    }
}

/// Validates a display name reply
pub fn validate_name(name: &str) -> Result<String, &'static str> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    if trimmed.chars().count() > 64 {
        return Err("too_long");
    }

    Ok(trimmed.to_string())
}

/// True when any word of the reply is a yes/confirm keyword
pub fn is_affirmative(input: &str) -> bool {
    input
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| AFFIRMATIVE_WORDS.contains(&word))
}

/// True when the whole reply asks to abandon the pending dialog
pub fn is_cancel_request(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    CANCEL_WORDS.contains(&normalized.as_str())
}
