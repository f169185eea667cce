use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sanitize::{as_bool, field, non_negative_float, non_negative_int, truncate_chars};

pub const DEFAULT_COUNTDOWN_TITLE: &str = "Tiempo restante";
const MAX_TITLE_CHARS: usize = 120;

/// Persisted countdown document (`countdown.json`), also the `countdown`
/// broadcast payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownState {
    pub enabled: bool,
    pub running: bool,
    pub seconds_left: u64,
    pub seconds_per_coin: f64,
    pub title: String,
    /// 0 means uncapped.
    pub max_seconds: u64,
}

impl Default for CountdownState {
    fn default() -> Self {
        Self {
            enabled: true,
            running: false,
            seconds_left: 0,
            seconds_per_coin: 1.0,
            title: DEFAULT_COUNTDOWN_TITLE.to_string(),
            max_seconds: 0,
        }
    }
}

impl CountdownState {
    pub fn from_value(raw: &Value) -> Self {
        let def = Self::default();
        let title = match field(raw, "title").and_then(Value::as_str) {
            Some(t) if !t.is_empty() => truncate_chars(t, MAX_TITLE_CHARS),
            _ => def.title.clone(),
        };
        let mut state = Self {
            enabled: field(raw, "enabled").and_then(as_bool).unwrap_or(def.enabled),
            running: field(raw, "running").and_then(as_bool).unwrap_or(def.running),
            seconds_left: non_negative_int(raw, "secondsLeft").unwrap_or(def.seconds_left),
            seconds_per_coin: non_negative_float(raw, "secondsPerCoin").unwrap_or(def.seconds_per_coin),
            title,
            max_seconds: non_negative_int(raw, "maxSeconds").unwrap_or(def.max_seconds),
        };
        state.seconds_left = state.clamp_to_max(state.seconds_left);
        state
    }

    pub fn clamp_to_max(&self, seconds: u64) -> u64 {
        if self.max_seconds > 0 {
            seconds.min(self.max_seconds)
        } else {
            seconds
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddSource {
    Manual,
    Gift,
}

/// `countdown:add` payload, emitted separately from the steady-state
/// snapshot so overlays can animate a "+Ns".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownAdded {
    pub amount: u64,
    pub source: AddSource,
    /// Milliseconds since the Unix epoch.
    pub at: i64,
}

/// Partial configuration update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownConfig {
    pub seconds_per_coin: Option<f64>,
    pub title: Option<String>,
    pub max_seconds: Option<u64>,
    pub enabled: Option<bool>,
}

impl CountdownConfig {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            seconds_per_coin: field(raw, "secondsPerCoin")
                .map(|_| non_negative_float(raw, "secondsPerCoin").unwrap_or(0.0)),
            title: field(raw, "title").map(|t| match t {
                Value::String(s) => truncate_chars(s, MAX_TITLE_CHARS),
                other => truncate_chars(&other.to_string(), MAX_TITLE_CHARS),
            }),
            max_seconds: field(raw, "maxSeconds").map(|_| non_negative_int(raw, "maxSeconds").unwrap_or(0)),
            enabled: field(raw, "enabled").and_then(as_bool),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CountdownAction {
    Start,
    Pause,
    Reset,
    Add { seconds: u64 },
    Set { seconds: u64 },
    StartAt { seconds: u64 },
}

impl CountdownAction {
    /// Parses `{action, seconds?}`; invalid seconds count as 0.
    pub fn from_value(raw: &Value) -> Option<Self> {
        let seconds = non_negative_int(raw, "seconds").unwrap_or(0);
        match field(raw, "action")?.as_str()? {
            "start" => Some(CountdownAction::Start),
            "pause" => Some(CountdownAction::Pause),
            "reset" => Some(CountdownAction::Reset),
            "add" => Some(CountdownAction::Add { seconds }),
            "set" => Some(CountdownAction::Set { seconds }),
            "startAt" => Some(CountdownAction::StartAt { seconds }),
            _ => None,
        }
    }
}
