use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sanitize::{as_int, field, truncate_chars};

const MAX_TITLE_CHARS: usize = 60;

/// Persisted win-counter document (`wins.json`), also the `wins` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinCounterState {
    /// Signed and unclamped.
    #[serde(rename = "wins")]
    pub count: i64,
    pub title: String,
    pub accent: String,
}

impl Default for WinCounterState {
    fn default() -> Self {
        Self {
            count: 0,
            title: "WINS".to_string(),
            accent: "#22c55e".to_string(),
        }
    }
}

impl WinCounterState {
    pub fn from_value(raw: &Value) -> Self {
        let def = Self::default();
        Self {
            count: field(raw, "wins").and_then(as_int).unwrap_or(0),
            title: field(raw, "title")
                .and_then(Value::as_str)
                .map(|t| truncate_chars(t, MAX_TITLE_CHARS))
                .unwrap_or(def.title),
            accent: field(raw, "accent").and_then(Value::as_str).map(str::to_string).unwrap_or(def.accent),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WinsConfig {
    pub title: Option<String>,
    pub accent: Option<String>,
}

impl WinsConfig {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            title: field(raw, "title").and_then(Value::as_str).map(|t| truncate_chars(t, MAX_TITLE_CHARS)),
            accent: field(raw, "accent").and_then(Value::as_str).map(str::to_string),
        }
    }
}
