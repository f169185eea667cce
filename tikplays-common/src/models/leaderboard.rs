use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sanitize::{as_bool, as_int, field, non_negative_int};

pub const DEFAULT_BOARD_TITLE: &str = "Top Monedas";
pub const DEFAULT_BOARD_UNIT: &str = "💎";
const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub coins: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardConfig {
    pub top_n: usize,
    pub title: String,
    pub unit: String,
    pub coin_icon_url: String,
    pub reset_on_disconnect: bool,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            title: DEFAULT_BOARD_TITLE.to_string(),
            unit: DEFAULT_BOARD_UNIT.to_string(),
            coin_icon_url: String::new(),
            reset_on_disconnect: false,
        }
    }
}

/// Persisted coin-board document (`coinBoard.json`): entries keyed by user
/// id alongside the board configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinBoardState {
    pub users: BTreeMap<String, LeaderboardEntry>,
    #[serde(flatten)]
    pub config: LeaderboardConfig,
}

fn top_n_of(raw: &Value) -> usize {
    as_int(raw).filter(|n| *n != 0).unwrap_or(DEFAULT_TOP_N as i64).max(1) as usize
}

fn entry_from_value(id: &str, raw: &Value) -> LeaderboardEntry {
    LeaderboardEntry {
        id: id.to_string(),
        name: field(raw, "name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(id)
            .to_string(),
        avatar: field(raw, "avatar").and_then(Value::as_str).unwrap_or_default().to_string(),
        coins: non_negative_int(raw, "coins").unwrap_or(0),
    }
}

impl CoinBoardState {
    pub fn from_value(raw: &Value) -> Self {
        let def = LeaderboardConfig::default();
        let users = field(raw, "users")
            .and_then(Value::as_object)
            .map(|users| {
                users
                    .iter()
                    .filter(|(id, _)| !id.is_empty())
                    .map(|(id, v)| (id.clone(), entry_from_value(id, v)))
                    .collect()
            })
            .unwrap_or_default();
        let unit = field(raw, "unit")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .unwrap_or(def.unit);
        Self {
            users,
            config: LeaderboardConfig {
                top_n: field(raw, "topN").map(top_n_of).unwrap_or(def.top_n),
                title: field(raw, "title").and_then(Value::as_str).map(str::to_string).unwrap_or(def.title),
                unit,
                coin_icon_url: field(raw, "coinIconUrl")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_default(),
                reset_on_disconnect: field(raw, "resetOnDisconnect").and_then(as_bool).unwrap_or(false),
            },
        }
    }
}

/// `coinBoard` broadcast payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinBoardSnapshot {
    pub title: String,
    pub unit: String,
    pub coin_icon_url: String,
    pub rows: Vec<LeaderboardEntry>,
}

/// Partial configuration update from the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardConfigPatch {
    pub top_n: Option<usize>,
    pub title: Option<String>,
    pub unit: Option<String>,
    pub coin_icon_url: Option<String>,
    pub reset_on_disconnect: Option<bool>,
}

impl LeaderboardConfigPatch {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            top_n: field(raw, "topN").map(top_n_of),
            title: field(raw, "title").and_then(Value::as_str).map(|t| {
                let t = t.trim();
                if t.is_empty() { DEFAULT_BOARD_TITLE.to_string() } else { t.to_string() }
            }),
            unit: field(raw, "unit").and_then(Value::as_str).map(|u| {
                let u = u.trim();
                if u.is_empty() { DEFAULT_BOARD_UNIT.to_string() } else { u.to_string() }
            }),
            coin_icon_url: field(raw, "coinIconUrl").and_then(Value::as_str).map(|u| u.trim().to_string()),
            reset_on_disconnect: field(raw, "resetOnDisconnect").and_then(as_bool),
        }
    }

    pub fn apply(&self, config: &mut LeaderboardConfig) {
        if let Some(n) = self.top_n {
            config.top_n = n;
        }
        if let Some(title) = &self.title {
            config.title = title.clone();
        }
        if let Some(unit) = &self.unit {
            config.unit = unit.clone();
        }
        if let Some(url) = &self.coin_icon_url {
            config.coin_icon_url = url.clone();
        }
        if let Some(flag) = self.reset_on_disconnect {
            config.reset_on_disconnect = flag;
        }
    }
}
