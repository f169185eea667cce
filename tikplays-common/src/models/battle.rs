use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sanitize::{as_bool, as_float, as_int, as_text, field};

pub const DEFAULT_TITLE_LEFT: &str = "Me reinicias";
pub const DEFAULT_TITLE_RIGHT: &str = "Me salvas";
pub const MIN_ROTATE_INTERVAL_MS: u64 = 400;
const DEFAULT_ROTATE_INTERVAL_MS: u64 = 1200;
const DEFAULT_LEAD_COUNTDOWN: u64 = 10;
const MIN_LEAD_COUNTDOWN: u64 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Grid,
    Rotate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleDisplay {
    pub mode: DisplayMode,
    pub interval_ms: u64,
}

impl Default for BattleDisplay {
    fn default() -> Self {
        Self {
            mode: DisplayMode::Grid,
            interval_ms: DEFAULT_ROTATE_INTERVAL_MS,
        }
    }
}

impl BattleDisplay {
    pub fn from_value(raw: &Value) -> Self {
        let mode = match field(raw, "mode").and_then(Value::as_str) {
            Some("rotate") => DisplayMode::Rotate,
            _ => DisplayMode::Grid,
        };
        let interval_ms = field(raw, "intervalMs")
            .and_then(as_int)
            .filter(|n| *n > 0)
            .map(|n| n as u64)
            .unwrap_or(DEFAULT_ROTATE_INTERVAL_MS)
            .max(MIN_ROTATE_INTERVAL_MS);
        Self { mode, interval_ms }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleSide {
    pub points: f64,
    /// Gift ids credited to this side.
    pub gifts: BTreeSet<String>,
}

/// Persisted gift-battle document (`giftBattleState.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleState {
    pub title_left: String,
    pub title_right: String,
    pub points_per_coin: f64,
    pub lead_countdown: u64,
    pub auto_reset_on_win: bool,
    pub left: BattleSide,
    pub right: BattleSide,
    pub display: BattleDisplay,
}

impl Default for BattleState {
    fn default() -> Self {
        Self {
            title_left: DEFAULT_TITLE_LEFT.to_string(),
            title_right: DEFAULT_TITLE_RIGHT.to_string(),
            points_per_coin: 1.0,
            lead_countdown: DEFAULT_LEAD_COUNTDOWN,
            auto_reset_on_win: false,
            left: BattleSide::default(),
            right: BattleSide::default(),
            display: BattleDisplay::default(),
        }
    }
}

fn side_from_value(raw: Option<&Value>) -> BattleSide {
    let Some(raw) = raw else {
        return BattleSide::default();
    };
    BattleSide {
        points: field(raw, "points").and_then(as_float).unwrap_or(0.0),
        gifts: gift_ids(field(raw, "gifts")),
    }
}

fn gift_ids(raw: Option<&Value>) -> BTreeSet<String> {
    raw.and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(as_text).collect())
        .unwrap_or_default()
}

impl BattleState {
    pub fn from_value(raw: &Value) -> Self {
        let def = Self::default();
        Self {
            title_left: field(raw, "titleLeft").and_then(as_text).unwrap_or(def.title_left),
            title_right: field(raw, "titleRight").and_then(as_text).unwrap_or(def.title_right),
            points_per_coin: field(raw, "pointsPerCoin")
                .and_then(as_float)
                .map(|f| f.max(0.0))
                .unwrap_or(def.points_per_coin),
            lead_countdown: field(raw, "leadCountdown")
                .and_then(as_int)
                .map(|n| n.max(MIN_LEAD_COUNTDOWN as i64) as u64)
                .unwrap_or(def.lead_countdown),
            auto_reset_on_win: field(raw, "autoResetOnWin").and_then(as_bool).unwrap_or(false),
            left: side_from_value(field(raw, "left")),
            right: side_from_value(field(raw, "right")),
            display: field(raw, "display").map(BattleDisplay::from_value).unwrap_or_default(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.left.gifts.is_empty() || !self.right.gifts.is_empty()
    }

    pub fn apply_config(&mut self, config: &BattleConfig) {
        if let Some(title) = &config.title_left {
            self.title_left = non_blank_or(title, DEFAULT_TITLE_LEFT);
        }
        if let Some(title) = &config.title_right {
            self.title_right = non_blank_or(title, DEFAULT_TITLE_RIGHT);
        }
        if let Some(gifts) = &config.left_gifts {
            self.left.gifts = gifts.clone();
        }
        if let Some(gifts) = &config.right_gifts {
            self.right.gifts = gifts.clone();
        }
        if let Some(ppc) = config.points_per_coin {
            self.points_per_coin = ppc;
        }
        if let Some(lead) = config.lead_countdown {
            self.lead_countdown = lead;
        }
        if let Some(flag) = config.auto_reset_on_win {
            self.auto_reset_on_win = flag;
        }
        if let Some(display) = &config.display {
            self.display = display.clone();
        }
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            title_left: self.title_left.clone(),
            title_right: self.title_right.clone(),
            lead_countdown: self.lead_countdown,
            left_points: self.left.points,
            right_points: self.right.points,
            left: self.left.clone(),
            right: self.right.clone(),
            display: self.display.clone(),
        }
    }
}

fn non_blank_or(s: &str, fallback: &str) -> String {
    let s = s.trim();
    if s.is_empty() { fallback.to_string() } else { s.to_string() }
}

/// `giftBattle` broadcast payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleSnapshot {
    pub title_left: String,
    pub title_right: String,
    pub lead_countdown: u64,
    pub left_points: f64,
    pub right_points: f64,
    pub left: BattleSide,
    pub right: BattleSide,
    pub display: BattleDisplay,
}

/// Partial configuration update from the operator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BattleConfig {
    pub title_left: Option<String>,
    pub title_right: Option<String>,
    pub left_gifts: Option<BTreeSet<String>>,
    pub right_gifts: Option<BTreeSet<String>>,
    pub points_per_coin: Option<f64>,
    pub lead_countdown: Option<u64>,
    pub auto_reset_on_win: Option<bool>,
    pub display: Option<BattleDisplay>,
}

impl BattleConfig {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            title_left: field(raw, "titleLeft").and_then(Value::as_str).map(str::to_string),
            title_right: field(raw, "titleRight").and_then(Value::as_str).map(str::to_string),
            left_gifts: field(raw, "leftGifts").filter(|v| v.is_array()).map(|v| gift_ids(Some(v))),
            right_gifts: field(raw, "rightGifts").filter(|v| v.is_array()).map(|v| gift_ids(Some(v))),
            points_per_coin: field(raw, "pointsPerCoin")
                .and_then(as_float)
                .map(|f| f.max(0.0)),
            lead_countdown: field(raw, "leadCountdown").map(|v| {
                as_int(v)
                    .filter(|n| *n != 0)
                    .unwrap_or(DEFAULT_LEAD_COUNTDOWN as i64)
                    .max(MIN_LEAD_COUNTDOWN as i64) as u64
            }),
            auto_reset_on_win: field(raw, "autoResetOnWin").and_then(as_bool),
            display: field(raw, "display").map(BattleDisplay::from_value),
        }
    }
}
