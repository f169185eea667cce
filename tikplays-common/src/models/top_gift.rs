use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sanitize::{field, non_negative_int};

/// High-water mark of the single most valuable gift (`topGift.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopGiftRecord {
    /// Same value as `coins`; kept for overlays that read the old field.
    pub diamond_count: u64,
    pub gift_name: String,
    pub gift_image: String,
    pub username: String,
    pub coins: u64,
}

impl TopGiftRecord {
    pub fn from_value(raw: &Value) -> Self {
        let text = |key: &str| field(raw, key).and_then(Value::as_str).unwrap_or_default().to_string();
        let coins = non_negative_int(raw, "coins")
            .or_else(|| non_negative_int(raw, "diamondCount"))
            .unwrap_or(0);
        Self {
            diamond_count: coins,
            gift_name: text("giftName"),
            gift_image: text("giftImage"),
            username: text("username"),
            coins,
        }
    }
}
