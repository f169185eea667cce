use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::sanitize::{as_bool, as_int};

/// Gift ids arrive as numbers from the live client and as strings from
/// operator tools; both are kept as strings.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Flags may arrive as booleans, 0/1 or "true"/"false"; anything else
/// (including null) is false.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        other => as_bool(other).or_else(|| as_int(other).map(|n| n != 0)).unwrap_or(false),
    })
}

/// Numbers or numeric strings; negative or unusable values become `None`.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_int(&value).filter(|n| *n >= 0).map(|n| n as u64))
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_int(&value))
}

/// `giftType` value the live client uses for streakable (combo) gifts.
pub const STREAK_GIFT_TYPE: i64 = 1;

/// A gift exactly as the live-stream client reports it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGift {
    #[serde(default, deserialize_with = "string_or_number")]
    pub gift_id: String,
    #[serde(default)]
    pub gift_name: Option<String>,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub repeat_count: Option<Value>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub repeat_end: bool,
    #[serde(default, deserialize_with = "lenient_int")]
    pub gift_type: Option<i64>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    /// Nested user object; only the nickname and avatar fields are read.
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub diamond_count: Option<u64>,
}

impl RawGift {
    pub fn is_streak(&self) -> bool {
        self.gift_type == Some(STREAK_GIFT_TYPE)
    }

    /// Reported repeat count; absent or invalid counts as 1.
    pub fn repeat_count(&self) -> u64 {
        self.repeat_count
            .as_ref()
            .and_then(as_int)
            .filter(|n| *n >= 1)
            .map(|n| n as u64)
            .unwrap_or(1)
    }

    pub fn user_id(&self) -> String {
        self.unique_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("anon")
            .to_string()
    }

    pub fn display_name(&self) -> String {
        non_empty(self.nickname.as_deref())
            .or_else(|| non_empty(self.user_str(&["nickname"])))
            .map(str::to_string)
            .unwrap_or_else(|| self.user_id())
    }

    pub fn avatar(&self) -> String {
        non_empty(self.profile_picture_url.as_deref())
            .or_else(|| non_empty(self.user_str(&["profilePictureUrl"])))
            .or_else(|| non_empty(self.user_first_url("avatarThumb")))
            .or_else(|| non_empty(self.user_first_url("avatarLarger")))
            .unwrap_or_default()
            .to_string()
    }

    fn user_str(&self, path: &[&str]) -> Option<&str> {
        let mut cur = self.user.as_ref()?;
        for key in path {
            cur = cur.get(key)?;
        }
        cur.as_str()
    }

    fn user_first_url(&self, key: &str) -> Option<&str> {
        self.user.as_ref()?.get(key)?.get("url_list")?.get(0)?.as_str()
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// One event from the live-stream client, in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LiveEvent {
    Gift(RawGift),
    Like {
        #[serde(default, rename = "likeCount")]
        like_count: Option<Value>,
    },
    Follow {},
    Chat {
        #[serde(default, rename = "uniqueId")]
        unique_id: Option<String>,
        #[serde(default)]
        comment: Option<String>,
    },
    /// The live connection was closed.
    Disconnected,
}

impl LiveEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            LiveEvent::Gift(_) => "gift",
            LiveEvent::Like { .. } => "like",
            LiveEvent::Follow {} => "follow",
            LiveEvent::Chat { .. } => "chat",
            LiveEvent::Disconnected => "disconnected",
        }
    }

    /// Likes carried by a like event; missing or non-positive counts as 1.
    pub fn like_increment(like_count: Option<&Value>) -> u64 {
        like_count
            .and_then(as_int)
            .filter(|n| *n > 0)
            .map(|n| n as u64)
            .unwrap_or(1)
    }
}

/// Normalized, incremental gift. `quantity` is the number of units newly
/// credited by this event, never the running streak total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftEvent {
    pub gift_id: String,
    pub user_id: String,
    pub display_name: String,
    pub avatar: String,
    pub quantity: u64,
    pub coins_per_unit: u64,
    pub gift_name: String,
    pub gift_image: String,
}

impl GiftEvent {
    pub fn total_coins(&self) -> u64 {
        self.coins_per_unit.saturating_mul(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub diamond_count: u64,
}

/// Gift as listed by the live client's "available gifts" call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableGift {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, alias = "diamond_count")]
    pub diamond_count: u64,
}

/// Per-profile gift catalog keyed by gift id (`giftCatalog.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GiftCatalog(pub BTreeMap<String, GiftInfo>);

impl GiftCatalog {
    pub fn from_available(gifts: Vec<AvailableGift>) -> Self {
        let map = gifts
            .into_iter()
            .filter(|g| !g.id.is_empty())
            .map(|g| {
                (
                    g.id,
                    GiftInfo {
                        name: g.name,
                        image: g.image,
                        diamond_count: g.diamond_count,
                    },
                )
            })
            .collect();
        Self(map)
    }

    pub fn get(&self, gift_id: &str) -> Option<&GiftInfo> {
        self.0.get(gift_id)
    }

    /// Entries ordered by coin value, then lowercase name, then numeric id.
    pub fn sorted(&self) -> Vec<(&String, &GiftInfo)> {
        let mut rows: Vec<_> = self.0.iter().collect();
        rows.sort_by(|(ia, a), (ib, b)| {
            a.diamond_count
                .cmp(&b.diamond_count)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| match (ia.parse::<u64>(), ib.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => ia.cmp(ib),
                })
        });
        rows
    }
}
