//! Action rules: what a gift, a like step or a follow turns into.
//!
//! Rules are persisted per profile as a map keyed by target id whose values
//! are either a bare webhook URL or an object. Both shapes are normalized
//! once, at load time, into [`ActionRule`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::sanitize::{as_bool, as_float, as_int, as_text, clamp_unit, field};

pub const FOLLOW_TARGET: &str = "FOLLOW";
pub const LIKES_PREFIX: &str = "LIKES:";

/// Rule map exactly as stored in `webhooks.json`.
pub type RawRuleMap = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleTarget {
    Gift(String),
    Follow,
    /// `LIKES:<step>`; fires once per crossed multiple of `step`.
    LikeStep(u64),
    /// A `LIKES:` key whose step is not a positive integer.
    InvalidLikeStep,
}

impl RuleTarget {
    pub fn parse(target_id: &str) -> Self {
        if target_id == FOLLOW_TARGET {
            return RuleTarget::Follow;
        }
        match target_id.strip_prefix(LIKES_PREFIX) {
            Some(step) => match step.trim().parse::<u64>() {
                Ok(step) if step >= 1 => RuleTarget::LikeStep(step),
                _ => RuleTarget::InvalidLikeStep,
            },
            None => RuleTarget::Gift(target_id.to_string()),
        }
    }
}

/// One independently-failing side effect of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Capability {
    Webhook { url: String },
    KeyPress { token: String },
    Command { command: String },
    Sound { url: String, volume: f64 },
    Video { url: String, volume: f64, #[serde(rename = "loop")] looped: bool },
}

impl Capability {
    /// Cues fire once per dispatch; everything else repeats.
    pub fn is_cue(&self) -> bool {
        matches!(self, Capability::Sound { .. } | Capability::Video { .. })
    }
}

/// Upper bound for a rule's `repeat`.
pub const MAX_REPEAT: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct ActionRule {
    pub target_id: String,
    pub target: RuleTarget,
    pub repeat_count: u32,
    pub capabilities: Vec<Capability>,
}

impl ActionRule {
    /// Builds a rule from a stored entry. Returns `None` for entries that
    /// carry no capability at all.
    pub fn from_entry(target_id: &str, raw: &Value) -> Option<Self> {
        let target_id = target_id.trim();
        if target_id.is_empty() {
            return None;
        }

        let mut capabilities = Vec::new();
        let mut repeat_count = 1;

        match raw {
            Value::String(url) => {
                let url = url.trim();
                if url.is_empty() {
                    return None;
                }
                capabilities.push(Capability::Webhook { url: url.to_string() });
            }
            Value::Object(_) => {
                if let Some(url) = field(raw, "webhook").and_then(as_text) {
                    capabilities.push(Capability::Webhook { url });
                }
                if let Some(token) = field(raw, "key").and_then(as_text) {
                    capabilities.push(Capability::KeyPress { token });
                }
                if let Some(command) = field(raw, "mcCommand").and_then(as_text) {
                    capabilities.push(Capability::Command { command });
                }
                if let Some(url) = field(raw, "soundUrl").and_then(as_text) {
                    let volume = volume_of(raw, "soundVolume");
                    capabilities.push(Capability::Sound { url, volume });
                }
                if let Some(url) = field(raw, "videoUrl").and_then(as_text) {
                    let volume = volume_of(raw, "videoVolume");
                    let looped = field(raw, "videoLoop").and_then(as_bool).unwrap_or(false);
                    capabilities.push(Capability::Video { url, volume, looped });
                }
                if let Some(n) = field(raw, "repeat").and_then(as_int) {
                    repeat_count = n.clamp(1, i64::from(MAX_REPEAT)) as u32;
                }
            }
            _ => return None,
        }

        if capabilities.is_empty() {
            return None;
        }

        Some(Self {
            target_id: target_id.to_string(),
            target: RuleTarget::parse(target_id),
            repeat_count,
            capabilities,
        })
    }

    /// Canonical stored shape of this rule.
    pub fn to_raw(&self) -> Value {
        let mut obj = Map::new();
        for cap in &self.capabilities {
            match cap {
                Capability::Webhook { url } => {
                    obj.insert("webhook".into(), Value::from(url.as_str()));
                }
                Capability::KeyPress { token } => {
                    obj.insert("key".into(), Value::from(token.as_str()));
                }
                Capability::Command { command } => {
                    obj.insert("mcCommand".into(), Value::from(command.as_str()));
                }
                Capability::Sound { url, volume } => {
                    obj.insert("soundUrl".into(), Value::from(url.as_str()));
                    obj.insert("soundVolume".into(), Value::from(*volume));
                }
                Capability::Video { url, volume, looped } => {
                    obj.insert("videoUrl".into(), Value::from(url.as_str()));
                    obj.insert("videoVolume".into(), Value::from(*volume));
                    obj.insert("videoLoop".into(), Value::from(*looped));
                }
            }
        }
        obj.insert("repeat".into(), Value::from(self.repeat_count));
        Value::Object(obj)
    }
}

/// Missing volume plays at full volume; present values clamp to `[0,1]`.
fn volume_of(raw: &Value, key: &str) -> f64 {
    field(raw, key).and_then(as_float).map(clamp_unit).unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_string_is_a_webhook_rule() {
        let rule = ActionRule::from_entry("5655", &json!(" https://hook.example/x ")).unwrap();
        assert_eq!(rule.target, RuleTarget::Gift("5655".into()));
        assert_eq!(rule.repeat_count, 1);
        assert_eq!(rule.capabilities, vec![Capability::Webhook { url: "https://hook.example/x".into() }]);
    }

    #[test]
    fn object_entries_are_sanitized() {
        let rule = ActionRule::from_entry(
            "LIKES:100",
            &json!({
                "key": "space",
                "mcCommand": "say hi",
                "repeat": "0",
                "soundUrl": "http://s/boom.mp3",
                "soundVolume": 4,
                "videoUrl": "/videos/a.mp4",
                "videoVolume": "0.25",
                "videoLoop": true
            }),
        )
        .unwrap();
        assert_eq!(rule.target, RuleTarget::LikeStep(100));
        assert_eq!(rule.repeat_count, 1);
        assert!(rule.capabilities.contains(&Capability::Sound { url: "http://s/boom.mp3".into(), volume: 1.0 }));
        assert!(rule.capabilities.contains(&Capability::Video { url: "/videos/a.mp4".into(), volume: 0.25, looped: true }));
        assert_eq!(rule.to_raw()["mcCommand"], "say hi");
    }

    #[test]
    fn repeat_is_capped() {
        let rule = ActionRule::from_entry("5001", &json!({"key": "up", "repeat": 100000})).unwrap();
        assert_eq!(rule.repeat_count, MAX_REPEAT);
        assert_eq!(rule.to_raw()["repeat"], 100);
    }

    #[test]
    fn empty_entries_are_dropped() {
        assert!(ActionRule::from_entry("1", &json!("   ")).is_none());
        assert!(ActionRule::from_entry("1", &json!({"repeat": 3})).is_none());
        assert!(ActionRule::from_entry("", &json!("http://x")).is_none());
        assert!(ActionRule::from_entry("1", &json!(42)).is_none());
    }

    #[test]
    fn target_ids_parse() {
        assert_eq!(RuleTarget::parse("FOLLOW"), RuleTarget::Follow);
        assert_eq!(RuleTarget::parse("LIKES:0"), RuleTarget::InvalidLikeStep);
        assert_eq!(RuleTarget::parse("LIKES:abc"), RuleTarget::InvalidLikeStep);
        assert_eq!(RuleTarget::parse("LIKES:25"), RuleTarget::LikeStep(25));
    }
}
