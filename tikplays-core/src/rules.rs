//! Rule book: the sanitized, per-profile map from target id to [`ActionRule`],
//! plus the lookups the engine needs for gifts, like steps and follows.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use tikplays_common::models::rule::FOLLOW_TARGET;
use tikplays_common::models::{ActionRule, RawRuleMap, RuleTarget};

/// One crossed multiple of a `LIKES:<step>` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeCrossing {
    pub target_id: String,
    pub step: u64,
    /// 1-based multiple of `step` that was crossed.
    pub bucket: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: BTreeMap<String, ActionRule>,
}

impl RuleBook {
    pub fn from_raw(raw: &RawRuleMap) -> Self {
        let mut rules = BTreeMap::new();
        for (target_id, entry) in raw {
            match ActionRule::from_entry(target_id, entry) {
                Some(rule) => {
                    if rule.target == RuleTarget::InvalidLikeStep {
                        warn!("Rule '{}' has no usable like step; it will never fire", target_id);
                    }
                    rules.insert(rule.target_id.clone(), rule);
                }
                None => debug!("Dropping empty rule entry '{}'", target_id),
            }
        }
        Self { rules }
    }

    pub fn to_raw(&self) -> RawRuleMap {
        self.rules
            .iter()
            .map(|(id, rule)| (id.clone(), rule.to_raw()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, target_id: &str) -> Option<&ActionRule> {
        self.rules.get(target_id)
    }

    pub fn resolve_for_gift(&self, gift_id: &str) -> Option<&ActionRule> {
        self.rules
            .get(gift_id)
            .filter(|r| matches!(r.target, RuleTarget::Gift(_)))
    }

    pub fn resolve_follow(&self) -> Option<&ActionRule> {
        self.rules.get(FOLLOW_TARGET)
    }

    /// Every multiple of every configured like step passed when the like
    /// total moves from `prev_total` to `new_total`. Firings are ordered by
    /// step, then bucket.
    pub fn resolve_like_crossings(&self, prev_total: u64, new_total: u64) -> Vec<LikeCrossing> {
        if new_total == 0 || new_total <= prev_total {
            return Vec::new();
        }

        let mut steps: Vec<(u64, &str)> = self
            .rules
            .values()
            .filter_map(|r| match r.target {
                RuleTarget::LikeStep(step) => Some((step, r.target_id.as_str())),
                _ => None,
            })
            .collect();
        steps.sort();

        let mut out = Vec::new();
        for (step, target_id) in steps {
            let prev_bucket = prev_total / step;
            let new_bucket = new_total / step;
            for bucket in (prev_bucket + 1)..=new_bucket {
                out.push(LikeCrossing {
                    target_id: target_id.to_string(),
                    step,
                    bucket,
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn book(raw: serde_json::Value) -> RuleBook {
        let map: RawRuleMap = serde_json::from_value(raw).unwrap();
        RuleBook::from_raw(&map)
    }

    #[test]
    fn like_burst_fires_every_crossed_bucket_in_order() {
        let rules = book(json!({"LIKES:100": {"key": "space"}}));
        let fired = rules.resolve_like_crossings(95, 240);
        let buckets: Vec<u64> = fired.iter().map(|c| c.bucket).collect();
        assert_eq!(buckets, vec![1, 2]);
        assert!(fired.iter().all(|c| c.step == 100 && c.target_id == "LIKES:100"));
    }

    #[test]
    fn no_crossings_without_progress() {
        let rules = book(json!({"LIKES:10": "http://hook"}));
        assert!(rules.resolve_like_crossings(0, 0).is_empty());
        assert!(rules.resolve_like_crossings(11, 19).is_empty());
        assert!(rules.resolve_like_crossings(30, 20).is_empty());
        assert_eq!(rules.resolve_like_crossings(19, 20).len(), 1);
    }

    #[test]
    fn multiple_steps_are_ordered_by_step() {
        let rules = book(json!({
            "LIKES:100": {"key": "a"},
            "LIKES:25": {"key": "b"},
            "LIKES:abc": {"key": "c"},
            "LIKES:0": {"key": "d"}
        }));
        let fired: Vec<(u64, u64)> = rules
            .resolve_like_crossings(90, 110)
            .into_iter()
            .map(|c| (c.step, c.bucket))
            .collect();
        assert_eq!(fired, vec![(25, 4), (100, 1)]);
    }

    #[test]
    fn gift_and_follow_lookups() {
        let rules = book(json!({
            "5655": "https://example.com/rose",
            "FOLLOW": {"soundUrl": "/follow.mp3"},
            "LIKES:50": {"key": "up"},
            "": "https://ignored",
            "7": {}
        }));
        assert_eq!(rules.len(), 3);
        assert!(rules.resolve_for_gift("5655").is_some());
        assert!(rules.resolve_for_gift("FOLLOW").is_none());
        assert!(rules.resolve_for_gift("LIKES:50").is_none());
        assert!(rules.resolve_for_gift("7").is_none());
        assert!(rules.resolve_follow().is_some());
    }

    #[test]
    fn raw_round_trip_uses_canonical_shape() {
        let rules = book(json!({"5655": "https://example.com/rose"}));
        let raw = rules.to_raw();
        assert_eq!(raw["5655"]["webhook"], "https://example.com/rose");
    }
}
