//! Turns raw gift events into incremental [`GiftEvent`]s.
//!
//! Streak ("combo") gifts are reported with a running repeat count; only the
//! growth since the previous report for the same `(user, gift)` is credited.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use tikplays_common::models::{GiftCatalog, GiftEvent, RawGift};

pub const DEFAULT_STREAK_CAPACITY: usize = 4096;
pub const DEFAULT_STREAK_IDLE: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy)]
struct StreakEntry {
    last_seen: u64,
    touched: Instant,
}

/// Bounded map of in-flight combos, scoped to one live connection.
#[derive(Debug)]
pub struct StreakTracker {
    entries: HashMap<(String, String), StreakEntry>,
    capacity: usize,
    idle_timeout: Duration,
}

impl StreakTracker {
    pub fn new(capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            idle_timeout,
        }
    }

    /// Records `current` for the combo and returns the units not yet credited.
    /// The stored count never goes down, so late out-of-order reports credit
    /// nothing.
    pub fn advance(&mut self, user_id: &str, gift_id: &str, current: u64, now: Instant) -> u64 {
        let key = (user_id.to_string(), gift_id.to_string());
        if !self.entries.contains_key(&key) {
            self.make_room(now);
        }
        let entry = self.entries.entry(key).or_insert(StreakEntry {
            last_seen: 0,
            touched: now,
        });
        let delta = current.saturating_sub(entry.last_seen);
        entry.last_seen = entry.last_seen.max(current);
        entry.touched = now;
        delta
    }

    pub fn end(&mut self, user_id: &str, gift_id: &str) {
        self.entries.remove(&(user_id.to_string(), gift_id.to_string()));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn make_room(&mut self, now: Instant) {
        let idle = self.idle_timeout;
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.touched) <= idle);
        if before != self.entries.len() {
            debug!("StreakTracker: evicted {} idle combo(s)", before - self.entries.len());
        }

        if self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.touched)
                .map(|(k, _)| k.clone());
            if let Some(key) = oldest {
                debug!("StreakTracker: full, evicting combo {}:{}", key.0, key.1);
                self.entries.remove(&key);
            }
        }
    }
}

impl Default for StreakTracker {
    fn default() -> Self {
        Self::new(DEFAULT_STREAK_CAPACITY, DEFAULT_STREAK_IDLE)
    }
}

#[derive(Debug, Default)]
pub struct EventNormalizer {
    streaks: StreakTracker,
}

impl EventNormalizer {
    pub fn new(streaks: StreakTracker) -> Self {
        Self { streaks }
    }

    pub fn normalize(&mut self, raw: &RawGift, catalog: &GiftCatalog) -> Option<GiftEvent> {
        self.normalize_at(raw, catalog, Instant::now())
    }

    pub fn normalize_at(&mut self, raw: &RawGift, catalog: &GiftCatalog, now: Instant) -> Option<GiftEvent> {
        let user_id = raw.user_id();
        let count = raw.repeat_count();

        let quantity = if raw.is_streak() {
            let delta = self.streaks.advance(&user_id, &raw.gift_id, count, now);
            if raw.repeat_end {
                self.streaks.end(&user_id, &raw.gift_id);
                debug!("Streak {}:{} ended at x{}", user_id, raw.gift_id, count);
            }
            if delta == 0 {
                trace!("Streak {}:{} at x{} credits nothing", user_id, raw.gift_id, count);
                return None;
            }
            delta
        } else {
            count
        };

        let info = catalog.get(&raw.gift_id);
        let coins_per_unit = info
            .map(|g| g.diamond_count)
            .filter(|c| *c > 0)
            .or(raw.diamond_count)
            .unwrap_or(0);
        let gift_name = info
            .map(|g| g.name.clone())
            .filter(|n| !n.is_empty())
            .or_else(|| raw.gift_name.clone())
            .unwrap_or_default();

        Some(GiftEvent {
            gift_id: raw.gift_id.clone(),
            display_name: raw.display_name(),
            avatar: raw.avatar(),
            user_id,
            quantity,
            coins_per_unit,
            gift_name,
            gift_image: info.map(|g| g.image.clone()).unwrap_or_default(),
        })
    }

    /// The live connection closed; in-flight combos will never end.
    pub fn reset_streaks(&mut self) {
        self.streaks.clear();
    }

    pub fn tracked_streaks(&self) -> usize {
        self.streaks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn streak_tick(count: u64, end: bool) -> RawGift {
        serde_json::from_value(json!({
            "giftId": 5655,
            "uniqueId": "alice",
            "repeatCount": count,
            "repeatEnd": end,
            "giftType": 1,
            "diamondCount": 1
        }))
        .unwrap()
    }

    #[test]
    fn streak_sequence_credits_deltas_only() {
        let mut norm = EventNormalizer::default();
        let catalog = GiftCatalog::default();
        let now = Instant::now();

        let emitted: Vec<Option<u64>> = [(1, false), (3, false), (3, false), (7, true)]
            .into_iter()
            .map(|(c, end)| norm.normalize_at(&streak_tick(c, end), &catalog, now).map(|g| g.quantity))
            .collect();

        assert_eq!(emitted, vec![Some(1), Some(2), None, Some(4)]);
        assert_eq!(emitted.iter().flatten().sum::<u64>(), 7);
        assert_eq!(norm.tracked_streaks(), 0);
    }

    #[test]
    fn out_of_order_report_never_over_credits() {
        let mut norm = EventNormalizer::default();
        let catalog = GiftCatalog::default();
        let now = Instant::now();

        let total: u64 = [(5, false), (3, false), (5, true)]
            .into_iter()
            .filter_map(|(c, end)| norm.normalize_at(&streak_tick(c, end), &catalog, now))
            .map(|g| g.quantity)
            .sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn single_gift_uses_repeat_count_and_catalog_value() {
        let mut norm = EventNormalizer::default();
        let catalog: GiftCatalog = serde_json::from_value(json!({
            "5001": {"name": "Rosa", "image": "/rosa.png", "diamondCount": 5}
        }))
        .unwrap();
        let raw: RawGift = serde_json::from_value(json!({
            "giftId": "5001", "uniqueId": "bob", "nickname": "Bobby", "repeatCount": 3
        }))
        .unwrap();

        let gift = norm.normalize(&raw, &catalog).unwrap();
        assert_eq!(gift.quantity, 3);
        assert_eq!(gift.coins_per_unit, 5);
        assert_eq!(gift.total_coins(), 15);
        assert_eq!(gift.gift_name, "Rosa");
        assert_eq!(gift.display_name, "Bobby");
        assert_eq!(norm.tracked_streaks(), 0);
    }

    #[test]
    fn single_gift_with_bad_repeat_counts_as_one() {
        let mut norm = EventNormalizer::default();
        let raw: RawGift = serde_json::from_value(json!({"giftId": 1, "repeatCount": -4})).unwrap();
        let gift = norm.normalize(&raw, &GiftCatalog::default()).unwrap();
        assert_eq!(gift.quantity, 1);
        assert_eq!(gift.user_id, "anon");
    }

    #[test]
    fn tracker_evicts_idle_then_oldest() {
        let mut tracker = StreakTracker::new(2, Duration::from_secs(10));
        let t0 = Instant::now();
        tracker.advance("a", "1", 2, t0);
        tracker.advance("b", "1", 2, t0 + Duration::from_secs(5));
        assert_eq!(tracker.len(), 2);

        // "a" is idle by now and gets dropped before the new combo is stored.
        tracker.advance("c", "1", 1, t0 + Duration::from_secs(12));
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.advance("a", "1", 2, t0 + Duration::from_secs(13)), 2);

        // That insert found the map full with nothing idle, so the least
        // recently touched combo ("b") went and restarts from zero.
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.advance("b", "1", 3, t0 + Duration::from_secs(14)), 3);
    }
}
