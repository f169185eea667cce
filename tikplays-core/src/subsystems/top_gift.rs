use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use tikplays_common::models::{GiftEvent, OverlayEvent, TopGiftRecord};
use tikplays_common::traits::StateBroadcaster;

use crate::persistence::{load_with, save_document};

const FALLBACK_GIFT_NAME: &str = "Regalo";

/// High-water mark of the most valuable single gift. Only a profile switch
/// resets it, by loading the other profile's record.
pub struct TopGiftTracker {
    record: TopGiftRecord,
    path: PathBuf,
    broadcaster: Arc<dyn StateBroadcaster>,
}

impl TopGiftTracker {
    pub fn load(path: PathBuf, broadcaster: Arc<dyn StateBroadcaster>) -> Self {
        let record = load_with(&path, TopGiftRecord::from_value);
        Self {
            record,
            path,
            broadcaster,
        }
    }

    pub fn record(&self) -> &TopGiftRecord {
        &self.record
    }

    /// Returns whether `gift` became the new record.
    pub fn observe(&mut self, gift: &GiftEvent) -> bool {
        if gift.coins_per_unit <= self.record.coins {
            return false;
        }
        self.record = TopGiftRecord {
            diamond_count: gift.coins_per_unit,
            gift_name: if gift.gift_name.is_empty() { FALLBACK_GIFT_NAME.to_string() } else { gift.gift_name.clone() },
            gift_image: gift.gift_image.clone(),
            username: if gift.display_name.is_empty() { gift.user_id.clone() } else { gift.display_name.clone() },
            coins: gift.coins_per_unit,
        };
        info!("New top gift: {} ({} coins) from {}", self.record.gift_name, self.record.coins, self.record.username);
        save_document(&self.path, &self.record);
        self.broadcast();
        true
    }

    pub fn broadcast(&self) {
        self.broadcaster.broadcast(OverlayEvent::TopGiftUpdate(self.record.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventbus::EventBus;
    use tempfile::TempDir;

    fn gift(coins: u64, quantity: u64) -> GiftEvent {
        GiftEvent {
            gift_id: "1".into(),
            user_id: "alice".into(),
            display_name: String::new(),
            avatar: String::new(),
            quantity,
            coins_per_unit: coins,
            gift_name: String::new(),
            gift_image: String::new(),
        }
    }

    #[test]
    fn only_strictly_higher_unit_value_replaces_record() {
        let dir = TempDir::new().unwrap();
        let mut top = TopGiftTracker::load(dir.path().join("topGift.json"), Arc::new(EventBus::new()));

        assert!(top.observe(&gift(10, 1)));
        assert!(!top.observe(&gift(10, 50)));
        assert!(!top.observe(&gift(5, 100)));
        assert!(top.observe(&gift(11, 1)));

        assert_eq!(top.record().coins, 11);
        assert_eq!(top.record().username, "alice");
        assert_eq!(top.record().gift_name, FALLBACK_GIFT_NAME);
    }
}
