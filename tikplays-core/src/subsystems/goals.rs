//! Like and follower goals. Like totals also feed the like-step rules.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use tikplays_common::models::{GoalState, OverlayEvent};
use tikplays_common::traits::StateBroadcaster;

use crate::persistence::{load_with, save_document};

pub struct GoalTracker {
    state: GoalState,
    path: PathBuf,
    broadcaster: Arc<dyn StateBroadcaster>,
}

impl GoalTracker {
    pub fn load(path: PathBuf, broadcaster: Arc<dyn StateBroadcaster>) -> Self {
        let state = load_with(&path, GoalState::from_value);
        Self {
            state,
            path,
            broadcaster,
        }
    }

    pub fn state(&self) -> &GoalState {
        &self.state
    }

    /// Adds likes and returns `(previous, new)` like totals.
    pub fn add_likes(&mut self, count: u64) -> (u64, u64) {
        let prev = self.state.likes.current;
        self.state.likes.current = prev.saturating_add(count);
        save_document(&self.path, &self.state);
        self.broadcaster.broadcast(OverlayEvent::LikeProgress(self.state.likes));
        (prev, self.state.likes.current)
    }

    pub fn add_follower(&mut self) -> u64 {
        self.state.followers.current = self.state.followers.current.saturating_add(1);
        save_document(&self.path, &self.state);
        self.broadcaster
            .broadcast(OverlayEvent::FollowersProgress(self.state.followers));
        self.state.followers.current
    }

    /// Replaces both goals from an operator document; invalid fields fall
    /// back to defaults.
    pub fn set(&mut self, raw: &Value) {
        self.state = GoalState::from_value(raw);
        save_document(&self.path, &self.state);
        self.broadcast();
    }

    pub fn broadcast(&self) {
        self.broadcaster.broadcast(OverlayEvent::Goals(self.state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventbus::EventBus;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn likes_report_previous_and_new_totals() {
        let dir = TempDir::new().unwrap();
        let mut goals = GoalTracker::load(dir.path().join("goals.json"), Arc::new(EventBus::new()));
        goals.set(&json!({"likes": {"target": 500, "current": 95}}));
        assert_eq!(goals.add_likes(145), (95, 240));
        assert_eq!(goals.state().likes.target, 500);
        assert_eq!(goals.state().followers.target, 10);
        assert_eq!(goals.add_follower(), 1);
    }
}
