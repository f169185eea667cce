//! Cumulative coin leaderboard.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use tikplays_common::models::{CoinBoardSnapshot, CoinBoardState, LeaderboardConfigPatch, LeaderboardEntry, OverlayEvent};
use tikplays_common::traits::StateBroadcaster;

use crate::persistence::{load_with, save_document};

pub struct CoinLeaderboard {
    state: CoinBoardState,
    path: PathBuf,
    broadcaster: Arc<dyn StateBroadcaster>,
}

impl CoinLeaderboard {
    pub fn load(path: PathBuf, broadcaster: Arc<dyn StateBroadcaster>) -> Self {
        let state = load_with(&path, CoinBoardState::from_value);
        Self::with_state(state, path, broadcaster)
    }

    pub fn with_state(state: CoinBoardState, path: PathBuf, broadcaster: Arc<dyn StateBroadcaster>) -> Self {
        Self {
            state,
            path,
            broadcaster,
        }
    }

    pub fn state(&self) -> &CoinBoardState {
        &self.state
    }

    pub fn on_gift(&mut self, user_id: &str, display_name: &str, avatar: &str, coins_per_gift: u64, quantity: u64) {
        let inc = coins_per_gift.saturating_mul(quantity.max(1));
        if inc == 0 || user_id.is_empty() {
            return;
        }

        let entry = self
            .state
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| LeaderboardEntry {
                id: user_id.to_string(),
                name: if display_name.is_empty() { user_id.to_string() } else { display_name.to_string() },
                avatar: String::new(),
                coins: 0,
            });
        if !display_name.is_empty() && entry.name != display_name {
            entry.name = display_name.to_string();
        }
        if !avatar.is_empty() && entry.avatar != avatar {
            entry.avatar = avatar.to_string();
        }
        entry.coins = entry.coins.saturating_add(inc);

        self.commit();
    }

    /// Top `topN` by coins, descending. Ties keep user-id order.
    pub fn ranked(&self) -> Vec<LeaderboardEntry> {
        let mut rows: Vec<LeaderboardEntry> = self.state.users.values().cloned().collect();
        rows.sort_by(|a, b| b.coins.cmp(&a.coins));
        rows.truncate(self.state.config.top_n.max(1));
        rows
    }

    pub fn snapshot(&self) -> CoinBoardSnapshot {
        CoinBoardSnapshot {
            title: self.state.config.title.clone(),
            unit: self.state.config.unit.clone(),
            coin_icon_url: self.state.config.coin_icon_url.clone(),
            rows: self.ranked(),
        }
    }

    pub fn on_disconnect(&mut self) {
        if self.state.config.reset_on_disconnect {
            info!("Coin board cleared on disconnect");
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.state.users.clear();
        self.commit();
    }

    pub fn configure(&mut self, patch: &LeaderboardConfigPatch) {
        patch.apply(&mut self.state.config);
        self.commit();
    }

    pub fn broadcast(&self) {
        self.broadcaster.broadcast(OverlayEvent::CoinBoard(self.snapshot()));
    }

    fn commit(&self) {
        save_document(&self.path, &self.state);
        self.broadcast();
    }
}
