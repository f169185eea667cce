//! Two-sided gift battle.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::trace;

use tikplays_common::models::{BattleConfig, BattleState, OverlayEvent};
use tikplays_common::traits::StateBroadcaster;

use crate::persistence::{load_with, save_document};

pub struct BattleScorer {
    state: BattleState,
    path: PathBuf,
    broadcaster: Arc<dyn StateBroadcaster>,
}

impl BattleScorer {
    pub fn load(path: PathBuf, broadcaster: Arc<dyn StateBroadcaster>) -> Self {
        let state = load_with(&path, BattleState::from_value);
        Self::with_state(state, path, broadcaster)
    }

    pub fn with_state(state: BattleState, path: PathBuf, broadcaster: Arc<dyn StateBroadcaster>) -> Self {
        Self {
            state,
            path,
            broadcaster,
        }
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    /// Credits each side whose gift set contains `gift_id`. A gift listed on
    /// both sides credits both.
    pub fn on_gift(&mut self, gift_id: &str, quantity: u64, coins_per_gift: u64) {
        if !self.state.is_configured() {
            return;
        }
        let points = coins_per_gift as f64 * self.state.points_per_coin * quantity.max(1) as f64;

        let mut touched = false;
        if self.state.left.gifts.contains(gift_id) {
            self.state.left.points += points;
            touched = true;
        }
        if self.state.right.gifts.contains(gift_id) {
            self.state.right.points += points;
            touched = true;
        }
        if touched {
            trace!("Battle: gift {} worth {} points", gift_id, points);
            self.commit();
        }
    }

    /// Zeroes both totals; configuration is kept.
    pub fn reset(&mut self) {
        self.state.left.points = 0.0;
        self.state.right.points = 0.0;
        self.commit();
    }

    pub fn configure(&mut self, config: &BattleConfig) {
        self.state.apply_config(config);
        self.commit();
    }

    pub fn broadcast(&self) {
        self.broadcaster.broadcast(OverlayEvent::GiftBattle(self.state.snapshot()));
    }

    fn commit(&self) {
        save_document(&self.path, &self.state);
        self.broadcast();
    }
}
