//! Everything that belongs to one profile, loaded and replaced as a unit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use tikplays_common::models::{
    AvailableGift, BattleSnapshot, CoinBoardSnapshot, CountdownState, GiftCatalog, GiftInfo, GoalState, OverlayEvent,
    Prefs, RawRuleMap, TopGiftRecord, WinCounterState,
};
use tikplays_common::traits::{ProfileStore, StateBroadcaster};

use crate::persistence::{self, load_with, read_document, save_document};
use crate::rules::RuleBook;
use crate::subsystems::{BattleScorer, CoinLeaderboard, CountdownTimer, GoalTracker, TopGiftTracker, WinCounter};
use crate::tasks::{CountdownTick, TickSource};

/// Read-only view of every subsystem, for operator queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub profile: String,
    pub countdown: CountdownState,
    pub gift_battle: BattleSnapshot,
    pub coin_board: CoinBoardSnapshot,
    pub wins: WinCounterState,
    pub goals: GoalState,
    pub top_gift: TopGiftRecord,
    pub prefs: Prefs,
    pub rules: RawRuleMap,
}

pub struct StateBundle {
    pub profile_id: String,
    pub rules: RuleBook,
    pub catalog: GiftCatalog,
    pub prefs: Prefs,
    pub countdown: CountdownTimer,
    pub battle: BattleScorer,
    pub coin_board: CoinLeaderboard,
    pub wins: WinCounter,
    pub goals: GoalTracker,
    pub top_gift: TopGiftTracker,
    rules_path: PathBuf,
    catalog_path: PathBuf,
    prefs_path: PathBuf,
    broadcaster: Arc<dyn StateBroadcaster>,
}

fn load_rules(path: &Path) -> RuleBook {
    let raw: RawRuleMap = match read_document(path) {
        Some(Value::Object(map)) => map.into_iter().collect(),
        _ => RawRuleMap::new(),
    };
    RuleBook::from_raw(&raw)
}

/// Entries that fail to parse are dropped one by one.
fn load_catalog(raw: &Value) -> GiftCatalog {
    let map = raw
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter_map(|(id, v)| serde_json::from_value::<GiftInfo>(v.clone()).ok().map(|g| (id.clone(), g)))
                .collect()
        })
        .unwrap_or_default();
    GiftCatalog(map)
}

impl StateBundle {
    /// Loads the active profile's documents. Paths are resolved now and
    /// stay bound to this profile.
    pub fn load(
        profiles: &dyn ProfileStore,
        broadcaster: Arc<dyn StateBroadcaster>,
        ticks: UnboundedSender<CountdownTick>,
    ) -> Self {
        let profile_id = profiles.active_id();
        let path = |name: &str| profiles.resolve_path(name);

        let rules_path = path(persistence::RULES_FILE);
        let catalog_path = path(persistence::GIFT_CATALOG_FILE);
        let prefs_path = path(persistence::PREFS_FILE);

        let bundle = Self {
            rules: load_rules(&rules_path),
            catalog: load_with(&catalog_path, load_catalog),
            prefs: load_with(&prefs_path, Prefs::from_value),
            countdown: CountdownTimer::load(path(persistence::COUNTDOWN_FILE), TickSource::new(ticks), broadcaster.clone()),
            battle: BattleScorer::load(path(persistence::BATTLE_FILE), broadcaster.clone()),
            coin_board: CoinLeaderboard::load(path(persistence::COIN_BOARD_FILE), broadcaster.clone()),
            wins: WinCounter::load(path(persistence::WINS_FILE), broadcaster.clone()),
            goals: GoalTracker::load(path(persistence::GOALS_FILE), broadcaster.clone()),
            top_gift: TopGiftTracker::load(path(persistence::TOP_GIFT_FILE), broadcaster.clone()),
            profile_id,
            rules_path,
            catalog_path,
            prefs_path,
            broadcaster,
        };
        info!(
            "Loaded profile '{}': {} rule(s), {} catalog gift(s)",
            bundle.profile_id,
            bundle.rules.len(),
            bundle.catalog.0.len()
        );
        bundle
    }

    pub fn set_rules(&mut self, raw: &RawRuleMap) -> RawRuleMap {
        self.rules = RuleBook::from_raw(raw);
        let sanitized = self.rules.to_raw();
        save_document(&self.rules_path, &sanitized);
        sanitized
    }

    pub fn set_catalog(&mut self, gifts: Vec<AvailableGift>) {
        self.catalog = GiftCatalog::from_available(gifts);
        save_document(&self.catalog_path, &self.catalog);
        self.broadcaster.broadcast(OverlayEvent::GiftCatalog(self.catalog.clone()));
    }

    pub fn update_prefs(&mut self, patch: &Value) -> &Prefs {
        self.prefs.apply_patch(patch);
        save_document(&self.prefs_path, &self.prefs);
        &self.prefs
    }

    /// Pushes every subsystem's current state to observers.
    pub fn broadcast_all(&self) {
        self.countdown.broadcast();
        self.battle.broadcast();
        self.coin_board.broadcast();
        self.wins.broadcast();
        self.goals.broadcast();
        self.top_gift.broadcast();
        self.broadcaster.broadcast(OverlayEvent::GiftCatalog(self.catalog.clone()));
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            profile: self.profile_id.clone(),
            countdown: self.countdown.state().clone(),
            gift_battle: self.battle.state().snapshot(),
            coin_board: self.coin_board.snapshot(),
            wins: self.wins.state().clone(),
            goals: *self.goals.state(),
            top_gift: self.top_gift.record().clone(),
            prefs: self.prefs.clone(),
            rules: self.rules.to_raw(),
        }
    }
}
