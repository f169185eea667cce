//! The engine: sole owner of all per-profile state.
//!
//! Live events, operator commands and countdown ticks are applied one at a
//! time from a single task, so no subsystem needs locking. Side effects are
//! handed to the dispatcher and never awaited here.

pub mod bundle;
pub mod commands;
pub mod handle;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use tikplays_common::Error;
use tikplays_common::models::overlay::NewGift;
use tikplays_common::models::{GiftEvent, LiveEvent, OverlayEvent, RawGift};
use tikplays_common::traits::{ProfileStore, StateBroadcaster};

use crate::normalizer::{DEFAULT_STREAK_CAPACITY, DEFAULT_STREAK_IDLE, EventNormalizer, StreakTracker};
use crate::services::{ActionDispatcher, ActionServices, Dispatched, Trigger};
use crate::tasks::CountdownTick;

pub use bundle::{EngineSnapshot, StateBundle};
pub use commands::{BattleCommand, CoinBoardCommand, CommandReply, OperatorCommand, TestGift, WinsCommand};
pub use handle::{EngineHandle, EngineInput};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub streak_capacity: usize,
    pub streak_idle_timeout: Duration,
    /// Process-level command sink base, used when the profile sets no host.
    pub server_tap_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            streak_capacity: DEFAULT_STREAK_CAPACITY,
            streak_idle_timeout: DEFAULT_STREAK_IDLE,
            server_tap_url: None,
        }
    }
}

pub struct Engine {
    profiles: Arc<dyn ProfileStore>,
    broadcaster: Arc<dyn StateBroadcaster>,
    normalizer: EventNormalizer,
    dispatcher: ActionDispatcher,
    bundle: StateBundle,
    server_tap_url: Option<String>,
    tick_tx: mpsc::UnboundedSender<CountdownTick>,
    tick_rx: Option<mpsc::UnboundedReceiver<CountdownTick>>,
}

impl Engine {
    /// Loads the active profile. Must be called inside a Tokio runtime: a
    /// countdown persisted as running starts ticking immediately.
    pub fn new(profiles: Arc<dyn ProfileStore>, services: ActionServices, config: EngineConfig) -> Self {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let broadcaster = services.broadcaster.clone();

        let mut bundle = StateBundle::load(profiles.as_ref(), broadcaster.clone(), tick_tx.clone());
        bundle.countdown.resume();

        let base = bundle.prefs.server_tap_base(config.server_tap_url.as_deref());
        let dispatcher = ActionDispatcher::new(services, base);

        Self {
            profiles,
            broadcaster,
            normalizer: EventNormalizer::new(StreakTracker::new(config.streak_capacity, config.streak_idle_timeout)),
            dispatcher,
            bundle,
            server_tap_url: config.server_tap_url,
            tick_tx,
            tick_rx: Some(tick_rx),
        }
    }

    pub fn bundle(&self) -> &StateBundle {
        &self.bundle
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn tracked_streaks(&self) -> usize {
        self.normalizer.tracked_streaks()
    }

    /// Applies one live event. Returns the dispatches it started; callers
    /// other than tests simply drop them.
    pub fn handle_live(&mut self, event: LiveEvent) -> Vec<Dispatched> {
        match event {
            LiveEvent::Gift(raw) => match self.normalizer.normalize(&raw, &self.bundle.catalog) {
                Some(gift) => self.handle_gift(gift),
                None => Vec::new(),
            },
            LiveEvent::Like { like_count } => self.handle_likes(LiveEvent::like_increment(like_count.as_ref())),
            LiveEvent::Follow {} => self.handle_follow(),
            LiveEvent::Chat { unique_id, comment } => {
                trace!("chat from {:?}: {:?}", unique_id, comment);
                Vec::new()
            }
            LiveEvent::Disconnected => {
                info!("Live connection closed; dropping {} open streak(s)", self.normalizer.tracked_streaks());
                self.normalizer.reset_streaks();
                self.bundle.coin_board.on_disconnect();
                Vec::new()
            }
        }
    }

    pub fn handle_gift(&mut self, gift: GiftEvent) -> Vec<Dispatched> {
        let mut started = Vec::new();
        if let Some(rule) = self.bundle.rules.resolve_for_gift(&gift.gift_id) {
            let trigger = Trigger::Gift {
                gift_id: gift.gift_id.clone(),
                user_id: gift.user_id.clone(),
                quantity: gift.quantity,
            };
            self.log_rule(&rule.target_id, &trigger);
            started.push(self.dispatcher.dispatch(rule, trigger));
        }

        self.broadcaster.broadcast(OverlayEvent::NewGift(NewGift {
            gift_id: gift.gift_id.clone(),
            username: gift.user_id.clone(),
            quantity: gift.quantity,
        }));

        let b = &mut self.bundle;
        b.countdown.on_gift_add_seconds(gift.coins_per_unit, gift.quantity);
        b.battle.on_gift(&gift.gift_id, gift.quantity, gift.coins_per_unit);
        b.coin_board
            .on_gift(&gift.user_id, &gift.display_name, &gift.avatar, gift.coins_per_unit, gift.quantity);
        b.top_gift.observe(&gift);
        started
    }

    fn handle_likes(&mut self, count: u64) -> Vec<Dispatched> {
        let (prev, now) = self.bundle.goals.add_likes(count);
        let mut started = Vec::new();
        for crossing in self.bundle.rules.resolve_like_crossings(prev, now) {
            let Some(rule) = self.bundle.rules.get(&crossing.target_id) else {
                continue;
            };
            let trigger = Trigger::LikeStep {
                step: crossing.step,
                bucket: crossing.bucket,
            };
            self.log_rule(&rule.target_id, &trigger);
            started.push(self.dispatcher.dispatch(rule, trigger));
        }
        started
    }

    fn handle_follow(&mut self) -> Vec<Dispatched> {
        self.bundle.goals.add_follower();
        match self.bundle.rules.resolve_follow() {
            Some(rule) => {
                self.log_rule(&rule.target_id, &Trigger::Follow);
                vec![self.dispatcher.dispatch(rule, Trigger::Follow)]
            }
            None => Vec::new(),
        }
    }

    fn log_rule(&self, target_id: &str, trigger: &Trigger) {
        info!("Rule '{}' fired by {}", target_id, trigger.describe());
        self.broadcaster
            .broadcast(OverlayEvent::Log(format!("[RULE] {} <- {}", target_id, trigger.describe())));
    }

    pub fn handle_tick(&mut self, tick: CountdownTick) {
        self.bundle.countdown.on_tick(tick);
    }

    /// Replaces the whole state bundle with the active profile's.
    fn reload(&mut self) {
        self.bundle.countdown.detach();
        self.bundle = StateBundle::load(self.profiles.as_ref(), self.broadcaster.clone(), self.tick_tx.clone());
        self.dispatcher
            .set_command_base(self.bundle.prefs.server_tap_base(self.server_tap_url.as_deref()));
        self.bundle.countdown.resume();
        self.bundle.broadcast_all();
    }

    pub fn switch_profile(&mut self, id: &str) -> Result<CommandReply, Error> {
        let index = self.profiles.switch(id)?;
        self.reload();
        Ok(CommandReply::Profiles(index))
    }

    pub fn execute(&mut self, command: OperatorCommand) -> Result<CommandReply, Error> {
        debug!("Operator command: {:?}", command);
        let reply = match command {
            OperatorCommand::Countdown { action, config } => {
                let countdown = &mut self.bundle.countdown;
                if let Some(config) = config {
                    countdown.configure(&config);
                }
                if let Some(action) = action {
                    countdown.apply(action);
                }
                CommandReply::Countdown(countdown.state().clone())
            }
            OperatorCommand::Battle(cmd) => {
                let battle = &mut self.bundle.battle;
                match cmd {
                    BattleCommand::Reset => battle.reset(),
                    BattleCommand::Configure(config) => battle.configure(&config),
                }
                CommandReply::Battle(battle.state().snapshot())
            }
            OperatorCommand::CoinBoard(cmd) => {
                let board = &mut self.bundle.coin_board;
                match cmd {
                    CoinBoardCommand::Reset => board.reset(),
                    CoinBoardCommand::Configure(patch) => board.configure(&patch),
                }
                CommandReply::CoinBoard(board.snapshot())
            }
            OperatorCommand::Wins(cmd) => {
                let wins = &mut self.bundle.wins;
                match cmd {
                    WinsCommand::Inc => wins.inc(),
                    WinsCommand::Dec => wins.dec(),
                    WinsCommand::Reset => wins.reset(),
                    WinsCommand::Set(n) => wins.set_wins(n),
                    WinsCommand::Configure(config) => wins.configure(&config),
                }
                CommandReply::Wins(wins.state().clone())
            }
            OperatorCommand::SetGoals(raw) => {
                self.bundle.goals.set(&raw);
                CommandReply::Goals(*self.bundle.goals.state())
            }
            OperatorCommand::SetPrefs(patch) => {
                let prefs = self.bundle.update_prefs(&patch).clone();
                self.dispatcher
                    .set_command_base(prefs.server_tap_base(self.server_tap_url.as_deref()));
                CommandReply::Prefs(prefs)
            }
            OperatorCommand::SetRules(raw) => CommandReply::Rules(self.bundle.set_rules(&raw)),
            OperatorCommand::GetRules => CommandReply::Rules(self.bundle.rules.to_raw()),
            OperatorCommand::SetGiftCatalog(gifts) => {
                self.bundle.set_catalog(gifts);
                CommandReply::Catalog(self.bundle.catalog.clone())
            }
            OperatorCommand::TestGift(test) => {
                let raw = RawGift {
                    gift_id: test.gift_id,
                    unique_id: Some(test.username),
                    nickname: test.display_name,
                    repeat_count: Some(test.quantity.into()),
                    profile_picture_url: test.avatar,
                    ..Default::default()
                };
                self.handle_live(LiveEvent::Gift(raw));
                CommandReply::Snapshot(Box::new(self.bundle.snapshot()))
            }
            OperatorCommand::Snapshot => CommandReply::Snapshot(Box::new(self.bundle.snapshot())),
            OperatorCommand::ListProfiles => CommandReply::Profiles(self.profiles.list()),
            OperatorCommand::CreateProfile { name } => CommandReply::Profile(self.profiles.create(&name)?),
            OperatorCommand::RenameProfile { id, name } => CommandReply::Profile(self.profiles.rename(&id, &name)?),
            OperatorCommand::SwitchProfile { id } => return self.switch_profile(&id),
            OperatorCommand::DeleteProfile { id } => {
                let before = self.profiles.active_id();
                let index = self.profiles.delete(&id)?;
                if index.active != before {
                    self.reload();
                }
                CommandReply::Profiles(index)
            }
            OperatorCommand::ExportProfile { id } => {
                let id = id.unwrap_or_else(|| self.profiles.active_id());
                CommandReply::Bundle(self.profiles.export(&id)?)
            }
            OperatorCommand::ImportProfile(bundle) => CommandReply::Profile(self.profiles.import(bundle)?),
        };
        Ok(reply)
    }

    fn handle_input(&mut self, input: EngineInput) {
        match input {
            EngineInput::Live(event) => {
                trace!("live event: {}", event.event_type());
                // Dispatched side effects run detached.
                drop(self.handle_live(event));
            }
            EngineInput::Command { command, reply } => {
                let result = self.execute(command);
                if let Err(e) = &result {
                    warn!("Operator command failed: {} ({})", e, e.code());
                }
                let _ = reply.send(result);
            }
        }
    }

    /// Runs until every [`EngineHandle`] is dropped.
    pub async fn run(mut self, mut inbox: mpsc::Receiver<EngineInput>) {
        let Some(mut ticks) = self.tick_rx.take() else {
            warn!("Engine::run called twice");
            return;
        };
        info!("Engine running on profile '{}'", self.bundle.profile_id);

        loop {
            tokio::select! {
                input = inbox.recv() => match input {
                    Some(input) => self.handle_input(input),
                    None => break,
                },
                Some(tick) = ticks.recv() => self.handle_tick(tick),
            }
        }

        self.bundle.countdown.detach();
        info!("Engine stopped");
    }

    /// Spawns [`Engine::run`] and returns the handle to feed it.
    pub fn spawn(self, buffer: usize) -> (EngineHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let task = tokio::spawn(self.run(rx));
        (EngineHandle::new(tx), task)
    }
}
