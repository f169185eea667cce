//! Coin-driven countdown timer.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use tikplays_common::models::{AddSource, CountdownAction, CountdownAdded, CountdownConfig, CountdownState, OverlayEvent};
use tikplays_common::traits::StateBroadcaster;

use crate::persistence::{load_with, save_document};
use crate::tasks::{CountdownTick, TickSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownPhase {
    Idle,
    Paused,
    Running,
}

pub struct CountdownTimer {
    state: CountdownState,
    path: PathBuf,
    ticker: TickSource,
    broadcaster: Arc<dyn StateBroadcaster>,
}

impl CountdownTimer {
    /// Loads the persisted state. A timer saved as running is not ticking
    /// yet; call [`CountdownTimer::resume`].
    pub fn load(path: PathBuf, ticker: TickSource, broadcaster: Arc<dyn StateBroadcaster>) -> Self {
        let state = load_with(&path, CountdownState::from_value);
        Self::with_state(state, path, ticker, broadcaster)
    }

    pub fn with_state(
        state: CountdownState,
        path: PathBuf,
        ticker: TickSource,
        broadcaster: Arc<dyn StateBroadcaster>,
    ) -> Self {
        Self {
            state,
            path,
            ticker,
            broadcaster,
        }
    }

    pub fn state(&self) -> &CountdownState {
        &self.state
    }

    pub fn phase(&self) -> CountdownPhase {
        if self.state.running {
            CountdownPhase::Running
        } else if self.state.seconds_left > 0 {
            CountdownPhase::Paused
        } else {
            CountdownPhase::Idle
        }
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    /// Restarts the tick task if the loaded state says the timer is running.
    pub fn resume(&mut self) {
        if self.state.running && self.ticker.ensure_started() {
            info!("Countdown resumed at {}s", self.state.seconds_left);
        }
    }

    /// Stops ticking without touching the state; used when this timer is
    /// being replaced.
    pub fn detach(&mut self) {
        self.ticker.stop();
    }

    pub fn start(&mut self) {
        self.state.running = true;
        self.ticker.ensure_started();
        self.commit();
    }

    pub fn pause(&mut self) {
        self.state.running = false;
        self.ticker.stop();
        self.commit();
    }

    pub fn reset(&mut self) {
        self.state.running = false;
        self.state.seconds_left = 0;
        self.ticker.stop();
        self.commit();
    }

    /// Adds `seconds` in any phase, clamped to the cap, and emits the
    /// separate `countdown:add` notification.
    pub fn add(&mut self, seconds: u64, source: AddSource) {
        if seconds == 0 {
            return;
        }
        let next = self.state.seconds_left.saturating_add(seconds);
        self.state.seconds_left = self.state.clamp_to_max(next);
        self.commit();
        self.broadcaster.broadcast(OverlayEvent::CountdownAdd(CountdownAdded {
            amount: seconds,
            source,
            at: chrono::Utc::now().timestamp_millis(),
        }));
    }

    /// Overwrites the remaining time without changing the run state.
    pub fn set(&mut self, seconds: u64) {
        self.state.seconds_left = self.state.clamp_to_max(seconds);
        self.commit();
    }

    pub fn start_at(&mut self, seconds: u64) {
        self.state.seconds_left = self.state.clamp_to_max(seconds);
        self.start();
    }

    pub fn apply(&mut self, action: CountdownAction) {
        match action {
            CountdownAction::Start => self.start(),
            CountdownAction::Pause => self.pause(),
            CountdownAction::Reset => self.reset(),
            CountdownAction::Add { seconds } => self.add(seconds, AddSource::Manual),
            CountdownAction::Set { seconds } => self.set(seconds),
            CountdownAction::StartAt { seconds } => self.start_at(seconds),
        }
    }

    pub fn configure(&mut self, config: &CountdownConfig) {
        if let Some(spc) = config.seconds_per_coin {
            self.state.seconds_per_coin = spc;
        }
        if let Some(title) = &config.title {
            self.state.title = title.clone();
        }
        if let Some(max) = config.max_seconds {
            self.state.max_seconds = max;
            self.state.seconds_left = self.state.clamp_to_max(self.state.seconds_left);
        }
        if let Some(enabled) = config.enabled {
            self.state.enabled = enabled;
        }
        self.commit();
    }

    pub fn on_gift_add_seconds(&mut self, coins: u64, quantity: u64) {
        if !self.state.enabled {
            return;
        }
        let to_add = (coins as f64 * quantity as f64 * self.state.seconds_per_coin).round();
        if to_add >= 1.0 {
            self.add(to_add as u64, AddSource::Gift);
        }
    }

    /// Applies one tick. Ticks from a task this timer no longer owns are
    /// dropped. Returns whether the tick was applied.
    pub fn on_tick(&mut self, tick: CountdownTick) -> bool {
        if !self.ticker.is_current(tick) || !self.state.running {
            debug!("Countdown: ignoring stale tick gen {}", tick.generation);
            return false;
        }
        if self.state.seconds_left > 0 {
            self.state.seconds_left -= 1;
        }
        if self.state.seconds_left == 0 {
            self.state.running = false;
            self.ticker.stop();
            info!("Countdown reached zero");
        }
        self.commit();
        true
    }

    pub fn broadcast(&self) {
        self.broadcaster.broadcast(OverlayEvent::Countdown(self.state.clone()));
    }

    fn commit(&self) {
        save_document(&self.path, &self.state);
        self.broadcast();
    }
}
