use std::path::PathBuf;
use std::sync::Arc;

use tikplays_common::models::{OverlayEvent, WinCounterState, WinsConfig};
use tikplays_common::traits::StateBroadcaster;

use crate::persistence::{load_with, save_document};

/// Operator-driven win counter. Signed and never clamped.
pub struct WinCounter {
    state: WinCounterState,
    path: PathBuf,
    broadcaster: Arc<dyn StateBroadcaster>,
}

impl WinCounter {
    pub fn load(path: PathBuf, broadcaster: Arc<dyn StateBroadcaster>) -> Self {
        let state = load_with(&path, WinCounterState::from_value);
        Self {
            state,
            path,
            broadcaster,
        }
    }

    pub fn state(&self) -> &WinCounterState {
        &self.state
    }

    pub fn set_wins(&mut self, n: i64) {
        self.state.count = n;
        self.commit();
    }

    pub fn inc(&mut self) {
        self.set_wins(self.state.count.saturating_add(1));
    }

    pub fn dec(&mut self) {
        self.set_wins(self.state.count.saturating_sub(1));
    }

    pub fn reset(&mut self) {
        self.set_wins(0);
    }

    pub fn configure(&mut self, config: &WinsConfig) {
        if let Some(title) = &config.title {
            self.state.title = title.clone();
        }
        if let Some(accent) = &config.accent {
            self.state.accent = accent.clone();
        }
        self.commit();
    }

    pub fn broadcast(&self) {
        self.broadcaster.broadcast(OverlayEvent::Wins(self.state.clone()));
    }

    fn commit(&self) {
        save_document(&self.path, &self.state);
        self.broadcast();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventbus::EventBus;
    use tempfile::TempDir;

    #[tokio::test]
    async fn counter_goes_negative_and_broadcasts_every_change() {
        let dir = TempDir::new().unwrap();
        let bus = EventBus::new();
        let mut rx = bus.subscribe(None);
        let mut wins = WinCounter::load(dir.path().join("wins.json"), Arc::new(bus));

        wins.dec();
        wins.dec();
        wins.inc();
        assert_eq!(wins.state().count, -1);

        let mut seen = Vec::new();
        while let Ok(OverlayEvent::Wins(state)) = rx.try_recv() {
            seen.push(state.count);
        }
        assert_eq!(seen, vec![-1, -2, -1]);

        let reloaded = WinCounter::load(dir.path().join("wins.json"), Arc::new(EventBus::new()));
        assert_eq!(reloaded.state().count, -1);
    }
}
