// File: tikplays-core/src/tasks/countdown_tick.rs

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, trace};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Generations are process-wide so a tick from a replaced timer can never
/// collide with its successor's.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    pub generation: u64,
}

/// The one periodic task behind a countdown.
///
/// Ticks are not applied by the task itself; they are sent to the engine,
/// which owns the state and checks `is_current` before decrementing.
#[derive(Debug)]
pub struct TickSource {
    tx: UnboundedSender<CountdownTick>,
    period: Duration,
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl TickSource {
    pub fn new(tx: UnboundedSender<CountdownTick>) -> Self {
        Self::with_period(tx, TICK_PERIOD)
    }

    pub fn with_period(tx: UnboundedSender<CountdownTick>, period: Duration) -> Self {
        Self {
            tx,
            period,
            handle: None,
            generation: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawns the tick task unless one is already alive. Returns whether a
    /// task was spawned.
    pub fn ensure_started(&mut self) -> bool {
        if self.is_running() {
            trace!("TickSource: already running (gen {})", self.generation);
            return false;
        }
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        self.generation = generation;

        let tx = self.tx.clone();
        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(CountdownTick { generation }).is_err() {
                    break;
                }
            }
        }));
        debug!("TickSource: started gen {}", generation);
        true
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("TickSource: stopped gen {}", self.generation);
        }
        self.generation = 0;
    }

    /// Whether `tick` came from the task currently owned by this source.
    pub fn is_current(&self, tick: CountdownTick) -> bool {
        self.handle.is_some() && tick.generation == self.generation
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
