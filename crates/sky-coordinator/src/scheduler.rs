//! Store scheduler
//!
//! One background task per store ticks every group on a fixed period.
//! Widgets learn about changes through their group subscriptions.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::SkyStore;
use crate::now_ms;

/// Default tick period, roughly one animation frame
pub const DEFAULT_TICK: Duration = Duration::from_millis(50);

pub struct Scheduler {
    handle: JoinHandle<u64>,
    shutdown: watch::Sender<bool>,
}

impl Scheduler {
    /// Start ticking `store` every `period` with the wall clock
    pub fn spawn(store: SkyStore, period: Duration) -> Self {
        Self::spawn_with_clock(store, period, now_ms)
    }

    /// Same, with an injected millisecond clock
    pub fn spawn_with_clock<F>(store: SkyStore, period: Duration, clock: F) -> Self
    where
        F: Fn() -> i64 + Send + 'static,
    {
        let (shutdown, mut stop) = watch::channel(false);
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut ticks = 0u64;

            info!("Scheduler started ({:?} period)", period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let changed = store.tick(clock());
                        ticks += 1;
                        if changed > 0 {
                            debug!("Tick {}: {} group(s) changed", ticks, changed);
                        }
                    }
                    _ = stop.changed() => break,
                }
            }
            info!("Scheduler stopped after {} ticks", ticks);
            ticks
        });

        Self { handle, shutdown }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the task and return how many ticks it ran
    pub async fn shutdown(self) -> u64 {
        let _ = self.shutdown.send(true);
        self.handle.await.unwrap_or(0)
    }
}
