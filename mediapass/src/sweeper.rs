//! Scheduled removal of expired tokens

use std::time::Duration;

use mediapass_clock::Clock;
use tokio::{task::JoinHandle, time};

use crate::TokenStore;

/// Configuration for a background [`Sweeper`]
#[derive(Clone, Copy, Debug)]
pub struct SweepConfig {
    interval: Duration,
}

impl Default for SweepConfig {
    /// Sweeps every 30 seconds
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

impl SweepConfig {
    /// Constructs a configuration that sweeps once every `interval`
    ///
    /// A zero interval is raised to one millisecond.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// The time between sweeps
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// A background task that periodically sweeps expired tokens from a store
///
/// Sweeping only bounds memory use. Expired tokens are never observable
/// whether or not a sweeper is running.
///
/// The task stops when the handle is dropped or [`shutdown`][Sweeper::shutdown]
/// is called.
#[derive(Debug)]
pub struct Sweeper {
    join: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawns a sweeper on the current tokio runtime
    ///
    /// The first sweep happens immediately.
    pub fn spawn<C>(store: TokenStore, clock: C, config: SweepConfig) -> Self
    where
        C: Clock + Send + 'static,
    {
        tracing::info!(
            interval_ms = config.interval.as_millis() as u64,
            "starting expired token sweeper"
        );
        let join = tokio::spawn(forever_sweep(store, clock, config));
        Self { join: Some(join) }
    }

    /// Whether the background task is still running
    pub fn is_running(&self) -> bool {
        self.join.as_ref().map_or(false, |join| !join.is_finished())
    }

    /// Stops the sweeper and waits for it to finish
    pub async fn shutdown(mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
            match join.await {
                Err(err) if err.is_panic() => tracing::error!("token sweeper panicked!"),
                _ => tracing::info!("token sweeper stopped"),
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(join) = &self.join {
            join.abort();
        }
    }
}

async fn forever_sweep<C: Clock>(store: TokenStore, clock: C, config: SweepConfig) {
    let mut interval = time::interval(config.interval);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let now = clock.now();
        let removed = store.sweep_expired(now);
        if removed > 0 {
            tracing::debug!(
                removed,
                remaining = store.physical_len(),
                "swept expired tokens"
            );
        } else {
            tracing::trace!("no expired tokens to sweep");
        }
    }
}
