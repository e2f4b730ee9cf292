//! The per-container housekeeping loop and its adaptive interval.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::cgroup;
use crate::config::HousekeepingConfig;
use crate::container::ContainerHandle;
use crate::error::ResultOkLogExt;
use crate::info::ContainerStats;
use crate::storage::StorageSink;

use super::Result;

/// Number of stored samples compared to detect an idle container.
const RECENT_SAMPLES: usize = 2;

/// How an [`AdaptiveInterval`] changed after observing samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalChange {
    Raised(Duration),
    Lowered(Duration),
}

/// Housekeeping interval that backs off while a container is idle.
///
/// The interval is always `baseline * 2^k`, capped at `max`. Two identical consecutive
/// samples double it; any difference snaps it back to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptiveInterval {
    current: Duration,
    baseline: Duration,
    max: Duration,
}

impl AdaptiveInterval {
    pub fn new(baseline: Duration, max: Duration) -> Self {
        Self {
            current: baseline,
            baseline,
            max: max.max(baseline),
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    /// Updates the interval from the most recent stored samples.
    ///
    /// Anything but exactly [`RECENT_SAMPLES`] samples leaves the interval untouched.
    pub fn observe(&mut self, recent: &[ContainerStats]) -> Option<IntervalChange> {
        let [previous, latest] = recent else {
            return None;
        };
        if previous.stats_eq(latest) && self.current < self.max {
            self.current = self.current.saturating_mul(2).min(self.max);
            Some(IntervalChange::Raised(self.current))
        } else if !previous.stats_eq(latest) && self.current != self.baseline {
            self.current = self.baseline;
            Some(IntervalChange::Lowered(self.current))
        } else {
            None
        }
    }
}

/// State owned by one container's housekeeping task.
pub(super) struct Housekeeper {
    name: String,
    handle: Arc<dyn ContainerHandle>,
    storage: Arc<dyn StorageSink>,
    config: HousekeepingConfig,
    interval: AdaptiveInterval,
}

impl Housekeeper {
    pub(super) fn new(
        name: String,
        handle: Arc<dyn ContainerHandle>,
        storage: Arc<dyn StorageSink>,
        config: HousekeepingConfig,
    ) -> Self {
        Self {
            name,
            handle,
            storage,
            interval: AdaptiveInterval::new(config.interval, config.max_interval),
            config,
        }
    }

    /// Housekeeps until `stop` is set or its sender is dropped.
    ///
    /// The stop signal is checked between ticks only; a tick in progress always
    /// completes.
    pub(super) async fn run(mut self, mut stop: watch::Receiver<bool>) {
        let long_housekeeping = self.config.long_housekeeping();

        log::info!("start housekeeping for container `{}`", self.name);
        let mut last_housekeeping = Instant::now();
        loop {
            if *stop.borrow_and_update() {
                break;
            }

            let start = Instant::now();
            self.housekeeping_tick().await;
            let duration = start.elapsed();
            if duration >= long_housekeeping {
                log::debug!("housekeeping({}) took {:?}", self.name, duration);
            }

            // Scheduled from the previous deadline so a slow tick does not accumulate drift.
            let next_housekeeping = self.next_housekeeping(last_housekeeping).await;
            log::trace!(
                "next housekeeping for `{}` in {:?}",
                self.name,
                next_housekeeping.saturating_duration_since(Instant::now())
            );
            tokio::select! {
                _ = tokio::time::sleep_until(next_housekeeping) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            last_housekeeping = next_housekeeping;
        }
        log::info!("stop housekeeping for container `{}`", self.name);
    }

    async fn housekeeping_tick(&self) {
        let handle = Arc::clone(&self.handle);
        let storage = Arc::clone(&self.storage);
        let result = tokio::task::spawn_blocking(move || update_stats(&*handle, &*storage)).await;
        match result {
            Ok(result) => {
                result.ok_log(
                    log::Level::Error,
                    format_args!("failed to update stats for container `{}`", self.name),
                );
            }
            Err(err) => log::error!("stats update for container `{}` panicked: {}", self.name, err),
        }
    }

    /// Determines when the next housekeeping should occur.
    async fn next_housekeeping(&mut self, last_housekeeping: Instant) -> Instant {
        if !self.config.allow_dynamic {
            return last_housekeeping + self.config.interval;
        }

        let storage = Arc::clone(&self.storage);
        let name = self.name.clone();
        let recent =
            tokio::task::spawn_blocking(move || storage.recent_stats(&name, RECENT_SAMPLES)).await;
        let recent = match recent {
            Ok(recent) => recent.ok_log(
                log::Level::Warn,
                format_args!(
                    "failed to get recent stats of `{}` while determining the next housekeeping",
                    self.name
                ),
            ),
            Err(err) => {
                log::warn!("recent stats lookup for `{}` panicked: {}", self.name, err);
                None
            }
        };
        match recent.and_then(|recent| self.interval.observe(&recent)) {
            Some(IntervalChange::Raised(interval)) => log::debug!(
                "raising housekeeping interval for `{}` to {:?}",
                self.name,
                interval
            ),
            Some(IntervalChange::Lowered(interval)) => log::debug!(
                "lowering housekeeping interval for `{}` to {:?}",
                self.name,
                interval
            ),
            None => {}
        }

        last_housekeeping + self.interval.current()
    }
}

/// Samples the container once and hands the normalized stats to the storage.
fn update_stats(handle: &dyn ContainerHandle, storage: &dyn StorageSink) -> Result<()> {
    let Some(raw) = handle.raw_stats()? else {
        return Ok(());
    };
    if raw.is_empty() {
        return Ok(());
    }
    let stats = cgroup::to_container_stats(&raw);
    let reference = handle.reference()?;
    storage.add_stats(&reference, stats)?;
    log::trace!("added stats for container `{}`", reference.name);
    Ok(())
}
