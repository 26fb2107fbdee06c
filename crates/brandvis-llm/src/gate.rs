//! Process-wide admission control for one provider.
//!
//! A gate bounds the number of in-flight calls with a semaphore and can
//! additionally enforce a minimum spacing between call starts. Callers are
//! only ever delayed, never rejected. Clones share the same limits, so one
//! gate per provider is built at startup and handed to every job.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct ProviderGate {
    permits: Arc<Semaphore>,
    max_concurrency: usize,
    min_interval: Duration,
    next_start: Arc<Mutex<Option<Instant>>>,
}

/// Held for the duration of one provider call; dropping it frees the slot.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl ProviderGate {
    /// A gate allowing at most `max_concurrency` simultaneous calls with no spacing.
    #[must_use]
    pub fn new(max_concurrency: usize) -> Self {
        Self::with_min_interval(max_concurrency, Duration::ZERO)
    }

    /// A gate that also spaces consecutive call starts at least `min_interval` apart.
    ///
    /// A `max_concurrency` of zero is treated as one.
    #[must_use]
    pub fn with_min_interval(max_concurrency: usize, min_interval: Duration) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            min_interval,
            next_start: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for a free slot and, when spacing is configured, for this
    /// caller's start time.
    ///
    /// Start times are reserved in arrival order under the mutex, so
    /// concurrent callers fan out at `min_interval` steps instead of
    /// bursting together once a slot frees.
    pub async fn acquire(&self) -> GatePermit {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .expect("provider gate semaphore is never closed");

        if !self.min_interval.is_zero() {
            let start_at = {
                let mut next = self.next_start.lock().await;
                let now = Instant::now();
                let start_at = next.map_or(now, |slot| slot.max(now));
                *next = Some(start_at + self.min_interval);
                start_at
            };
            tokio::time::sleep_until(start_at).await;
        }

        GatePermit { _permit: permit }
    }

    /// Number of slots currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
