//! Cancellable repeating timer scoped to the view that owns it.
//!
//! A [`Poller`] fires its callback once per period on the tokio runtime. The
//! first callback happens one full period after start; the owning view is
//! expected to perform its initial fetch on mount. Dropping the `Poller`
//! aborts the timer task, so a torn-down view never sees another tick.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub struct Poller {
    period: Duration,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Start calling `on_tick` every `period`. Must be called inside a tokio runtime.
    pub fn every<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let start = Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                on_tick();
            }
        });
        Self { period, handle }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
