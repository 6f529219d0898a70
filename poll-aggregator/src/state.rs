use crate::generator::PollGenerator;
use crate::service::PollService;
use crate::traits::NewsSource;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Estimated time of the next scheduled poll.
///
/// Written by the scheduler and the on-demand trigger, read by the listing
/// path. A single scalar,
/// last write wins. Not persisted: every process start begins with a fresh
/// estimate.
#[derive(Clone, Debug)]
pub struct NextPollTime {
    millis: Arc<AtomicI64>,
}

impl NextPollTime {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(at.timestamp_millis())),
        }
    }

    /// Initial estimate: one interval from now.
    pub fn starting_now(interval: Duration) -> Self {
        Self::new(Utc::now() + interval)
    }

    pub fn get(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.millis())
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn millis(&self) -> i64 {
        self.millis.load(Ordering::Relaxed)
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::Relaxed);
    }

    /// Move the estimate to `interval` after now and return it.
    pub fn advance(&self, interval: Duration) -> DateTime<Utc> {
        let next = Utc::now() + interval;
        self.set(next);
        next
    }
}

/// Everything the HTTP handlers need.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PollService>,
    pub generator: Arc<PollGenerator>,
    pub news: Arc<dyn NewsSource>,
    pub next_poll: NextPollTime,
    pub generation_window: Duration,
}

impl AppState {
    pub fn new(
        service: Arc<PollService>,
        generator: Arc<PollGenerator>,
        news: Arc<dyn NewsSource>,
        next_poll: NextPollTime,
        generation_window: Duration,
    ) -> Self {
        Self {
            service,
            generator,
            news,
            next_poll,
            generation_window,
        }
    }
}
