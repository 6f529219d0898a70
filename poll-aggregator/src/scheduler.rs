use crate::generator::PollGenerator;
use crate::state::NextPollTime;
use crate::traits::PollStore;
use crate::types::{Result, ScheduleConfig};
use crate::utils::time::{cutoff, until_next_local_midnight};
use chrono::{Local, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Drives periodic poll generation and the daily retention sweep.
pub struct PollScheduler {
    generator: Arc<PollGenerator>,
    store: Arc<dyn PollStore>,
    next_poll: NextPollTime,
    config: ScheduleConfig,
}

/// Running scheduler tasks. Dropping the handle leaves them running; call
/// [`SchedulerHandle::shutdown`] to stop them.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        for result in futures::future::join_all(self.tasks).await {
            if let Err(e) = result {
                error!("Scheduler task ended abnormally: {}", e);
            }
        }
        info!("Poll scheduler stopped");
    }
}

impl PollScheduler {
    pub fn new(
        generator: Arc<PollGenerator>,
        store: Arc<dyn PollStore>,
        next_poll: NextPollTime,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            generator,
            store,
            next_poll,
            config,
        }
    }

    /// Spawn both triggers and return immediately.
    pub fn start(self) -> SchedulerHandle {
        info!(
            "Scheduling poll generation every {:?} and deletion of polls older than {:?} daily",
            self.config.generation_interval, self.config.retention
        );

        let cancel = CancellationToken::new();
        let scheduler = Arc::new(self);

        let generation = tokio::spawn(scheduler.clone().generation_loop(cancel.clone()));
        let retention = tokio::spawn(scheduler.retention_loop(cancel.clone()));

        SchedulerHandle {
            cancel,
            tasks: vec![generation, retention],
        }
    }

    async fn generation_loop(self: Arc<Self>, cancel: CancellationToken) {
        let period = self.config.generation_interval.max(Duration::from_secs(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    // Advance before generating so the countdown is right
                    // whatever this cycle's outcome.
                    let next = self.next_poll.advance(self.config.generation_window());
                    info!("Generation trigger fired, next poll expected at {}", next);

                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.generator.run_cycle() => {}
                    }
                }
            }
        }
    }

    async fn retention_loop(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            let wait = until_next_local_midnight(Local::now());
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {
                    if let Err(e) = self.sweep().await {
                        error!("Error deleting old polls: {}", e);
                    }
                }
            }
        }
    }

    /// Delete every poll older than the retention window.
    pub async fn sweep(&self) -> Result<u64> {
        let deleted = self
            .store
            .delete_created_before(cutoff(Utc::now(), self.config.retention_window()))
            .await?;
        info!("Deleted {} old polls", deleted);
        Ok(deleted)
    }
}
