//! Poll loop.
//!
//! Runs the update detector once after a short startup delay and then on a
//! fixed period for the lifetime of the process. Each cycle is awaited
//! before the next tick is taken, so cycles never overlap.

use crate::config::{INITIAL_POLL_DELAY, POLL_INTERVAL};
use crate::detector::UpdateDetector;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Drives [`UpdateDetector::run_cycle`] on a timer.
pub struct PollScheduler {
    detector: Arc<UpdateDetector>,
    initial_delay: Duration,
    period: Duration,
}

impl PollScheduler {
    /// Scheduler with the production timing (2 s delay, 5 min period).
    pub fn new(detector: Arc<UpdateDetector>) -> Self {
        Self {
            detector,
            initial_delay: INITIAL_POLL_DELAY,
            period: POLL_INTERVAL,
        }
    }

    /// Override the startup delay and period.
    pub fn with_timing(mut self, initial_delay: Duration, period: Duration) -> Self {
        self.initial_delay = initial_delay;
        self.period = period.max(Duration::from_millis(1));
        self
    }

    /// Start the background loop.
    pub fn run(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "poll loop starting in {:?}, then every {:?}",
                self.initial_delay, self.period
            );
            tokio::time::sleep(self.initial_delay).await;

            let mut interval = tokio::time::interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let outcome = self.detector.run_cycle().await;
                debug!(?outcome, "poll cycle finished");
            }
        })
    }
}
