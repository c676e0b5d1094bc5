//! Periodic retention daemon.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::{RetentionSweeper, SweepReport};

/// Runs a [`RetentionSweeper`] every `period` until cancelled.
///
/// The first sweep happens one full period after start.
#[derive(Debug)]
pub struct RetentionDaemon {
    sweeper: Arc<RetentionSweeper>,
    period: Duration,
}

impl RetentionDaemon {
    pub fn new(sweeper: Arc<RetentionSweeper>, period: Duration) -> Self {
        Self { sweeper, period }
    }

    /// Main loop; returns once `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            period_secs = self.period.as_secs(),
            window_secs = self.sweeper.window().as_secs(),
            "Retention daemon starting"
        );

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Retention daemon shutting down");
                    break;
                }

                _ = ticker.tick() => {
                    run_sweep(Arc::clone(&self.sweeper)).await;
                }
            }
        }
    }
}

/// Run one sweep on the blocking pool, logging instead of propagating.
pub(crate) async fn run_sweep(sweeper: Arc<RetentionSweeper>) -> Option<SweepReport> {
    match tokio::task::spawn_blocking(move || sweeper.sweep()).await {
        Ok(Ok(report)) => {
            info!(
                namespaces = report.namespaces,
                files_deleted = report.files_deleted,
                bytes_freed = report.bytes_freed,
                failures = report.failures,
                "Retention sweep finished"
            );
            Some(report)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Retention sweep failed");
            None
        }
        Err(e) => {
            error!(error = %e, "Retention sweep task aborted");
            None
        }
    }
}
