//! Application bootstrap implementation.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::error::AppError;
use crate::bot::RelayBot;
use crate::config::RelayConfig;
use crate::delivery::Transport;
use crate::download::HttpDownloader;
use crate::retention::{run_sweep, RetentionDaemon, RetentionSweeper, SweepReport};
use crate::storage::Storage;
use crate::telemetry::UsageCounters;

/// How long shutdown waits for background deliveries still running.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The running relay.
///
/// Services are started in this order:
/// 1. Storage root and runtime
/// 2. Retention daemon (first sweep one period later)
/// 3. Downloader and command front end
///
/// The app must be started and shut down from a synchronous context; it owns
/// its runtime.
pub struct RelayApp {
    bot: Arc<RelayBot>,
    counters: Arc<UsageCounters>,
    sweeper: Arc<RetentionSweeper>,
    shutdown: CancellationToken,
    daemon: JoinHandle<()>,
    runtime: Runtime,
}

impl RelayApp {
    /// Start the relay, sending all outbound traffic through `transport`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the storage root
    /// cannot be created, or the runtime or HTTP client cannot be built.
    pub fn start(config: RelayConfig, transport: Arc<dyn Transport>) -> Result<Self, AppError> {
        config.validate()?;

        let storage = Storage::new(&config.storage_root);
        storage.ensure_root()?;

        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("filerelay-worker")
            .build()
            .map_err(AppError::RuntimeCreation)?;

        let counters = Arc::new(UsageCounters::new());

        let sweeper = Arc::new(RetentionSweeper::new(
            storage.clone(),
            config.retention_window,
        ));
        let shutdown = CancellationToken::new();
        let daemon = runtime.spawn(
            RetentionDaemon::new(Arc::clone(&sweeper), config.sweep_interval)
                .run(shutdown.clone()),
        );

        let fetcher =
            HttpDownloader::with_timeout(storage, Arc::clone(&counters), config.fetch_timeout)?;

        info!(
            root = %config.storage_root.display(),
            size_threshold = config.size_threshold,
            part_size = config.part_size,
            retention_secs = config.retention_window.as_secs(),
            "File relay started"
        );

        let bot = Arc::new(RelayBot::new(
            config,
            Arc::new(fetcher),
            transport,
            Arc::clone(&counters),
            runtime.handle().clone(),
        ));

        Ok(Self {
            bot,
            counters,
            sweeper,
            shutdown,
            daemon,
            runtime,
        })
    }

    /// Command front end.
    pub fn bot(&self) -> Arc<RelayBot> {
        Arc::clone(&self.bot)
    }

    pub fn counters(&self) -> Arc<UsageCounters> {
        Arc::clone(&self.counters)
    }

    /// Handle to the app's runtime.
    pub fn runtime_handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    /// Stop the daemon, run one final sweep and wind down the runtime.
    ///
    /// Returns the final sweep's report, or `None` if it failed.
    pub fn shutdown(self) -> Option<SweepReport> {
        info!("Shutting down file relay");

        self.shutdown.cancel();
        if let Err(e) = self.runtime.block_on(self.daemon) {
            warn!(error = %e, "Retention daemon ended abnormally");
        }

        let report = self.runtime.block_on(run_sweep(Arc::clone(&self.sweeper)));

        drop(self.bot);
        self.runtime.shutdown_timeout(SHUTDOWN_GRACE);

        info!("File relay shutdown complete");
        report
    }
}
