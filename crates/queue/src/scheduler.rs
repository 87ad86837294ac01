//! Scheduled jobs for periodic maintenance tasks.

use std::sync::Arc;
use std::time::Duration;

use rollcall_common::config::SweeperConfig;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between auto-abstain sweeps (default: 20 seconds).
    pub sweep_interval: Duration,
    /// Whether to run the sweep at all.
    pub enable_sweeper: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(20),
            enable_sweeper: true,
        }
    }
}

impl From<&SweeperConfig> for SchedulerConfig {
    fn from(config: &SweeperConfig) -> Self {
        Self {
            sweep_interval: config.interval(),
            enable_sweeper: config.enabled,
        }
    }
}

/// Job executor trait for scheduled jobs.
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    /// Turn silent attendees of closed votes into abstentions.
    ///
    /// Returns the number of attendance rows processed.
    async fn sweep_abstentions(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}

/// Run the scheduler with the given configuration and executor.
///
/// The loop stops once `shutdown` changes or its sender is dropped. A sweep
/// already in flight runs to completion first.
pub fn run_scheduler<E: JobExecutor + 'static>(
    config: SchedulerConfig,
    executor: Arc<E>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if !config.enable_sweeper {
            tracing::info!("Auto-abstain sweeper disabled");
            return;
        }
        if config.sweep_interval.is_zero() {
            tracing::error!("Auto-abstain sweep interval must be non-zero; sweeper not started");
            return;
        }

        let mut interval = interval(config.sweep_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("Scheduler stopped");
                    break;
                }
                _ = interval.tick() => {
                    match executor.sweep_abstentions().await {
                        Ok(count) => {
                            if count > 0 {
                                tracing::info!(count, "Processed auto-abstain records");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Auto-abstain sweep failed");
                        }
                    }
                }
            }
        }
    })
}
