//! Engine-backed job executor.

use rollcall_core::AutoAbstainSweeper;

use crate::scheduler::JobExecutor;

/// Runs scheduled jobs against the voting engine.
#[derive(Clone)]
pub struct EngineJobExecutor {
    sweeper: AutoAbstainSweeper,
}

impl EngineJobExecutor {
    /// Create a new executor.
    #[must_use]
    pub const fn new(sweeper: AutoAbstainSweeper) -> Self {
        Self { sweeper }
    }
}

#[async_trait::async_trait]
impl JobExecutor for EngineJobExecutor {
    async fn sweep_abstentions(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let report = self.sweeper.sweep().await?;
        Ok(report.scanned as u64)
    }
}
