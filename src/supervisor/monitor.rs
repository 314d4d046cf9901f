// src/supervisor/monitor.rs

//! Async monitoring loop around the synchronous round logic.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::errors::Result;
use crate::process::ProcessTable;

use super::fleet::Supervisor;
use super::report::{MonitorOutcome, MonitorReport};

impl<P: ProcessTable> Supervisor<P> {
    /// Poll the fleet until every worker has been reaped.
    ///
    /// - An empty fleet returns `Completed` at once, without a single query.
    /// - Rounds repeat every `poll_interval` until one collects the rest of
    ///   the fleet.
    /// - When `cancel` fires (checked before each round and raced against
    ///   the sleep), every remaining worker is collected with a blocking
    ///   wait and `Cancelled` is returned.
    /// - A process-table error also triggers the blocking final pass before
    ///   being returned.
    ///
    /// On every return path the registry is empty.
    pub async fn monitor_and_reap(&mut self, cancel: &CancellationToken) -> Result<MonitorReport> {
        if self.registry().is_empty() {
            info!("no workers to monitor");
            return Ok(self.take_report(MonitorOutcome::Completed));
        }

        info!(
            workers = self.registry().len(),
            poll_interval = ?self.options.poll_interval,
            "monitoring fleet"
        );

        let result = self.drive(cancel).await;

        if !self.registry().is_empty() {
            if let Err(e) = &result {
                warn!(error = %e, "monitoring failed; collecting remaining workers");
            }
            self.final_collection_pass();
        }

        let outcome = result?;
        let report = self.take_report(outcome);
        info!(
            outcome = ?report.outcome,
            rounds = report.rounds,
            reaped = report.reaped(),
            "fleet fully collected"
        );
        Ok(report)
    }

    async fn drive(&mut self, cancel: &CancellationToken) -> Result<MonitorOutcome> {
        loop {
            if cancel.is_cancelled() {
                info!("monitoring interrupted");
                return Ok(MonitorOutcome::Cancelled);
            }

            if self.poll_round()?.is_final() {
                return Ok(MonitorOutcome::Completed);
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("monitoring interrupted");
                    return Ok(MonitorOutcome::Cancelled);
                }
                _ = tokio::time::sleep(self.options.poll_interval) => {}
            }
        }
    }
}
