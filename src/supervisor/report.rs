// src/supervisor/report.rs

use nix::unistd::Pid;

use crate::types::{LifecycleState, WorkerExit};

/// Which code path released a worker's process-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapPath {
    /// Bulk blocking collection once every remaining worker was a zombie.
    Harvested,
    /// Non-blocking attempt after the pid vanished from the process table.
    Vanished,
    /// Blocking collection during cleanup after cancellation or an error.
    FinalPass,
}

/// Record of one reaped worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub pid: Pid,
    pub index: usize,
    pub path: ReapPath,
    /// `None` when the kernel had nothing to report (already collected
    /// elsewhere) or the collection failed.
    pub exit: Option<WorkerExit>,
    /// Lifecycle states the worker went through, ending with `Reaped`.
    pub lifecycle: Vec<LifecycleState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    Completed,
    Cancelled,
}

/// What `Supervisor::monitor_and_reap` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorReport {
    pub outcome: MonitorOutcome,
    pub rounds: u32,
    pub collections: Vec<Collection>,
}

impl MonitorReport {
    pub fn is_cancelled(&self) -> bool {
        self.outcome == MonitorOutcome::Cancelled
    }

    pub fn reaped(&self) -> usize {
        self.collections.len()
    }

    pub fn by_path(&self, path: ReapPath) -> impl Iterator<Item = &Collection> {
        self.collections.iter().filter(move |c| c.path == path)
    }

    /// Workers whose collected exit status was not a clean `exit(0)`.
    pub fn failures(&self) -> impl Iterator<Item = &Collection> {
        self.collections
            .iter()
            .filter(|c| c.exit.is_some_and(|exit| !exit.is_success()))
    }
}
