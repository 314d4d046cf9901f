// src/supervisor/mod.rs

//! Fleet supervision: spawn workers, watch them, reap every one of them.
//!
//! The synchronous round logic lives in [`fleet`] (one call to
//! `Supervisor::poll_round` is one polling round) and can be driven by hand
//! in tests. The async loop around it, with the poll-interval sleep and
//! cancellation handling, is implemented in [`monitor`].
//!
//! Precedence inside a round: workers that vanished from the process table
//! are collected (non-blocking) *before* the "everyone is a zombie" check
//! decides on the bulk collection.

use std::time::Duration;

pub mod fleet;
pub mod monitor;
pub mod registry;
pub mod report;

pub use fleet::Supervisor;
pub use registry::{FleetRegistry, WorkerHandle};
pub use report::{Collection, MonitorOutcome, MonitorReport, ReapPath};

/// Result of a single polling round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Some workers are still running; poll again after the interval.
    Pending { running: usize },
    /// All remaining workers were zombies and have been collected.
    Harvested(usize),
    /// The registry emptied through vanished workers alone.
    Drained,
}

impl RoundOutcome {
    pub fn is_final(&self) -> bool {
        !matches!(self, RoundOutcome::Pending { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorOptions {
    pub poll_interval: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }
}
