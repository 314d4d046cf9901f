// src/worker/mod.rs

//! The worker side of the fleet.
//!
//! A worker runs in its own process (the supervisor re-executes the binary
//! with `--internal-worker <INDEX>`), performs one bounded unit of simulated
//! work and exits. It has no channel back to the supervisor: its exit and
//! its process-table entry are all the supervisor ever sees.

use std::time::{Duration, Instant};

use nix::unistd::Pid;
use tracing::{debug, info};

use crate::errors::Result;
use crate::process::unix::query_state;

pub mod task;

pub use task::{Computation, Operation, Value};

/// How long each worker works: `base + index * step`.
///
/// Deterministic in the index so tests can predict completion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkSchedule {
    base: Duration,
    step: Duration,
}

impl WorkSchedule {
    pub fn new(base: Duration, step: Duration) -> Self {
        Self { base, step }
    }

    pub fn from_millis(base_ms: u64, step_ms: u64) -> Self {
        Self::new(Duration::from_millis(base_ms), Duration::from_millis(step_ms))
    }

    /// `(base, step)` in whole milliseconds, as passed on the worker command
    /// line.
    pub fn as_millis(&self) -> (u64, u64) {
        (
            u64::try_from(self.base.as_millis()).unwrap_or(u64::MAX),
            u64::try_from(self.step.as_millis()).unwrap_or(u64::MAX),
        )
    }

    pub fn duration_for(&self, index: usize) -> Duration {
        let factor = u32::try_from(index).unwrap_or(u32::MAX);
        self.base.saturating_add(self.step.saturating_mul(factor))
    }
}

impl Default for WorkSchedule {
    fn default() -> Self {
        Self::new(Duration::from_secs(3), Duration::from_secs(1))
    }
}

/// Body of a worker process.
pub async fn run(index: usize, schedule: WorkSchedule) -> Result<()> {
    let pid = std::process::id();
    let started = Instant::now();
    println!("worker {index} started (pid {pid})");

    let state = query_state(Pid::this());
    println!("pid {pid} is {state:?}");

    let computation = Computation::for_worker(index, pid);
    println!("worker {index} computed: {computation}");

    let work = schedule.duration_for(index);
    debug!(index, pid, ?work, "simulating work");
    tokio::time::sleep(work).await;

    let elapsed = started.elapsed();
    println!("worker {index} finished (pid {pid})");
    println!("worker {index} ran for {:.2} seconds", elapsed.as_secs_f64());
    info!(index, pid, ?elapsed, "worker done");
    Ok(())
}
