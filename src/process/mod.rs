// src/process/mod.rs

//! Process table abstraction.
//!
//! The supervisor never forks, inspects `/proc` or calls `waitpid` itself.
//! It talks to a [`ProcessTable`], which bundles the three capabilities it
//! needs: spawn a worker, query a worker's state, and collect a worker.
//!
//! - [`unix`] is the production implementation: it re-executes the current
//!   binary in worker mode and uses procfs plus `waitpid`.
//! - [`mock`] provides `SimulatedProcessTable`, a deterministic fake driven
//!   by tokio's clock, so monitoring logic can be tested without creating
//!   real processes.

use nix::unistd::Pid;

use crate::errors::Result;
use crate::types::{CollectOutcome, ProcessState};

pub mod mock;
pub mod unix;

pub use mock::{SimulatedProcessTable, TableCall};
pub use unix::UnixProcessTable;

/// Capabilities the supervisor needs from the OS process table.
///
/// Implementations must tolerate an entry disappearing between two calls:
/// a vanished process is reported as [`ProcessState::Gone`] and a child that
/// was already collected elsewhere as [`CollectOutcome::NoSuchChild`], never
/// as an error.
pub trait ProcessTable: Send {
    /// Start the worker with the given task index and return its pid.
    ///
    /// Either a process was created and its pid is returned, or nothing was
    /// created and an error is returned.
    fn spawn_worker(&mut self, index: usize) -> Result<Pid>;

    /// Report the current lifecycle state of `pid`.
    fn query_state(&mut self, pid: Pid) -> ProcessState;

    /// Collect `pid` without blocking.
    fn try_collect(&mut self, pid: Pid) -> Result<CollectOutcome>;

    /// Collect `pid`, blocking until it has terminated.
    ///
    /// Never returns [`CollectOutcome::StillRunning`].
    fn collect(&mut self, pid: Pid) -> Result<CollectOutcome>;
}
