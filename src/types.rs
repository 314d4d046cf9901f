// src/types.rs

//! Shared vocabulary between the process table and the supervisor.

use std::fmt;

use nix::sys::signal::Signal;

/// What a single state query against the process table reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Still executing (running, sleeping, stopped, ...).
    Running,
    /// Finished executing, exit status not collected yet (a zombie).
    Terminated,
    /// The identifier no longer resolves to a process.
    Gone,
}

/// Lifecycle of a worker as recorded by the supervisor.
///
/// Only moves forward: `Running` -> `TerminatedUnreaped | Gone` -> `Reaped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Running,
    TerminatedUnreaped,
    Gone,
    Reaped,
}

impl LifecycleState {
    fn rank(self) -> u8 {
        match self {
            LifecycleState::Running => 0,
            LifecycleState::TerminatedUnreaped | LifecycleState::Gone => 1,
            LifecycleState::Reaped => 2,
        }
    }

    /// Whether moving from `self` to `next` keeps the lifecycle monotonic.
    ///
    /// Staying put is allowed; hopping between the two intermediate states is
    /// not.
    pub fn can_advance_to(self, next: LifecycleState) -> bool {
        self == next || next.rank() > self.rank()
    }
}

impl From<ProcessState> for LifecycleState {
    fn from(state: ProcessState) -> Self {
        match state {
            ProcessState::Running => LifecycleState::Running,
            ProcessState::Terminated => LifecycleState::TerminatedUnreaped,
            ProcessState::Gone => LifecycleState::Gone,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Running => "running",
            LifecycleState::TerminatedUnreaped => "zombie",
            LifecycleState::Gone => "gone",
            LifecycleState::Reaped => "reaped",
        };
        f.write_str(s)
    }
}

/// Exit status retrieved by a successful collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    Exited(i32),
    Signaled(Signal),
}

impl WorkerExit {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkerExit::Exited(0))
    }
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerExit::Exited(code) => write!(f, "exited with code {code}"),
            WorkerExit::Signaled(sig) => write!(f, "killed by {sig:?}"),
        }
    }
}

/// Result of a collection attempt that did not hit a real OS error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    /// Exit status retrieved and the process-table entry released.
    Reaped(WorkerExit),
    /// Non-blocking attempt found the child still alive.
    StillRunning,
    /// The kernel no longer knows this child (already collected elsewhere).
    NoSuchChild,
}

impl CollectOutcome {
    pub fn exit(&self) -> Option<WorkerExit> {
        match self {
            CollectOutcome::Reaped(exit) => Some(*exit),
            _ => None,
        }
    }
}
