// src/supervisor/registry.rs

//! Bookkeeping for outstanding workers.

use nix::unistd::Pid;
use tracing::debug;

use crate::types::{LifecycleState, ProcessState};

/// One spawned worker as seen by the supervisor.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    pid: Pid,
    index: usize,
    state: LifecycleState,
    /// Every state this handle has been in, starting with `Running`.
    history: Vec<LifecycleState>,
}

impl WorkerHandle {
    fn new(pid: Pid, index: usize) -> Self {
        Self {
            pid,
            index,
            state: LifecycleState::Running,
            history: vec![LifecycleState::Running],
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn history(&self) -> &[LifecycleState] {
        &self.history
    }

    /// Record a state observation, ignoring any that would move backwards.
    fn observe(&mut self, observed: ProcessState) -> LifecycleState {
        let next = LifecycleState::from(observed);
        if next == self.state {
            return self.state;
        }
        if self.state.can_advance_to(next) {
            self.state = next;
            self.history.push(next);
        } else {
            debug!(
                pid = self.pid.as_raw(),
                current = %self.state,
                observed = ?observed,
                "ignoring non-monotonic state observation"
            );
        }
        self.state
    }

    fn mark_reaped(&mut self) {
        self.state = LifecycleState::Reaped;
        self.history.push(LifecycleState::Reaped);
    }
}

/// Outstanding workers in spawn order.
///
/// A handle leaves the registry exactly when it is reaped, and a reaped
/// handle is handed back to the caller, never kept. Since every collection
/// path goes through [`FleetRegistry::reap`], a pid can't be collected twice.
#[derive(Debug, Default)]
pub struct FleetRegistry {
    handles: Vec<WorkerHandle>,
}

impl FleetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, pid: Pid, index: usize) {
        debug_assert!(
            !self.contains(pid),
            "pid {pid} registered twice while still outstanding"
        );
        self.handles.push(WorkerHandle::new(pid, index));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.handles.iter().any(|h| h.pid == pid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkerHandle> {
        self.handles.iter()
    }

    /// Snapshot of outstanding pids in spawn order.
    pub fn pids(&self) -> Vec<Pid> {
        self.handles.iter().map(|h| h.pid).collect()
    }

    pub(crate) fn observe(&mut self, pid: Pid, observed: ProcessState) -> Option<LifecycleState> {
        self.handles
            .iter_mut()
            .find(|h| h.pid == pid)
            .map(|h| h.observe(observed))
    }

    /// Remove `pid` and return its handle marked `Reaped`.
    pub(crate) fn reap(&mut self, pid: Pid) -> Option<WorkerHandle> {
        let pos = self.handles.iter().position(|h| h.pid == pid)?;
        let mut handle = self.handles.remove(pos);
        handle.mark_reaped();
        Some(handle)
    }
}
