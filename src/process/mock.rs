// src/process/mock.rs

//! Simulated process table for tests.
//!
//! Each simulated worker "runs" for `WorkSchedule::duration_for(index)`
//! measured on tokio's clock, so tests using `start_paused = true` get fully
//! deterministic timing. Every call made by the supervisor is recorded as a
//! [`TableCall`] for later assertions.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nix::unistd::Pid;
use tokio::time::Instant;

use super::ProcessTable;
use crate::errors::{ForkwatchError, Result};
use crate::types::{CollectOutcome, ProcessState, WorkerExit};
use crate::worker::WorkSchedule;

/// One interaction between the supervisor and the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableCall {
    Spawn { index: usize, pid: Pid },
    Query { pid: Pid, state: ProcessState },
    TryCollect { pid: Pid, outcome: CollectOutcome },
    /// Blocking collection; `waited` is how long a real `waitpid` would
    /// have blocked for the process to finish.
    Collect {
        pid: Pid,
        outcome: CollectOutcome,
        waited: Duration,
    },
}

impl TableCall {
    pub fn pid(&self) -> Pid {
        match self {
            TableCall::Spawn { pid, .. }
            | TableCall::Query { pid, .. }
            | TableCall::TryCollect { pid, .. }
            | TableCall::Collect { pid, .. } => *pid,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, TableCall::TryCollect { .. } | TableCall::Collect { .. })
    }
}

#[derive(Debug)]
struct SimProcess {
    started: Instant,
    runtime: Duration,
    exit: WorkerExit,
    /// Collected by someone other than the supervisor.
    vanished: bool,
    reaped: bool,
}

impl SimProcess {
    fn deadline(&self) -> Instant {
        self.started + self.runtime
    }

    fn state_at(&self, now: Instant) -> ProcessState {
        if self.vanished || self.reaped {
            ProcessState::Gone
        } else if now >= self.deadline() {
            ProcessState::Terminated
        } else {
            ProcessState::Running
        }
    }
}

#[derive(Debug)]
struct SimState {
    next_pid: i32,
    schedule: WorkSchedule,
    runtime_overrides: HashMap<usize, Duration>,
    failing_spawns: HashSet<usize>,
    processes: BTreeMap<Pid, SimProcess>,
    calls: Vec<TableCall>,
}

/// Fake process table; clones share the same simulated state, so a test can
/// keep one clone for inspection after handing another to the supervisor.
#[derive(Debug, Clone)]
pub struct SimulatedProcessTable {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedProcessTable {
    pub fn new(schedule: WorkSchedule) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                next_pid: 1000,
                schedule,
                runtime_overrides: HashMap::new(),
                failing_spawns: HashSet::new(),
                processes: BTreeMap::new(),
                calls: Vec::new(),
            })),
        }
    }

    /// Override the runtime of the worker spawned with `index`.
    pub fn set_runtime(&self, index: usize, runtime: Duration) -> &Self {
        let mut state = self.state.lock().unwrap();
        state.runtime_overrides.insert(index, runtime);
        self
    }

    /// Make spawning the worker with `index` fail.
    pub fn fail_spawn(&self, index: usize) -> &Self {
        let mut state = self.state.lock().unwrap();
        state.failing_spawns.insert(index);
        self
    }

    /// Set the exit status a collection of `pid` will report.
    pub fn set_exit(&self, pid: Pid, exit: WorkerExit) {
        let mut state = self.state.lock().unwrap();
        if let Some(p) = state.processes.get_mut(&pid) {
            p.exit = exit;
        }
    }

    /// Simulate another mechanism collecting `pid` behind the supervisor's
    /// back: it disappears from the table and `waitpid` reports ECHILD.
    pub fn reap_externally(&self, pid: Pid) {
        let mut state = self.state.lock().unwrap();
        if let Some(p) = state.processes.get_mut(&pid) {
            p.vanished = true;
        }
    }

    /// Pids in spawn order.
    pub fn pids(&self) -> Vec<Pid> {
        let state = self.state.lock().unwrap();
        state
            .calls
            .iter()
            .filter_map(|c| match c {
                TableCall::Spawn { pid, .. } => Some(*pid),
                _ => None,
            })
            .collect()
    }

    /// Pids that still hold a process-table entry only the supervisor could
    /// release.
    pub fn uncollected(&self) -> Vec<Pid> {
        let state = self.state.lock().unwrap();
        state
            .processes
            .iter()
            .filter(|(_, p)| !p.reaped && !p.vanished)
            .map(|(pid, _)| *pid)
            .collect()
    }

    pub fn calls(&self) -> Vec<TableCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of collection attempts (blocking or not) issued for `pid`.
    pub fn collection_attempts(&self, pid: Pid) -> usize {
        let state = self.state.lock().unwrap();
        state
            .calls
            .iter()
            .filter(|c| c.is_collection() && c.pid() == pid)
            .count()
    }

    /// Every state reported for `pid`, in query order.
    pub fn observed_states(&self, pid: Pid) -> Vec<ProcessState> {
        let state = self.state.lock().unwrap();
        state
            .calls
            .iter()
            .filter_map(|c| match c {
                TableCall::Query { pid: p, state } if *p == pid => Some(*state),
                _ => None,
            })
            .collect()
    }

    pub fn query_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state
            .calls
            .iter()
            .filter(|c| matches!(c, TableCall::Query { .. }))
            .count()
    }
}

impl ProcessTable for SimulatedProcessTable {
    fn spawn_worker(&mut self, index: usize) -> Result<Pid> {
        let mut state = self.state.lock().unwrap();

        if state.failing_spawns.contains(&index) {
            return Err(ForkwatchError::Spawn {
                index,
                source: io::Error::new(io::ErrorKind::WouldBlock, "simulated fork failure"),
            });
        }

        let pid = Pid::from_raw(state.next_pid);
        state.next_pid += 1;

        let runtime = state
            .runtime_overrides
            .get(&index)
            .copied()
            .unwrap_or_else(|| state.schedule.duration_for(index));

        state.processes.insert(
            pid,
            SimProcess {
                started: Instant::now(),
                runtime,
                exit: WorkerExit::Exited(0),
                vanished: false,
                reaped: false,
            },
        );
        state.calls.push(TableCall::Spawn { index, pid });
        Ok(pid)
    }

    fn query_state(&mut self, pid: Pid) -> ProcessState {
        let mut state = self.state.lock().unwrap();
        let now = Instant::now();
        let observed = state
            .processes
            .get(&pid)
            .map(|p| p.state_at(now))
            .unwrap_or(ProcessState::Gone);
        state.calls.push(TableCall::Query {
            pid,
            state: observed,
        });
        observed
    }

    fn try_collect(&mut self, pid: Pid) -> Result<CollectOutcome> {
        let mut state = self.state.lock().unwrap();
        let now = Instant::now();
        let outcome = match state.processes.get_mut(&pid) {
            Some(p) if !p.vanished && !p.reaped => {
                if now >= p.deadline() {
                    p.reaped = true;
                    CollectOutcome::Reaped(p.exit)
                } else {
                    CollectOutcome::StillRunning
                }
            }
            _ => CollectOutcome::NoSuchChild,
        };
        state.calls.push(TableCall::TryCollect { pid, outcome });
        Ok(outcome)
    }

    fn collect(&mut self, pid: Pid) -> Result<CollectOutcome> {
        let mut state = self.state.lock().unwrap();
        let now = Instant::now();
        let (outcome, waited) = match state.processes.get_mut(&pid) {
            Some(p) if !p.vanished && !p.reaped => {
                p.reaped = true;
                (
                    CollectOutcome::Reaped(p.exit),
                    p.deadline().saturating_duration_since(now),
                )
            }
            _ => (CollectOutcome::NoSuchChild, Duration::ZERO),
        };
        state.calls.push(TableCall::Collect {
            pid,
            outcome,
            waited,
        });
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[tokio::test(start_paused = true)]
    async fn workers_turn_zombie_after_their_runtime() {
        let mut table = SimulatedProcessTable::new(WorkSchedule::new(secs(3), secs(1)));
        let a = table.spawn_worker(0).unwrap();
        let b = table.spawn_worker(1).unwrap();

        assert_eq!(table.query_state(a), ProcessState::Running);

        tokio::time::sleep(secs(3)).await;
        assert_eq!(table.query_state(a), ProcessState::Terminated);
        assert_eq!(table.query_state(b), ProcessState::Running);

        assert_eq!(
            table.try_collect(a).unwrap(),
            CollectOutcome::Reaped(WorkerExit::Exited(0))
        );
        assert_eq!(table.query_state(a), ProcessState::Gone);
        assert_eq!(table.try_collect(b).unwrap(), CollectOutcome::StillRunning);
    }

    #[tokio::test(start_paused = true)]
    async fn blocking_collect_records_wait_time() {
        let mut table = SimulatedProcessTable::new(WorkSchedule::new(secs(5), secs(0)));
        let pid = table.spawn_worker(0).unwrap();

        tokio::time::sleep(secs(2)).await;
        table.collect(pid).unwrap();

        match table.calls().last() {
            Some(TableCall::Collect { waited, .. }) => assert_eq!(*waited, secs(3)),
            other => panic!("expected Collect call, got {other:?}"),
        }
        assert!(table.uncollected().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn externally_reaped_pid_is_gone_and_not_a_child() {
        let mut table = SimulatedProcessTable::new(WorkSchedule::default());
        let pid = table.spawn_worker(0).unwrap();
        table.reap_externally(pid);

        assert_eq!(table.query_state(pid), ProcessState::Gone);
        assert_eq!(table.try_collect(pid).unwrap(), CollectOutcome::NoSuchChild);
        assert!(table.uncollected().is_empty());
    }

    #[test]
    fn failing_spawn_creates_nothing() {
        let mut table = SimulatedProcessTable::new(WorkSchedule::default());
        table.fail_spawn(1);

        assert!(table.spawn_worker(0).is_ok());
        assert!(matches!(
            table.spawn_worker(1),
            Err(ForkwatchError::Spawn { index: 1, .. })
        ));
        assert_eq!(table.pids().len(), 1);
    }
}
