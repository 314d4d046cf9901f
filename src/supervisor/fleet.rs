// src/supervisor/fleet.rs

//! Synchronous core of the supervisor.
//!
//! Owns the registry and the process table and knows how to:
//! - spawn the fleet,
//! - run one polling round,
//! - collect whatever is left during cleanup.
//!
//! Nothing here sleeps or looks at cancellation; that's the async loop in
//! `monitor.rs`.

use nix::unistd::Pid;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::process::ProcessTable;
use crate::types::{CollectOutcome, ProcessState};

use super::registry::FleetRegistry;
use super::report::{Collection, MonitorOutcome, MonitorReport, ReapPath};
use super::{MonitorOptions, RoundOutcome};

#[derive(Debug)]
pub struct Supervisor<P: ProcessTable> {
    table: P,
    registry: FleetRegistry,
    pub(super) options: MonitorOptions,
    rounds: u32,
    collections: Vec<Collection>,
}

impl<P: ProcessTable> Supervisor<P> {
    pub fn new(table: P, options: MonitorOptions) -> Self {
        Self {
            table,
            registry: FleetRegistry::new(),
            options,
            rounds: 0,
            collections: Vec::new(),
        }
    }

    pub fn registry(&self) -> &FleetRegistry {
        &self.registry
    }

    /// Spawn workers `0..count`, registering each one as `Running`.
    ///
    /// Returns how many were spawned. Stops early, without error, when
    /// `cancel` fires. A failed spawn registers nothing and returns the
    /// error; workers spawned before it stay registered so they still get
    /// reaped by `monitor_and_reap`.
    pub fn spawn_fleet(&mut self, count: usize, cancel: &CancellationToken) -> Result<usize> {
        for index in 0..count {
            if cancel.is_cancelled() {
                warn!(
                    spawned = index,
                    requested = count,
                    "cancellation requested; not spawning remaining workers"
                );
                return Ok(index);
            }

            let pid = self.table.spawn_worker(index)?;
            self.registry.insert(pid, index);
            info!(index, pid = pid.as_raw(), "spawned worker");
        }
        Ok(count)
    }

    /// Run one polling round.
    ///
    /// 1. Query every outstanding worker, in spawn order.
    /// 2. Collect, without blocking, every worker that vanished from the
    ///    process table. "No such child" is expected here.
    /// 3. If that emptied the registry, the fleet is done.
    /// 4. If every remaining worker was a zombie this round, collect them all
    ///    (blocking, but they have already exited) and finish.
    pub fn poll_round(&mut self) -> Result<RoundOutcome> {
        self.rounds += 1;
        let round = self.rounds;

        let mut running = 0;
        let mut vanished = Vec::new();

        for pid in self.registry.pids() {
            let observed = self.table.query_state(pid);
            let lifecycle = self.registry.observe(pid, observed);
            debug!(round, pid = pid.as_raw(), ?observed, ?lifecycle, "worker state");

            match observed {
                ProcessState::Running => running += 1,
                ProcessState::Terminated => {}
                ProcessState::Gone => vanished.push(pid),
            }
        }

        for pid in vanished {
            self.collect_vanished(round, pid)?;
        }

        if self.registry.is_empty() {
            info!(round, "every worker vanished from the process table");
            return Ok(RoundOutcome::Drained);
        }

        if running == 0 {
            let harvested = self.harvest(round)?;
            return Ok(RoundOutcome::Harvested(harvested));
        }

        debug!(round, running, outstanding = self.registry.len(), "fleet still running");
        Ok(RoundOutcome::Pending { running })
    }

    fn collect_vanished(&mut self, round: u32, pid: Pid) -> Result<()> {
        info!(round, pid = pid.as_raw(), "worker left the process table; collecting");
        let result = self.table.try_collect(pid);
        self.record(pid, ReapPath::Vanished, result.as_ref().ok());

        match result? {
            CollectOutcome::Reaped(exit) => {
                debug!(pid = pid.as_raw(), %exit, "collected vanished worker")
            }
            CollectOutcome::NoSuchChild => {
                debug!(pid = pid.as_raw(), "vanished worker was already collected")
            }
            CollectOutcome::StillRunning => warn!(
                pid = pid.as_raw(),
                "pid absent from process table but waitpid reports it alive; dropping it"
            ),
        }
        Ok(())
    }

    fn harvest(&mut self, round: u32) -> Result<usize> {
        let pids = self.registry.pids();
        info!(round, zombies = pids.len(), "all remaining workers are zombies; collecting");

        for &pid in &pids {
            let result = self.table.collect(pid);
            self.record(pid, ReapPath::Harvested, result.as_ref().ok());
            if let CollectOutcome::Reaped(exit) = result? {
                info!(pid = pid.as_raw(), %exit, "reaped worker");
            }
        }
        Ok(pids.len())
    }

    /// Blocking collection of everything still registered.
    ///
    /// Used on the cancellation and error paths. Failures are logged and the
    /// pass carries on, so the registry is always empty afterwards.
    pub fn final_collection_pass(&mut self) -> usize {
        let pids = self.registry.pids();
        if pids.is_empty() {
            return 0;
        }
        info!(remaining = pids.len(), "final collection pass");

        for &pid in &pids {
            let result = self.table.collect(pid);
            self.record(pid, ReapPath::FinalPass, result.as_ref().ok());
            match result {
                Ok(CollectOutcome::Reaped(exit)) => {
                    info!(pid = pid.as_raw(), %exit, "reaped worker during cleanup")
                }
                Ok(other) => debug!(pid = pid.as_raw(), outcome = ?other, "nothing to reap"),
                Err(e) => error!(pid = pid.as_raw(), error = %e, "collection failed during cleanup"),
            }
        }
        pids.len()
    }

    /// Move `pid` out of the registry and log the collection.
    fn record(&mut self, pid: Pid, path: ReapPath, outcome: Option<&CollectOutcome>) {
        if let Some(handle) = self.registry.reap(pid) {
            self.collections.push(Collection {
                pid,
                index: handle.index(),
                path,
                exit: outcome.and_then(CollectOutcome::exit),
                lifecycle: handle.history().to_vec(),
            });
        }
    }

    pub(super) fn take_report(&mut self, outcome: MonitorOutcome) -> MonitorReport {
        MonitorReport {
            outcome,
            rounds: self.rounds,
            collections: std::mem::take(&mut self.collections),
        }
    }
}
