// src/process/unix.rs

//! Production process table backed by the operating system.
//!
//! Workers are started by re-executing the current binary with the hidden
//! `--internal-worker` flag. State queries read `/proc/<pid>/stat` on Linux
//! and fall back to `ps` elsewhere; collection goes through `waitpid`.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, trace};

use crate::errors::{ForkwatchError, Result};
use crate::process::ProcessTable;
use crate::types::{CollectOutcome, ProcessState, WorkerExit};
use crate::worker::WorkSchedule;

/// Process table that creates real child processes.
#[derive(Debug, Clone)]
pub struct UnixProcessTable {
    exe: PathBuf,
    schedule: WorkSchedule,
}

impl UnixProcessTable {
    /// Spawn workers from the currently running executable.
    pub fn new(schedule: WorkSchedule) -> Result<Self> {
        let exe = std::env::current_exe()?;
        Ok(Self::with_executable(exe, schedule))
    }

    /// Spawn workers from an explicit executable path.
    ///
    /// The executable must accept the `forkwatch` worker flags.
    pub fn with_executable(exe: impl Into<PathBuf>, schedule: WorkSchedule) -> Self {
        Self {
            exe: exe.into(),
            schedule,
        }
    }
}

impl ProcessTable for UnixProcessTable {
    fn spawn_worker(&mut self, index: usize) -> Result<Pid> {
        let (base_ms, step_ms) = self.schedule.as_millis();

        let mut cmd = Command::new(&self.exe);
        cmd.arg("--internal-worker")
            .arg(index.to_string())
            .arg("--work-base-ms")
            .arg(base_ms.to_string())
            .arg("--work-step-ms")
            .arg(step_ms.to_string())
            // The supervisor may be prompting on stdin; workers never read it.
            .stdin(Stdio::null());

        let child = cmd
            .spawn()
            .map_err(|source| ForkwatchError::Spawn { index, source })?;

        // Dropping a std `Child` neither waits nor kills; from here on the
        // pid is owned by the supervisor's registry and collected via
        // `waitpid`.
        let pid = Pid::from_raw(child.id() as i32);
        debug!(index, pid = pid.as_raw(), exe = ?self.exe, "worker process created");
        Ok(pid)
    }

    fn query_state(&mut self, pid: Pid) -> ProcessState {
        query_state(pid)
    }

    fn try_collect(&mut self, pid: Pid) -> Result<CollectOutcome> {
        wait_for(pid, Some(WaitPidFlag::WNOHANG))
    }

    fn collect(&mut self, pid: Pid) -> Result<CollectOutcome> {
        off_runtime(|| wait_for(pid, None))
    }
}

/// Run a blocking call, moving other tasks off this worker thread first when
/// on a multi-thread runtime. The current-thread runtime cannot hand tasks
/// off, so there the call simply blocks.
fn off_runtime<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Query the lifecycle state of any process by pid.
#[cfg(target_os = "linux")]
pub fn query_state(pid: Pid) -> ProcessState {
    let path = format!("/proc/{}/stat", pid.as_raw());
    match std::fs::read_to_string(&path) {
        Ok(contents) => parse_stat_state(&contents).unwrap_or_else(|| {
            debug!(pid = pid.as_raw(), "unparsable {path}; probing with kill");
            probe_alive(pid)
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ProcessState::Gone,
        Err(e) => {
            debug!(pid = pid.as_raw(), error = %e, "reading {path} failed; probing with kill");
            probe_alive(pid)
        }
    }
}

/// Query the lifecycle state of any process by pid.
#[cfg(not(target_os = "linux"))]
pub fn query_state(pid: Pid) -> ProcessState {
    let output = Command::new("ps")
        .args(["-o", "stat=", "-p", &pid.as_raw().to_string()])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();

    match output {
        Ok(out) => {
            let stat = String::from_utf8_lossy(&out.stdout);
            let stat = stat.trim();
            if stat.is_empty() {
                ProcessState::Gone
            } else if stat.starts_with('Z') {
                ProcessState::Terminated
            } else {
                ProcessState::Running
            }
        }
        Err(e) => {
            debug!(pid = pid.as_raw(), error = %e, "running ps failed; probing with kill");
            probe_alive(pid)
        }
    }
}

/// Extract the state field from the contents of `/proc/<pid>/stat`.
///
/// The command name (field 2) is wrapped in parentheses and may itself
/// contain spaces or `)`, so the state is taken after the *last* `)`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) fn parse_stat_state(contents: &str) -> Option<ProcessState> {
    let after_comm = &contents[contents.rfind(')')? + 1..];
    let state = after_comm.trim_start().chars().next()?;
    Some(match state {
        'Z' => ProcessState::Terminated,
        'X' | 'x' => ProcessState::Gone,
        _ => ProcessState::Running,
    })
}

/// Signal-0 liveness probe. Cannot tell zombies apart from live processes.
fn probe_alive(pid: Pid) -> ProcessState {
    match kill(pid, None) {
        Err(Errno::ESRCH) => ProcessState::Gone,
        _ => ProcessState::Running,
    }
}

fn wait_for(pid: Pid, flags: Option<WaitPidFlag>) -> Result<CollectOutcome> {
    loop {
        match waitpid(pid, flags) {
            Ok(WaitStatus::StillAlive) => return Ok(CollectOutcome::StillRunning),
            Ok(WaitStatus::Exited(_, code)) => {
                return Ok(CollectOutcome::Reaped(WorkerExit::Exited(code)));
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                return Ok(CollectOutcome::Reaped(WorkerExit::Signaled(signal)));
            }
            Ok(other) => {
                trace!(pid = pid.as_raw(), status = ?other, "non-terminal wait status");
                if flags.is_some() {
                    return Ok(CollectOutcome::StillRunning);
                }
            }
            Err(Errno::ECHILD) => return Ok(CollectOutcome::NoSuchChild),
            Err(Errno::EINTR) => continue,
            Err(source) => {
                return Err(ForkwatchError::Collect {
                    pid: pid.as_raw(),
                    source,
                });
            }
        }
    }
}
