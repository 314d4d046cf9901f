//! Running the real `forkwatch` binary with a deadline.
//!
//! A supervisor that never finishes would otherwise hang the test run, so
//! every wait here is bounded; on expiry the child is killed with SIGKILL and
//! the test panics.

use std::process::{Child, Command, Output};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

/// Upper bound used by [`output_within`] callers that have no better figure.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Wait for `child` to exit and collect its output, killing it after `limit`.
pub fn wait_within(child: Child, limit: Duration) -> Output {
    let pid = Pid::from_raw(child.id() as i32);
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let _ = tx.send(child.wait_with_output());
    });

    match rx.recv_timeout(limit) {
        Ok(result) => result.expect("failed to collect child output"),
        Err(_) => {
            let _ = kill(pid, Signal::SIGKILL);
            panic!("forkwatch (pid {pid}) still running after {limit:?}");
        }
    }
}

/// Spawn `cmd` and wait for it with [`wait_within`].
pub fn output_within(cmd: &mut Command, limit: Duration) -> Output {
    let child = cmd.spawn().expect("failed to spawn forkwatch");
    wait_within(child, limit)
}
