// src/signals.rs

//! Shutdown signal handling.
//!
//! The supervisor never lets a signal unwind through the monitoring loop.
//! A background task waits for SIGINT, SIGTERM or SIGQUIT and cancels a
//! [`CancellationToken`]; the loop notices and runs its final collection
//! pass.

use std::io;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Registered shutdown signal handlers.
///
/// From [`ShutdownSignals::install`] on, the default "terminate" action no
/// longer applies; deliveries are queued until [`ShutdownSignals::recv`].
#[cfg(unix)]
pub struct ShutdownSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Must be called from within a tokio runtime.
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    pub async fn recv(&mut self) {
        tokio::select! {
            _ = self.interrupt.recv() => {},
            _ = self.terminate.recv() => {},
            _ = self.quit.recv() => {},
        }
    }
}

#[cfg(not(unix))]
pub struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    pub fn install() -> io::Result<Self> {
        Ok(Self)
    }

    pub async fn recv(&mut self) {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Cancel `token` when a shutdown signal arrives.
///
/// Handlers are registered before this returns, so a signal sent at any
/// point afterwards cancels the token instead of killing the process. The
/// task also ends quietly if the token is cancelled for another reason.
pub fn spawn_cancel_on_signal(token: CancellationToken) -> io::Result<JoinHandle<()>> {
    let mut signals = ShutdownSignals::install()?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = signals.recv() => {
                warn!("shutdown signal received; reaping workers before exit");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    }))
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    use super::*;

    #[tokio::test]
    async fn signal_sent_right_after_setup_cancels_token() {
        let token = CancellationToken::new();
        let task = spawn_cancel_on_signal(token.clone()).unwrap();

        // The listener task has not been polled yet.
        kill(Pid::this(), Signal::SIGQUIT).unwrap();

        tokio::time::timeout(Duration::from_secs(5), token.cancelled())
            .await
            .expect("token was not cancelled");
        task.await.unwrap();
    }

    #[tokio::test]
    async fn task_exits_when_token_is_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let task = spawn_cancel_on_signal(token.clone()).unwrap();

        token.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("listener did not stop")
            .unwrap();
    }
}
