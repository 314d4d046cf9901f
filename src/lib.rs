// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod process;
pub mod prompt;
pub mod signals;
pub mod supervisor;
pub mod types;
pub mod worker;

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow, bail};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, parse_duration, resolve_config};
use crate::process::UnixProcessTable;
use crate::supervisor::{MonitorOptions, MonitorReport, Supervisor};
use crate::worker::WorkSchedule;

/// High-level entry point used by `main.rs`.
///
/// In worker mode (`--internal-worker`) this runs the worker task and
/// returns. Otherwise it wires together:
/// - config loading and the worker count
/// - signal handling
/// - spawning the fleet
/// - the monitoring / reaping loop
/// - the final summary
pub async fn run(args: CliArgs) -> Result<()> {
    if let Some(index) = args.internal_worker {
        let defaults = WorkSchedule::default().as_millis();
        let schedule = WorkSchedule::from_millis(
            args.work_base_ms.unwrap_or(defaults.0),
            args.work_step_ms.unwrap_or(defaults.1),
        );
        worker::run(index, schedule).await?;
        return Ok(());
    }

    let mut cfg = resolve_config(args.config.as_deref().map(Path::new))?;

    if let Some(ref raw) = args.poll_interval {
        let interval = parse_duration(raw).map_err(|e| anyhow!("--poll-interval: {e}"))?;
        if interval.is_zero() {
            bail!("--poll-interval must be greater than zero");
        }
        cfg = cfg.with_poll_interval(interval);
    }

    let count = args.count.or(cfg.supervisor.workers);

    if args.dry_run {
        print_dry_run(&cfg, count);
        return Ok(());
    }

    let count = match count {
        Some(n) => n,
        None => prompt::prompt_count()?,
    };

    supervise(count, &cfg).await
}

async fn supervise(count: usize, cfg: &ConfigFile) -> Result<()> {
    let started = Instant::now();
    info!(pid = std::process::id(), count, "supervisor started");

    let cancel = CancellationToken::new();
    let signal_task = signals::spawn_cancel_on_signal(cancel.clone())?;

    pause(cfg.supervisor.startup_delay, &cancel).await;

    let table = UnixProcessTable::new(cfg.worker)?;
    let options = MonitorOptions {
        poll_interval: cfg.supervisor.poll_interval,
    };
    let mut supervisor = Supervisor::new(table, options);

    let spawned = supervisor.spawn_fleet(count, &cancel);
    match &spawned {
        Ok(n) => {
            debug!(spawned = n, "fleet spawned");
            pause(cfg.supervisor.settle_delay, &cancel).await;
        }
        Err(e) => {
            error!(error = %e, "spawning failed; reaping the workers already started");
            cancel.cancel();
        }
    }

    let monitored = supervisor.monitor_and_reap(&cancel).await;

    // Stop the signal listener if it is still waiting.
    cancel.cancel();
    if let Err(e) = signal_task.await {
        warn!(error = %e, "signal listener task failed");
    }

    finish(spawned, monitored, started.elapsed())
}

/// Report the run once every worker has been collected.
///
/// A spawn failure and a monitoring failure can both happen in one run; the
/// monitoring error is then attached as context to the spawn error.
fn finish(
    spawned: errors::Result<usize>,
    monitored: errors::Result<MonitorReport>,
    elapsed: Duration,
) -> Result<()> {
    match (spawned, monitored) {
        (Ok(_), Ok(report)) => {
            print_summary(&report, elapsed);
            Ok(())
        }
        (Err(spawn), Ok(report)) => {
            print_summary(&report, elapsed);
            Err(spawn.into())
        }
        (Ok(_), Err(monitor)) => Err(monitor.into()),
        (Err(spawn), Err(monitor)) => {
            Err(anyhow::Error::from(spawn).context(format!("monitoring also failed: {monitor}")))
        }
    }
}

/// Sleep for `duration` unless cancelled first.
async fn pause(duration: Duration, cancel: &CancellationToken) {
    if duration.is_zero() {
        return;
    }
    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(duration) => {}
    }
}

fn print_summary(report: &MonitorReport, elapsed: Duration) {
    if report.is_cancelled() {
        println!("monitoring interrupted; collected {} workers", report.reaped());
    } else {
        println!("all {} workers finished and were collected", report.reaped());
    }

    for c in report.failures() {
        if let Some(exit) = c.exit {
            println!("  worker {} (pid {}) {}", c.index, c.pid, exit);
        }
    }

    println!(
        "supervisor finished after {} polling rounds in {:.2} seconds",
        report.rounds,
        elapsed.as_secs_f64()
    );
}

/// Dry-run output: the resolved plan, nothing spawned.
fn print_dry_run(cfg: &ConfigFile, count: Option<usize>) {
    println!("forkwatch dry-run");
    println!("  supervisor.poll_interval = {:?}", cfg.supervisor.poll_interval);
    println!("  supervisor.startup_delay = {:?}", cfg.supervisor.startup_delay);
    println!("  supervisor.settle_delay = {:?}", cfg.supervisor.settle_delay);
    println!();

    match count {
        Some(n) => {
            println!("workers ({n}):");
            for index in 0..n {
                println!("  - worker {index}: works for {:?}", cfg.worker.duration_for(index));
            }
        }
        None => println!("workers: count will be asked for on stdin"),
    }

    debug!("dry-run complete (nothing spawned)");
}
