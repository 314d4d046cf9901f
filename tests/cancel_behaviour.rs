// tests/cancel_behaviour.rs

use std::error::Error;
use std::time::Duration;

use nix::errno::Errno;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use forkwatch::errors::ForkwatchError;
use forkwatch::process::{SimulatedProcessTable, TableCall};
use forkwatch::supervisor::{MonitorOptions, MonitorOutcome, ReapPath, Supervisor};
use forkwatch::types::{LifecycleState, ProcessState};
use forkwatch::worker::WorkSchedule;
use forkwatch_test_utils::init_tracing;
use forkwatch_test_utils::scripted_table::{CollectScript, ScriptedProcessTable};

type TestResult = Result<(), Box<dyn Error>>;

fn options() -> MonitorOptions {
    MonitorOptions {
        poll_interval: Duration::from_secs(1),
    }
}

#[tokio::test(start_paused = true)]
async fn cancellation_while_workers_run_still_collects_all() -> TestResult {
    init_tracing();
    let table = SimulatedProcessTable::new(WorkSchedule::new(
        Duration::from_secs(3),
        Duration::from_secs(1),
    ));
    let mut sup = Supervisor::new(table.clone(), options());
    let cancel = CancellationToken::new();
    sup.spawn_fleet(3, &cancel)?;

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            cancel.cancel();
        });
    }

    let start = Instant::now();
    let report = sup.monitor_and_reap(&cancel).await?;

    assert_eq!(report.outcome, MonitorOutcome::Cancelled);
    assert_eq!(start.elapsed(), Duration::from_millis(2500));
    // Rounds at t = 0, 1, 2; the interrupt lands during the third sleep.
    assert_eq!(report.rounds, 3);

    assert!(sup.registry().is_empty());
    assert!(table.uncollected().is_empty());
    assert_eq!(report.by_path(ReapPath::FinalPass).count(), 3);

    // Every worker was still running, so each final collection blocked.
    let waits: Vec<_> = table
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            TableCall::Collect { waited, .. } => Some(waited),
            _ => None,
        })
        .collect();
    assert_eq!(
        waits,
        vec![
            Duration::from_millis(500),
            Duration::from_millis(1500),
            Duration::from_millis(2500)
        ]
    );

    for pid in table.pids() {
        assert_eq!(table.collection_attempts(pid), 1);
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancellation_after_some_workers_finished() -> TestResult {
    let table = SimulatedProcessTable::new(WorkSchedule::new(
        Duration::from_secs(1),
        Duration::from_secs(3),
    ));
    let mut sup = Supervisor::new(table.clone(), options());
    let cancel = CancellationToken::new();
    sup.spawn_fleet(2, &cancel)?;

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            cancel.cancel();
        });
    }

    let report = sup.monitor_and_reap(&cancel).await?;

    assert!(report.is_cancelled());
    assert_eq!(report.reaped(), 2);
    let zombie = report.collections.iter().find(|c| c.index == 0).unwrap();
    assert_eq!(
        zombie.lifecycle,
        vec![
            LifecycleState::Running,
            LifecycleState::TerminatedUnreaped,
            LifecycleState::Reaped
        ]
    );
    let runner = report.collections.iter().find(|c| c.index == 1).unwrap();
    assert_eq!(
        runner.lifecycle,
        vec![LifecycleState::Running, LifecycleState::Reaped]
    );
    assert!(table.uncollected().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancellation_in_the_middle_of_a_round() -> TestResult {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    // Two workers; the interrupt fires on the 3rd query, i.e. during the
    // second round.
    let table = ScriptedProcessTable::new()
        .script(0, &[ProcessState::Running])
        .script(1, &[ProcessState::Running, ProcessState::Terminated])
        .on_query(move |n| {
            if n == 3 {
                trigger.cancel();
            }
        });
    let mut sup = Supervisor::new(table.clone(), options());
    sup.spawn_fleet(2, &cancel)?;

    let report = sup.monitor_and_reap(&cancel).await?;

    assert!(report.is_cancelled());
    assert_eq!(report.rounds, 2);
    assert!(sup.registry().is_empty());
    assert_eq!(table.total_queries(), 4);
    assert_eq!(table.blocking_collections(), table.spawned());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn collection_error_still_empties_the_registry() -> TestResult {
    let table = ScriptedProcessTable::new()
        .script(0, &[ProcessState::Terminated])
        .script(1, &[ProcessState::Terminated])
        .script(2, &[ProcessState::Terminated])
        .collect_as(0, CollectScript::Fail(Errno::EINVAL));
    let mut sup = Supervisor::new(table.clone(), options());
    let cancel = CancellationToken::new();
    sup.spawn_fleet(3, &cancel)?;

    let err = sup.monitor_and_reap(&cancel).await.unwrap_err();

    assert!(matches!(
        err,
        ForkwatchError::Collect {
            source: Errno::EINVAL,
            ..
        }
    ));
    assert!(sup.registry().is_empty());
    for pid in table.spawned() {
        assert_eq!(table.collection_attempts(pid), 1);
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn benign_no_such_child_during_harvest_is_not_an_error() -> TestResult {
    let table = ScriptedProcessTable::new()
        .script(0, &[ProcessState::Terminated])
        .collect_as(0, CollectScript::NoSuchChild);
    let mut sup = Supervisor::new(table.clone(), options());
    let cancel = CancellationToken::new();
    sup.spawn_fleet(1, &cancel)?;

    let report = sup.monitor_and_reap(&cancel).await?;

    assert_eq!(report.outcome, MonitorOutcome::Completed);
    assert_eq!(report.collections[0].path, ReapPath::Harvested);
    assert_eq!(report.collections[0].exit, None);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn spawn_failure_reaps_the_partial_fleet() -> TestResult {
    let table = SimulatedProcessTable::new(WorkSchedule::new(
        Duration::from_secs(2),
        Duration::ZERO,
    ));
    table.fail_spawn(2);
    let mut sup = Supervisor::new(table.clone(), options());
    let cancel = CancellationToken::new();

    let spawned = sup.spawn_fleet(4, &cancel);
    assert!(matches!(spawned, Err(ForkwatchError::Spawn { index: 2, .. })));
    cancel.cancel();

    let report = sup.monitor_and_reap(&cancel).await?;
    assert_eq!(report.reaped(), 2);
    assert!(table.uncollected().is_empty());
    Ok(())
}
