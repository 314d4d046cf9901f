// tests/fleet_properties.rs

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use forkwatch::process::SimulatedProcessTable;
use forkwatch::supervisor::{MonitorOptions, MonitorReport, Supervisor};
use forkwatch::types::LifecycleState;
use forkwatch::worker::WorkSchedule;

fn block_on_paused<F: Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("build paused runtime")
        .block_on(f)
}

#[derive(Debug, Clone)]
struct Scenario {
    runtimes_ms: Vec<u64>,
    vanished: Vec<usize>,
    cancel_after_ms: Option<u64>,
    poll_ms: u64,
}

fn scenario_strategy() -> impl Strategy<Value = Scenario> {
    (0..8usize).prop_flat_map(|n| {
        (
            proptest::collection::vec(0..5_000u64, n),
            proptest::collection::vec(0..8usize, 0..4),
            proptest::option::of(0..6_000u64),
            100..1_500u64,
        )
            .prop_map(|(runtimes_ms, vanished, cancel_after_ms, poll_ms)| Scenario {
                runtimes_ms,
                vanished,
                cancel_after_ms,
                poll_ms,
            })
    })
}

fn run_scenario(s: &Scenario) -> (MonitorReport, SimulatedProcessTable, usize) {
    block_on_paused(async {
        let table = SimulatedProcessTable::new(WorkSchedule::default());
        for (index, ms) in s.runtimes_ms.iter().enumerate() {
            table.set_runtime(index, Duration::from_millis(*ms));
        }

        let options = MonitorOptions {
            poll_interval: Duration::from_millis(s.poll_ms),
        };
        let mut sup = Supervisor::new(table.clone(), options);
        let cancel = CancellationToken::new();
        sup.spawn_fleet(s.runtimes_ms.len(), &cancel).unwrap();

        let pids = table.pids();
        for index in &s.vanished {
            if let Some(pid) = pids.get(*index) {
                table.reap_externally(*pid);
            }
        }

        if let Some(ms) = s.cancel_after_ms {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                cancel.cancel();
            });
        }

        let report = sup.monitor_and_reap(&cancel).await.unwrap();
        (report, table, sup.registry().len())
    })
}

fn is_allowed_lifecycle(states: &[LifecycleState]) -> bool {
    use LifecycleState::*;
    matches!(
        states,
        [Running, Reaped] | [Running, TerminatedUnreaped, Reaped] | [Running, Gone, Reaped]
    )
}

proptest! {
    #[test]
    fn fleet_is_always_fully_collected(s in scenario_strategy()) {
        let (report, table, remaining) = run_scenario(&s);

        // No leaks: nothing left in the registry or the process table.
        prop_assert_eq!(remaining, 0);
        prop_assert!(table.uncollected().is_empty());
        prop_assert_eq!(report.reaped(), s.runtimes_ms.len());

        // Each pid collected exactly once.
        let mut seen = HashSet::new();
        for pid in table.pids() {
            prop_assert_eq!(table.collection_attempts(pid), 1);
            prop_assert!(seen.insert(pid));
        }
    }

    #[test]
    fn lifecycle_only_moves_forward(s in scenario_strategy()) {
        let (report, table, _) = run_scenario(&s);

        for c in &report.collections {
            prop_assert!(is_allowed_lifecycle(&c.lifecycle), "{:?}", c.lifecycle);
        }

        for pid in table.pids() {
            let observed = table.observed_states(pid);
            if let Some(first_done) = observed
                .iter()
                .position(|st| *st != forkwatch::types::ProcessState::Running)
            {
                prop_assert!(observed[first_done..]
                    .iter()
                    .all(|st| *st != forkwatch::types::ProcessState::Running));
            }
        }
    }
}
