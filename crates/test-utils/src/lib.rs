//! Shared helpers for forkwatch's integration tests.

pub mod binary;
pub mod builders;
pub mod scripted_table;

use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness's capture.
///
/// Filters with `FORKWATCH_LOG` (same variable as the binary), defaulting to
/// `info`. Only the first call installs the subscriber; later calls in the
/// same test binary are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("FORKWATCH_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
