// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `forkwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "forkwatch",
    version,
    about = "Spawn a fleet of worker processes and reap every one of them.",
    long_about = None
)]
pub struct CliArgs {
    /// Number of worker processes to spawn.
    ///
    /// If omitted, `[supervisor].workers` from the config file is used, and
    /// failing that the count is read interactively from stdin.
    #[arg(long, short = 'n', value_name = "N")]
    pub count: Option<usize>,

    /// Path to the config file (TOML).
    ///
    /// If omitted, `Forkwatch.toml` in the current working directory is used
    /// when present; otherwise built-in defaults apply.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Override the polling interval (e.g. "500ms", "1s").
    #[arg(long, value_name = "DURATION")]
    pub poll_interval: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FORKWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve config and print the fleet plan, but don't spawn anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Run as a worker with the given task index (set by the supervisor).
    #[arg(long, value_name = "INDEX", hide = true)]
    pub internal_worker: Option<usize>,

    /// Base work duration in milliseconds for worker mode.
    #[arg(long, value_name = "MS", hide = true)]
    pub work_base_ms: Option<u64>,

    /// Per-index work duration increment in milliseconds for worker mode.
    #[arg(long, value_name = "MS", hide = true)]
    pub work_step_ms: Option<u64>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supervisor_flags() {
        let args = CliArgs::parse_from([
            "forkwatch",
            "--count",
            "3",
            "--poll-interval",
            "250ms",
            "--dry-run",
        ]);
        assert_eq!(args.count, Some(3));
        assert_eq!(args.poll_interval.as_deref(), Some("250ms"));
        assert!(args.dry_run);
        assert!(args.internal_worker.is_none());
    }

    #[test]
    fn parses_hidden_worker_flags() {
        let args = CliArgs::parse_from([
            "forkwatch",
            "--internal-worker",
            "2",
            "--work-base-ms",
            "3000",
            "--work-step-ms",
            "1000",
        ]);
        assert_eq!(args.internal_worker, Some(2));
        assert_eq!(args.work_base_ms, Some(3000));
        assert_eq!(args.work_step_ms, Some(1000));
    }
}
