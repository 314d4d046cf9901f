// src/logging.rs

//! Log output for the supervisor and its workers.
//!
//! Events go to stderr so stdout stays reserved for the worker lines and the
//! final summary. Workers inherit the environment, so `FORKWATCH_LOG` set for
//! the supervisor applies to the whole fleet.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::cli::LogLevel;

/// Environment variable holding an `EnvFilter` directive string, e.g.
/// `debug` or `forkwatch::supervisor=trace,info`.
pub const LOG_ENV_VAR: &str = "FORKWATCH_LOG";

/// Install the global subscriber. `--log-level` wins over `FORKWATCH_LOG`;
/// with neither, `info` and above is shown.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env_value.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> EnvFilter {
    let fallback = || EnvFilter::default().add_directive(LevelFilter::INFO.into());

    match (cli_level, env_value) {
        (Some(level), _) => EnvFilter::default().add_directive(level_filter(level).into()),
        (None, Some(directives)) => EnvFilter::try_new(directives).unwrap_or_else(|_| fallback()),
        (None, None) => fallback(),
    }
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_overrides_environment() {
        let filter = build_filter(Some(LogLevel::Warn), Some("trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn environment_accepts_per_module_directives() {
        let filter = build_filter(None, Some("forkwatch::supervisor=trace,warn"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn defaults_to_info() {
        assert_eq!(build_filter(None, None).max_level_hint(), Some(LevelFilter::INFO));
    }
}
