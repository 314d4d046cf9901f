// src/config/validate.rs

use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, RawConfigFile, SupervisorConfig};
use crate::errors::{ForkwatchError, Result};
use crate::worker::WorkSchedule;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ForkwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let supervisor = validate_supervisor(&raw)?;
        let worker = validate_worker(&raw)?;
        Ok(ConfigFile::new_unchecked(supervisor, worker))
    }
}

fn validate_supervisor(cfg: &RawConfigFile) -> Result<SupervisorConfig> {
    let section = &cfg.supervisor;

    let poll_interval = field_duration("supervisor", "poll_interval", &section.poll_interval)?;
    if poll_interval.is_zero() {
        return Err(ForkwatchError::ConfigError(
            "[supervisor].poll_interval must be greater than zero".to_string(),
        ));
    }

    Ok(SupervisorConfig {
        workers: section.workers,
        poll_interval,
        startup_delay: field_duration("supervisor", "startup_delay", &section.startup_delay)?,
        settle_delay: field_duration("supervisor", "settle_delay", &section.settle_delay)?,
    })
}

fn validate_worker(cfg: &RawConfigFile) -> Result<WorkSchedule> {
    let section = &cfg.worker;
    Ok(WorkSchedule::new(
        field_duration("worker", "base_duration", &section.base_duration)?,
        field_duration("worker", "step", &section.step)?,
    ))
}

fn field_duration(section: &str, field: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| ForkwatchError::ConfigError(format!("[{section}].{field}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_to_default_config() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg, ConfigFile::default());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.supervisor.poll_interval = "0ms".to_string();

        match ConfigFile::try_from(raw) {
            Err(ForkwatchError::ConfigError(msg)) => assert!(msg.contains("poll_interval")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn bad_duration_names_the_field() {
        let mut raw = RawConfigFile::default();
        raw.worker.step = "soon".to_string();

        match ConfigFile::try_from(raw) {
            Err(ForkwatchError::ConfigError(msg)) => assert!(msg.contains("[worker].step")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn zero_delays_are_allowed() {
        let mut raw = RawConfigFile::default();
        raw.supervisor.startup_delay = "0s".to_string();
        raw.supervisor.settle_delay = "0ms".to_string();

        let cfg = ConfigFile::try_from(raw).unwrap();
        assert!(cfg.supervisor.startup_delay.is_zero());
        assert!(cfg.supervisor.settle_delay.is_zero());
    }

    #[test]
    fn huge_poll_interval_is_a_config_error() {
        let mut raw = RawConfigFile::default();
        raw.supervisor.poll_interval = "500000000000000000m".to_string();

        match ConfigFile::try_from(raw) {
            Err(ForkwatchError::ConfigError(msg)) => {
                assert!(msg.contains("[supervisor].poll_interval"));
                assert!(msg.contains("too large"));
            }
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }
}
