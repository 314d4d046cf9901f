// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::worker::WorkSchedule;

/// Raw configuration as read from a TOML file.
///
/// ```toml
/// [supervisor]
/// workers = 3
/// poll_interval = "1s"
/// startup_delay = "1s"
/// settle_delay = "1s"
///
/// [worker]
/// base_duration = "3s"
/// step = "1s"
/// ```
///
/// All sections are optional and have reasonable defaults. Durations are kept
/// as strings here; [`ConfigFile`] holds the parsed, validated form.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub supervisor: RawSupervisorSection,

    #[serde(default)]
    pub worker: RawWorkerSection,
}

/// `[supervisor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSupervisorSection {
    /// Worker count used when `--count` is not given.
    #[serde(default)]
    pub workers: Option<usize>,

    /// Time between two polling rounds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Pause before the first worker is spawned.
    #[serde(default = "default_delay")]
    pub startup_delay: String,

    /// Pause between spawning the fleet and the first polling round, giving
    /// workers time to start up.
    #[serde(default = "default_delay")]
    pub settle_delay: String,
}

fn default_poll_interval() -> String {
    "1s".to_string()
}

fn default_delay() -> String {
    "1s".to_string()
}

impl Default for RawSupervisorSection {
    fn default() -> Self {
        Self {
            workers: None,
            poll_interval: default_poll_interval(),
            startup_delay: default_delay(),
            settle_delay: default_delay(),
        }
    }
}

/// `[worker]` section: simulated work takes `base_duration + index * step`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkerSection {
    #[serde(default = "default_base_duration")]
    pub base_duration: String,

    #[serde(default = "default_step")]
    pub step: String,
}

fn default_base_duration() -> String {
    "3s".to_string()
}

fn default_step() -> String {
    "1s".to_string()
}

impl Default for RawWorkerSection {
    fn default() -> Self {
        Self {
            base_duration: default_base_duration(),
            step: default_step(),
        }
    }
}

/// Validated supervisor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub workers: Option<usize>,
    pub poll_interval: Duration,
    pub startup_delay: Duration,
    pub settle_delay: Duration,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// `Default`, so holders can rely on every duration being parsed and the
/// poll interval being non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigFile {
    pub supervisor: SupervisorConfig,
    pub worker: WorkSchedule,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(supervisor: SupervisorConfig, worker: WorkSchedule) -> Self {
        Self { supervisor, worker }
    }

    /// Replace the poll interval, e.g. from `--poll-interval`.
    ///
    /// A zero interval is ignored and the configured one kept.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.supervisor.poll_interval = interval;
        }
        self
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            SupervisorConfig {
                workers: None,
                poll_interval: Duration::from_secs(1),
                startup_delay: Duration::from_secs(1),
                settle_delay: Duration::from_secs(1),
            },
            WorkSchedule::default(),
        )
    }
}
