// src/config/mod.rs

//! Configuration loading and validation for forkwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Parse human-friendly durations such as `"500ms"` (`duration.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate and convert raw values into typed settings (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path, resolve_config};
pub use model::{
    ConfigFile, RawConfigFile, RawSupervisorSection, RawWorkerSection, SupervisorConfig,
};
