//! Configuration loading, env substitution and validation.
//!
//! Config files: `tgdrive.toml`, `tgdrive.yaml`, `tgdrive.yml` or
//! `tgdrive.json`, searched in `./` then `~/.config/tgdrive/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw
//! file before parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    schema::{DriveConfig, MetricsConfig, QueueConfig, TelegramConfig, TgDriveConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
