//! Command-line interface
//!
//! Argument parsing with clap, merging of CLI overrides into the file
//! configuration, and the `serve`, `migrate` and `seed` handlers.

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment, LogLevel};

use anyhow::Context;

use crate::config::settings::Settings;
use crate::logger::init_logger;

/// Loads the configuration the CLI selects and applies its overrides.
///
/// # Errors
/// Returns an error if loading, merging or validation fails.
pub fn load_and_merge_config(cli: &Cli) -> anyhow::Result<Settings> {
    let merger = ConfigurationMerger::from_cli(cli).context("Failed to load configuration")?;
    merger
        .merge_cli_args(cli)
        .context("Invalid configuration after applying command-line overrides")
}

/// Installs the global tracing subscriber described by `settings.logger`.
///
/// # Errors
/// Returns an error if the logger settings are invalid or a subscriber is
/// already installed.
pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<()> {
    let config = settings
        .logger
        .to_logger_config()
        .context("Invalid logger configuration")?;
    init_logger(config).context("Failed to initialize logger")
}
