//! Winprobe CLI Library
//!
//! Command-line front end for the winprobe calculator automation suite:
//! argument parsing, configuration resolution, progress output and the
//! scenario runner.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
mod runner;

pub use commands::{
    CheckConfigArgs, Cli, ColorArg, Commands, ConfigSource, FormatArg, ListArgs, RunArgs,
};
pub use config::{
    resolve_probe_config, resolve_with_env, CliConfig, ColorChoice, LogFormat, Verbosity,
};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, ProgressReporter};
pub use runner::{Backend, RunOptions, RunOutcome, TestRunner};
