//! CLI command definitions using clap

use crate::config::ColorChoice;
use crate::output::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use winprobe::ConfigOverrides;

/// Winprobe: page-object UI automation for Windows Calculator
#[derive(Parser, Debug)]
#[command(name = "winprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run calculator scenarios
    Run(RunArgs),

    /// List the scenario catalogue
    List(ListArgs),

    /// Validate a configuration file and print the resolved settings
    CheckConfig(CheckConfigArgs),
}

/// Settings shared by commands that resolve a configuration
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConfigSource {
    /// Configuration file (.properties, .yaml or .yml)
    #[arg(short, long, env = "WINPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// WinAppDriver endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Application path or app id to launch
    #[arg(long)]
    pub app_path: Option<String>,

    /// Element readiness timeout in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Directory for failure screenshots
    #[arg(long)]
    pub screenshot_dir: Option<PathBuf>,

    /// Directory for reports
    #[arg(long)]
    pub report_dir: Option<PathBuf>,
}

impl ConfigSource {
    /// Overrides given on the command line
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            endpoint: self.endpoint.clone(),
            app_path: self.app_path.clone(),
            element_timeout_ms: self.timeout,
            screenshot_dir: self.screenshot_dir.clone(),
            report_dir: self.report_dir.clone(),
        }
    }
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Configuration sources
    #[command(flatten)]
    pub source: ConfigSource,

    /// Only run scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Stop after the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Run against the in-process calculator simulation
    #[arg(long)]
    pub mock: bool,

    /// Result format on stdout
    #[arg(long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only list scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the check-config command
#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    /// Configuration sources
    #[command(flatten)]
    pub source: ConfigSource,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,
}

/// Output format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
