//! CLI configuration

use crate::commands::ConfigSource;
use crate::error::CliResult;
use serde::{Deserialize, Serialize};
use winprobe::{ConfigOverrides, ProbeConfig, Properties};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a level
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Log filter used when `RUST_LOG` is not set
    #[must_use]
    pub const fn default_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stderr().features().colors_supported(),
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Log line format
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set log format
    #[must_use]
    pub const fn with_log_format(mut self, log_format: LogFormat) -> Self {
        self.log_format = log_format;
        self
    }
}

/// Resolve the run configuration: file, then environment, then flags.
///
/// Without a file the endpoint must come from `--endpoint` or
/// `WINPROBE_ENDPOINT`.
///
/// # Errors
///
/// Returns a configuration error when the file cannot be read or the merged
/// properties fail validation.
pub fn resolve_probe_config(source: &ConfigSource) -> CliResult<ProbeConfig> {
    resolve_with_env(source, ConfigOverrides::from_env())
}

/// [`resolve_probe_config`] with explicit environment overrides
pub fn resolve_with_env(source: &ConfigSource, env: ConfigOverrides) -> CliResult<ProbeConfig> {
    let overrides = env.merge(source.overrides());
    let config = match &source.config {
        Some(path) => ProbeConfig::load(path, &overrides)?,
        None => {
            let mut props = Properties::new();
            overrides.apply(&mut props);
            ProbeConfig::from_properties(&props)?
        }
    };
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_default_verbosity() {
            assert_eq!(Verbosity::default(), Verbosity::Normal);
        }

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(true, 3), Verbosity::Quiet);
            assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(false, 2), Verbosity::Debug);
        }

        #[test]
        fn test_is_verbose() {
            assert!(!Verbosity::Quiet.is_verbose());
            assert!(!Verbosity::Normal.is_verbose());
            assert!(Verbosity::Verbose.is_verbose());
            assert!(Verbosity::Debug.is_verbose());
        }

        #[test]
        fn test_default_filter() {
            assert_eq!(Verbosity::Quiet.default_filter(), "error");
            assert_eq!(Verbosity::Verbose.default_filter(), "info");
        }

        #[test]
        fn test_deserialize() {
            let v: Verbosity = serde_json::from_str("\"Quiet\"").unwrap();
            assert!(v.is_quiet());
        }
    }

    mod color_choice_tests {
        use super::*;

        #[test]
        fn test_default_color() {
            assert_eq!(ColorChoice::default(), ColorChoice::Auto);
        }

        #[test]
        fn test_should_color_fixed() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }
    }

    mod resolve_tests {
        use super::*;
        use std::fs;
        use tempfile::TempDir;

        use crate::error::CliError;
        use winprobe::config::KEY_ENDPOINT;
        use winprobe::ProbeError;

        #[test]
        fn test_no_file_and_no_endpoint_is_config_error() {
            let err = resolve_with_env(&ConfigSource::default(), ConfigOverrides::default())
                .unwrap_err();
            assert!(matches!(err, CliError::Probe(ProbeError::Configuration { .. })));
            assert!(err.to_string().contains(KEY_ENDPOINT));
            assert_eq!(err.exit_code(), 2);
        }

        #[test]
        fn test_endpoint_without_file() {
            let env = ConfigOverrides {
                endpoint: Some("http://env:4723".to_string()),
                ..ConfigOverrides::default()
            };
            let config = resolve_with_env(&ConfigSource::default(), env).unwrap();
            assert_eq!(config.endpoint, "http://env:4723");
            assert!(config.application_path.is_none());

            let source = ConfigSource {
                endpoint: Some("http://flag:4723".to_string()),
                ..ConfigSource::default()
            };
            let config = resolve_with_env(&source, ConfigOverrides::default()).unwrap();
            assert_eq!(config.endpoint, "http://flag:4723");
        }

        #[test]
        fn test_flags_beat_environment_beat_file() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("winprobe.properties");
            fs::write(&path, "driverEndpointUrl=http://file:4723\nelementTimeoutMs=900\n").unwrap();

            let env = ConfigOverrides {
                endpoint: Some("http://env:4723".to_string()),
                ..ConfigOverrides::default()
            };
            let source = ConfigSource {
                config: Some(path.clone()),
                ..ConfigSource::default()
            };
            let config = resolve_with_env(&source, env.clone()).unwrap();
            assert_eq!(config.endpoint, "http://env:4723");
            assert_eq!(config.element_timeout_ms, 900);

            let source = ConfigSource {
                config: Some(path),
                endpoint: Some("http://flag:4723".to_string()),
                ..ConfigSource::default()
            };
            let config = resolve_with_env(&source, env).unwrap();
            assert_eq!(config.endpoint, "http://flag:4723");
        }

        #[test]
        fn test_missing_file_is_error() {
            let source = ConfigSource {
                config: Some("does/not/exist.properties".into()),
                ..ConfigSource::default()
            };
            assert!(resolve_with_env(&source, ConfigOverrides::default()).is_err());
        }
    }

    mod cli_config_tests {
        use super::*;

        #[test]
        fn test_chained_builders() {
            let config = CliConfig::new()
                .with_verbosity(Verbosity::Verbose)
                .with_color(ColorChoice::Never)
                .with_log_format(LogFormat::Json);

            assert_eq!(config.verbosity, Verbosity::Verbose);
            assert_eq!(config.color, ColorChoice::Never);
            assert_eq!(config.log_format, LogFormat::Json);
        }

        #[test]
        fn test_serialize() {
            let json = serde_json::to_string(&CliConfig::new()).unwrap();
            assert!(json.contains("\"log_format\":\"Text\""));
        }
    }
}
