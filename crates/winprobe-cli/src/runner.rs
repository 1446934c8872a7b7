//! Scenario runner: wires configuration, session factory and listeners
//! into a [`SuiteHarness`] and writes the suite reports.

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use std::path::PathBuf;
use winprobe::{
    FailureArtifacts, FailureMode, MockDriver, ProbeConfig, SessionFactory, SuiteHarness,
    SuiteResults, TestSuite, WinAppDriverFactory,
};

/// Where the runner gets its driver sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// A live WinAppDriver endpoint
    #[default]
    WinAppDriver,
    /// The in-process calculator simulation
    Mock,
}

/// Options for a single run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Substring filter on scenario names
    pub filter: Option<String>,
    /// Stop after the first failure
    pub fail_fast: bool,
    /// Session backend
    pub backend: Backend,
    /// Suppress the progress display
    pub quiet: bool,
}

/// Outcome of a run, including the written report files
#[derive(Debug)]
pub struct RunOutcome {
    /// Suite results
    pub results: SuiteResults,
    /// Report files written to the report directory
    pub reports: Vec<PathBuf>,
}

/// Test runner for executing calculator scenarios
#[derive(Debug)]
pub struct TestRunner {
    config: CliConfig,
}

impl TestRunner {
    /// Create a new test runner
    #[must_use]
    pub const fn new(config: CliConfig) -> Self {
        Self { config }
    }

    /// Run `suite` against the configured backend.
    ///
    /// # Errors
    ///
    /// Returns error if no scenario matches the filter or the reports cannot
    /// be written. Failing scenarios are reported in the outcome, not here.
    pub fn run(
        &self,
        probe: &ProbeConfig,
        suite: &TestSuite,
        options: &RunOptions,
    ) -> CliResult<RunOutcome> {
        let selected = suite.select(options.filter.as_deref()).len();
        if selected == 0 {
            return Err(CliError::invalid_argument(format!(
                "no scenario matches filter '{}'",
                options.filter.as_deref().unwrap_or_default()
            )));
        }

        let quiet = options.quiet || self.config.verbosity.is_quiet();
        let use_color = self.config.color.should_color();
        let mut progress = ProgressReporter::new(use_color, quiet);
        progress.start_progress(selected as u64, "Starting...");

        tracing::info!(
            endpoint = %probe.endpoint,
            backend = ?options.backend,
            scenarios = selected,
            "running suite"
        );

        let results = match options.backend {
            Backend::Mock => {
                let mock = MockDriver::calculator();
                Self::execute(probe, mock.session_factory(), suite, options, progress)
            }
            Backend::WinAppDriver => {
                Self::execute(probe, WinAppDriverFactory, suite, options, progress)
            }
        };

        let reports = results.reporter.write_reports(&probe.report_dir)?;
        let notes = ProgressReporter::new(use_color, quiet);
        for path in &reports {
            notes.info(&format!("report written: {}", path.display()));
        }

        Ok(RunOutcome { results, reports })
    }

    fn execute<F: SessionFactory>(
        probe: &ProbeConfig,
        factory: F,
        suite: &TestSuite,
        options: &RunOptions,
        progress: ProgressReporter,
    ) -> SuiteResults {
        let mode = if options.fail_fast {
            FailureMode::AndonCord
        } else {
            FailureMode::CollectAll
        };
        let mut harness = SuiteHarness::new(probe.clone(), factory)
            .with_failure_mode(mode)
            .with_listener(Box::new(FailureArtifacts::from_config(probe)))
            .with_listener(Box::new(progress));
        if let Some(filter) = &options.filter {
            harness = harness.with_filter(filter.clone());
        }
        harness.run(suite)
    }
}
