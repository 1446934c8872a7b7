//! Test harness for running scenario suites.
//!
//! [`SuiteHarness`] owns the driver session for the length of a suite: it
//! opens the session lazily on the first scenario, waits for the window to
//! load, clears the calculator before every scenario and quits exactly once
//! at the end. Lifecycle events go out to [`SuiteListener`]s; the failure
//! callback receives the live session explicitly for screenshots.

use crate::config::ProbeConfig;
use crate::driver::AutomationDriver;
use crate::page_object::CalculatorPage;
use crate::reporter::{error_chain, FailureMode, Reporter, TestResultEntry};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::WaitPolicy;
use crate::webdriver::WinAppDriver;
use std::fmt;
use std::time::{Duration, Instant};

// =============================================================================
// SCENARIOS
// =============================================================================

/// Body of a scenario, run against a fresh page on the shared session
pub type ScenarioFn = fn(&CalculatorPage<'_>) -> ProbeResult<()>;

/// A named, prioritised scenario
#[derive(Clone)]
pub struct Scenario {
    /// Scenario name, also used for artifact file names
    pub name: String,
    /// One-line description
    pub description: String,
    /// Execution order; lower runs first
    pub priority: u32,
    run: ScenarioFn,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    /// Create a scenario
    #[must_use]
    pub fn new(name: impl Into<String>, priority: u32, run: ScenarioFn) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            priority,
            run,
        }
    }

    /// Set description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Run the scenario body
    pub fn run(&self, page: &CalculatorPage<'_>) -> ProbeResult<()> {
        (self.run)(page)
    }
}

/// A test suite containing multiple scenarios
#[derive(Debug, Clone)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    /// Scenarios in this suite
    pub scenarios: Vec<Scenario>,
}

impl TestSuite {
    /// Create a new test suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
        }
    }

    /// Add a scenario
    pub fn add_scenario(&mut self, scenario: Scenario) {
        self.scenarios.push(scenario);
    }

    /// Add a scenario, builder style
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.add_scenario(scenario);
        self
    }

    /// Get the number of scenarios
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Scenarios whose name contains `filter` (case-insensitive), in
    /// priority order
    #[must_use]
    pub fn select(&self, filter: Option<&str>) -> Vec<&Scenario> {
        let needle = filter.map(str::to_lowercase);
        let mut selected: Vec<&Scenario> = self
            .scenarios
            .iter()
            .filter(|s| {
                needle
                    .as_deref()
                    .map_or(true, |n| s.name.to_lowercase().contains(n))
            })
            .collect();
        selected.sort_by_key(|s| s.priority);
        selected
    }
}

// =============================================================================
// LISTENERS
// =============================================================================

/// Suite lifecycle callbacks; every method defaults to a no-op
pub trait SuiteListener {
    /// Called once before the first scenario
    fn on_suite_start(&mut self, _suite: &str) {}

    /// Called before a scenario runs
    fn on_test_start(&mut self, _scenario: &str) {}

    /// Called after a scenario passed
    fn on_test_success(&mut self, _scenario: &str, _duration: Duration) {}

    /// Called after a scenario failed. `capture` is the live session, if
    /// one exists, for screenshots.
    fn on_test_failure(
        &mut self,
        _scenario: &str,
        _error: &ProbeError,
        _capture: Option<&dyn AutomationDriver>,
    ) {
    }

    /// Called for a scenario that was not run
    fn on_test_skipped(&mut self, _scenario: &str, _reason: &str) {}

    /// Called once after the session was released
    fn on_suite_finish(&mut self, _results: &SuiteResults) {}
}

// =============================================================================
// SESSIONS
// =============================================================================

/// Opens driver sessions for the harness
pub trait SessionFactory {
    /// Driver type produced
    type Driver: AutomationDriver;

    /// Open a session
    fn create(&self, config: &ProbeConfig) -> ProbeResult<Self::Driver>;
}

impl<D, F> SessionFactory for F
where
    D: AutomationDriver,
    F: Fn(&ProbeConfig) -> ProbeResult<D>,
{
    type Driver = D;

    fn create(&self, config: &ProbeConfig) -> ProbeResult<D> {
        self(config)
    }
}

/// Opens WinAppDriver sessions from the configured endpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct WinAppDriverFactory;

impl SessionFactory for WinAppDriverFactory {
    type Driver = WinAppDriver;

    fn create(&self, config: &ProbeConfig) -> ProbeResult<WinAppDriver> {
        WinAppDriver::create(&config.session_config())
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Results from running a test suite
#[derive(Debug, Clone)]
pub struct SuiteResults {
    /// Suite name
    pub suite_name: String,
    /// Recorded scenario results
    pub reporter: Reporter,
    /// Total wall-clock duration
    pub duration: Duration,
    /// Why the session could not be opened, if it could not
    pub session_error: Option<String>,
    /// Whether fail-fast stopped the suite
    pub stopped_early: bool,
}

impl SuiteResults {
    /// Check that every scenario ran and passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.session_error.is_none() && self.reporter.all_passed()
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.reporter.passed_count()
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.reporter.failed_count()
    }

    /// Count skipped scenarios
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.reporter.skipped_count()
    }

    /// Get total scenario count
    #[must_use]
    pub fn total(&self) -> usize {
        self.reporter.total_count()
    }

    /// Get failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResultEntry> {
        self.reporter.failures()
    }
}

// =============================================================================
// HARNESS
// =============================================================================

/// Runs a suite against one session opened through a [`SessionFactory`]
pub struct SuiteHarness<F> {
    config: ProbeConfig,
    factory: F,
    listeners: Vec<Box<dyn SuiteListener>>,
    failure_mode: FailureMode,
    filter: Option<String>,
}

impl<F> fmt::Debug for SuiteHarness<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteHarness")
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .field("failure_mode", &self.failure_mode)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl<F: SessionFactory> SuiteHarness<F> {
    /// Create a harness
    #[must_use]
    pub fn new(config: ProbeConfig, factory: F) -> Self {
        Self {
            config,
            factory,
            listeners: Vec::new(),
            failure_mode: FailureMode::default(),
            filter: None,
        }
    }

    /// Register a listener
    #[must_use]
    pub fn with_listener(mut self, listener: Box<dyn SuiteListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Set failure mode
    #[must_use]
    pub const fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Only run scenarios whose name contains `filter`
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// The configuration in use
    #[must_use]
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run a suite
    pub fn run(&mut self, suite: &TestSuite) -> SuiteResults {
        let start = Instant::now();
        let selected = suite.select(self.filter.as_deref());
        let policy = self.config.wait_policy();

        let mut reporter = Reporter::new()
            .with_name(suite.name.clone())
            .with_failure_mode(self.failure_mode);
        reporter.start();

        tracing::info!(
            suite = %suite.name,
            scenarios = selected.len(),
            run_id = %reporter.run_id(),
            "=== SUITE STARTED ==="
        );
        for listener in &mut self.listeners {
            listener.on_suite_start(&suite.name);
        }

        let mut session: Option<F::Driver> = None;
        let mut session_error: Option<String> = None;
        let mut stop_reason: Option<String> = None;

        for scenario in selected {
            if let Some(reason) = stop_reason.as_ref().or(session_error.as_ref()) {
                self.skip(&mut reporter, &scenario.name, reason);
                continue;
            }

            tracing::info!(scenario = %scenario.name, "test started");
            for listener in &mut self.listeners {
                listener.on_test_start(&scenario.name);
            }

            if session.is_none() {
                match self.open_session(policy) {
                    Ok(driver) => session = Some(driver),
                    Err(e) => {
                        tracing::error!(error = %e, "driver session unavailable, skipping remaining scenarios");
                        let reason = format!("driver session unavailable: {e}");
                        self.skip(&mut reporter, &scenario.name, &reason);
                        session_error = Some(reason);
                        continue;
                    }
                }
            }
            let Some(driver) = session.as_ref() else {
                continue;
            };

            let entry = self.run_scenario(scenario, driver, policy);
            if let Err(e) = reporter.record(entry) {
                tracing::warn!(error = %e, "fail-fast: stopping suite");
                stop_reason = Some(format!("not run: suite stopped after '{}' failed", scenario.name));
            }
        }

        if let Some(driver) = session.take() {
            match driver.quit() {
                Ok(()) => tracing::info!("driver session closed"),
                Err(e) => tracing::warn!(error = %e, "error while closing driver session"),
            }
        }

        let results = SuiteResults {
            suite_name: suite.name.clone(),
            stopped_early: stop_reason.is_some(),
            reporter,
            duration: start.elapsed(),
            session_error,
        };
        tracing::info!(
            summary = %results.reporter.summary(),
            duration_ms = results.duration.as_millis() as u64,
            "=== SUITE FINISHED ==="
        );
        for listener in &mut self.listeners {
            listener.on_suite_finish(&results);
        }
        results
    }

    fn open_session(&self, policy: WaitPolicy) -> ProbeResult<F::Driver> {
        let driver = self.factory.create(&self.config)?;
        let loaded = CalculatorPage::with_policy(&driver, policy)
            .wait_for_load()
            .map(|_| ());
        if let Err(e) = loaded {
            if let Err(quit_err) = driver.quit() {
                tracing::warn!(error = %quit_err, "error while closing unloaded session");
            }
            return Err(e);
        }
        Ok(driver)
    }

    fn run_scenario(
        &mut self,
        scenario: &Scenario,
        driver: &F::Driver,
        policy: WaitPolicy,
    ) -> TestResultEntry {
        let page = CalculatorPage::with_policy(driver, policy);
        if let Err(e) = page.clear() {
            tracing::warn!(scenario = %scenario.name, error = %e, "could not clear calculator before test");
        }

        let started = Instant::now();
        let outcome = scenario.run(&page);
        let duration = started.elapsed();

        match outcome {
            Ok(()) => {
                tracing::info!(
                    scenario = %scenario.name,
                    duration_ms = duration.as_millis() as u64,
                    "test passed"
                );
                for listener in &mut self.listeners {
                    listener.on_test_success(&scenario.name, duration);
                }
                TestResultEntry::passed(&scenario.name, duration)
            }
            Err(e) => {
                tracing::error!(scenario = %scenario.name, reason = %e, "test failed");
                for listener in &mut self.listeners {
                    listener.on_test_failure(&scenario.name, &e, Some(driver as &dyn AutomationDriver));
                }
                TestResultEntry::failed(&scenario.name, duration, e.to_string())
                    .with_stack_trace(error_chain(&e))
            }
        }
    }

    fn skip(&mut self, reporter: &mut Reporter, scenario: &str, reason: &str) {
        tracing::warn!(scenario, reason, "test skipped");
        for listener in &mut self.listeners {
            listener.on_test_skipped(scenario, reason);
        }
        // skipped entries never trip the andon cord
        let _ = reporter.record(TestResultEntry::skipped(scenario, reason));
    }
}
