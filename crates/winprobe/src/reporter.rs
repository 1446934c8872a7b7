//! Reporter - Test Reporting with Andon Cord Support
//!
//! Collects scenario results and renders them as an HTML page, JUnit XML
//! and a JSON summary. [`FailureArtifacts`] is the failure listener that
//! writes a screenshot and an HTML failure report for each failed scenario.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │  Reporter                                                              │
//! │                                                                        │
//! │  ┌────────────────────┐     ┌──────────────────────┐                   │
//! │  │  FailureMode::     │     │  FailureMode::       │                   │
//! │  │  CollectAll        │     │  AndonCord           │                   │
//! │  │                    │     │                      │                   │
//! │  │  run every         │     │  STOP on first       │                   │
//! │  │  scenario          │     │  failure             │                   │
//! │  └────────────────────┘     └──────────────────────┘                   │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::config::ProbeConfig;
use crate::driver::AutomationDriver;
use crate::harness::SuiteListener;
use crate::result::{ProbeError, ProbeResult};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Failure mode for suite execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Stop on first failure
    AndonCord,
    /// Run every scenario and collect all failures
    #[default]
    CollectAll,
}

/// Test result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    /// Test passed
    Passed,
    /// Test failed
    Failed,
    /// Test was skipped
    Skipped,
}

impl TestStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Check if status is skipped
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Individual test result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResultEntry {
    /// Scenario name
    pub name: String,
    /// Test status
    pub status: TestStatus,
    /// Duration of test execution
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// Failure message, or the skip reason
    pub error: Option<String>,
    /// Error chain if available
    pub stack_trace: Option<String>,
    /// When the result was recorded
    pub timestamp: DateTime<Utc>,
}

impl TestResultEntry {
    /// Create a passing test result
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Passed,
            duration,
            error: None,
            stack_trace: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a failing test result
    #[must_use]
    pub fn failed(name: impl Into<String>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Failed,
            duration,
            error: Some(error.into()),
            stack_trace: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a skipped test result
    #[must_use]
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Skipped,
            duration: Duration::ZERO,
            error: Some(reason.into()),
            stack_trace: None,
            timestamp: Utc::now(),
        }
    }

    /// Add a stack trace to the result
    #[must_use]
    pub fn with_stack_trace(mut self, trace: impl Into<String>) -> Self {
        self.stack_trace = Some(trace.into());
        self
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Render an error and its `source()` chain, one cause per line
#[must_use]
pub fn error_chain(error: &ProbeError) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str(&format!("\ncaused by: {cause}"));
        source = cause.source();
    }
    chain
}

/// Machine-readable run summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique id of this run
    pub run_id: Uuid,
    /// Suite name
    pub suite: String,
    /// When the suite started
    pub started_at: Option<DateTime<Utc>>,
    /// Number of recorded scenarios
    pub total: usize,
    /// Passed scenarios
    pub passed: usize,
    /// Failed scenarios
    pub failed: usize,
    /// Skipped scenarios
    pub skipped: usize,
    /// Pass rate (0.0 to 1.0) over executed scenarios
    pub pass_rate: f64,
    /// Sum of scenario durations in milliseconds
    pub duration_ms: u64,
    /// Individual results
    pub results: Vec<TestResultEntry>,
}

/// Test reporter with Andon Cord support
///
/// In AndonCord mode [`Reporter::record`] returns an error for the first
/// failed result so the caller can stop the line.
#[derive(Debug, Clone)]
pub struct Reporter {
    results: Vec<TestResultEntry>,
    failure_mode: FailureMode,
    suite_name: String,
    run_id: Uuid,
    start_time: Option<DateTime<Utc>>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    /// Create new reporter in CollectAll mode
    #[must_use]
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            failure_mode: FailureMode::CollectAll,
            suite_name: "Test Suite".to_string(),
            run_id: Uuid::new_v4(),
            start_time: None,
        }
    }

    /// Create reporter with Andon Cord mode (fail-fast)
    #[must_use]
    pub fn andon() -> Self {
        Self::new().with_failure_mode(FailureMode::AndonCord)
    }

    /// Create reporter with CollectAll mode
    #[must_use]
    pub fn collect_all() -> Self {
        Self::new()
    }

    /// Set failure mode
    #[must_use]
    pub const fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Set suite name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.suite_name = name.into();
        self
    }

    /// Suite name
    #[must_use]
    pub fn suite_name(&self) -> &str {
        &self.suite_name
    }

    /// Failure mode
    #[must_use]
    pub const fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    /// Unique id of this run
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Start the test suite
    pub fn start(&mut self) {
        self.start_time = Some(Utc::now());
    }

    /// Record a test result
    ///
    /// # Errors
    ///
    /// In AndonCord mode, returns error if the test failed
    pub fn record(&mut self, result: TestResultEntry) -> ProbeResult<()> {
        let failure_info = result
            .status
            .is_failed()
            .then(|| (result.name.clone(), result.error.clone().unwrap_or_default()));

        self.results.push(result);

        if self.failure_mode == FailureMode::AndonCord {
            if let Some((test_name, failure)) = failure_info {
                return Err(ProbeError::assertion(format!(
                    "ANDON CORD PULLED: Test '{test_name}' failed: {failure}"
                )));
            }
        }
        Ok(())
    }

    /// Get number of passed tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_passed()).count()
    }

    /// Get number of failed tests
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_failed()).count()
    }

    /// Get number of skipped tests
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_skipped()).count()
    }

    /// Get total test count
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// Pass rate (0.0 to 1.0); skipped tests count as not passed
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 1.0;
        }
        self.passed_count() as f64 / self.results.len() as f64
    }

    /// Check if no test failed or was skipped
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.passed_count() == self.total_count()
    }

    /// Get total duration
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    /// Get test results
    #[must_use]
    pub fn results(&self) -> &[TestResultEntry] {
        &self.results
    }

    /// Get failing tests
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResultEntry> {
        self.results
            .iter()
            .filter(|r| r.status.is_failed())
            .collect()
    }

    /// Generate summary string
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} passed, {} failed, {} skipped ({:.1}%)",
            self.suite_name,
            self.passed_count(),
            self.total_count(),
            self.failed_count(),
            self.skipped_count(),
            self.pass_rate() * 100.0
        )
    }

    /// Build the machine-readable summary
    #[must_use]
    pub fn run_summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            suite: self.suite_name.clone(),
            started_at: self.start_time,
            total: self.total_count(),
            passed: self.passed_count(),
            failed: self.failed_count(),
            skipped: self.skipped_count(),
            pass_rate: self.pass_rate(),
            duration_ms: self.total_duration().as_millis() as u64,
            results: self.results.clone(),
        }
    }

    /// Render the JSON summary
    pub fn render_json(&self) -> ProbeResult<String> {
        Ok(serde_json::to_string_pretty(&self.run_summary())?)
    }

    /// Render HTML report content
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut html = String::new();

        html.push_str(&format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{} - Test Report</title>
    <style>
        body {{ font-family: 'Segoe UI', Roboto, sans-serif; margin: 20px; }}
        .summary {{ background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }}
        .progress-bar {{ background: #ddd; height: 20px; border-radius: 10px; overflow: hidden; }}
        .passed {{ background: #4caf50; height: 100%; }}
        .test {{ padding: 10px; margin: 5px 0; border-radius: 4px; }}
        .test.pass {{ background: #e8f5e9; border-left: 4px solid #4caf50; }}
        .test.fail {{ background: #ffebee; border-left: 4px solid #f44336; }}
        .test.skip {{ background: #fff3e0; border-left: 4px solid #ff9800; }}
        .error {{ color: #d32f2f; font-family: monospace; white-space: pre-wrap; }}
    </style>
</head>
<body>
"#,
            escape_markup(&self.suite_name)
        ));

        html.push_str(&format!(
            r#"<div class="summary">
    <h1>{}</h1>
    <p>Run {}</p>
    <h2>Results: {}/{} passed, {} failed, {} skipped ({:.1}%)</h2>
    <div class="progress-bar">
        <div class="passed" style="width: {:.1}%"></div>
    </div>
    <p>Duration: {:.2}s</p>
</div>
"#,
            escape_markup(&self.suite_name),
            self.run_id,
            self.passed_count(),
            self.total_count(),
            self.failed_count(),
            self.skipped_count(),
            self.pass_rate() * 100.0,
            self.pass_rate() * 100.0,
            self.total_duration().as_secs_f64()
        ));

        html.push_str("<h2>Test Results</h2>\n");
        for result in &self.results {
            let class = match result.status {
                TestStatus::Passed => "pass",
                TestStatus::Failed => "fail",
                TestStatus::Skipped => "skip",
            };

            html.push_str(&format!(
                r#"<div class="test {}">
    <strong>{}</strong> - {:?} ({:.2}ms)
"#,
                class,
                escape_markup(&result.name),
                result.status,
                result.duration.as_secs_f64() * 1000.0
            ));

            if let Some(error) = &result.error {
                html.push_str(&format!(
                    r#"    <div class="error">{}</div>"#,
                    escape_markup(error)
                ));
                html.push('\n');
            }

            html.push_str("</div>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Render JUnit XML content
    #[must_use]
    pub fn render_junit(&self) -> String {
        let mut xml = String::new();

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<testsuite name="{}" tests="{}" failures="{}" skipped="{}" time="{:.3}">"#,
            escape_markup(&self.suite_name),
            self.total_count(),
            self.failed_count(),
            self.skipped_count(),
            self.total_duration().as_secs_f64()
        ));
        xml.push('\n');

        for result in &self.results {
            xml.push_str(&format!(
                r#"  <testcase name="{}" time="{:.3}">"#,
                escape_markup(&result.name),
                result.duration.as_secs_f64()
            ));
            xml.push('\n');

            let message = result.error.as_deref().unwrap_or_default();
            match result.status {
                TestStatus::Failed => {
                    let body = result.stack_trace.as_deref().unwrap_or(message);
                    xml.push_str(&format!(
                        r#"    <failure message="{}">{}</failure>"#,
                        escape_markup(message),
                        escape_markup(body)
                    ));
                    xml.push('\n');
                }
                TestStatus::Skipped => {
                    xml.push_str(&format!(
                        r#"    <skipped message="{}"/>"#,
                        escape_markup(message)
                    ));
                    xml.push('\n');
                }
                TestStatus::Passed => {}
            }

            xml.push_str("  </testcase>\n");
        }

        xml.push_str("</testsuite>\n");
        xml
    }

    /// Write `report.html`, `junit.xml` and `summary.json` into `dir`
    ///
    /// # Errors
    ///
    /// Returns error if the directory or a file cannot be written
    pub fn write_reports(&self, dir: &Path) -> ProbeResult<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let outputs = [
            ("report.html", self.render_html()),
            ("junit.xml", self.render_junit()),
            ("summary.json", self.render_json()?),
        ];
        let mut written = Vec::with_capacity(outputs.len());
        for (file, content) in outputs {
            let path = dir.join(file);
            fs::write(&path, content)?;
            tracing::info!(path = %path.display(), "report written");
            written.push(path);
        }
        Ok(written)
    }
}

/// Escape XML/HTML special characters
#[must_use]
pub fn escape_markup(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// FAILURE ARTIFACTS
// ============================================================================

/// Files written for one failed scenario
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Screenshot, if one could be captured
    pub screenshot: Option<PathBuf>,
    /// HTML failure report, if it could be written
    pub report: Option<PathBuf>,
}

/// Failure listener writing a screenshot and an HTML report per failure.
///
/// Files are named `{scenario}_{yyyy-MM-dd_HH-mm-ss}_FAILED.png` and
/// `{scenario}_{yyyy-MM-dd_HH-mm-ss}_failure_report.html`. Write errors are
/// logged and never propagated.
#[derive(Debug, Clone)]
pub struct FailureArtifacts {
    screenshot_dir: PathBuf,
    report_dir: PathBuf,
    written: Vec<ArtifactPaths>,
}

impl FailureArtifacts {
    /// Create a listener writing into the given directories
    #[must_use]
    pub fn new(screenshot_dir: impl Into<PathBuf>, report_dir: impl Into<PathBuf>) -> Self {
        Self {
            screenshot_dir: screenshot_dir.into(),
            report_dir: report_dir.into(),
            written: Vec::new(),
        }
    }

    /// Create a listener using the configured directories
    #[must_use]
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(&config.screenshot_dir, &config.report_dir)
    }

    /// Artifacts written so far
    #[must_use]
    pub fn written(&self) -> &[ArtifactPaths] {
        &self.written
    }

    /// Create the artifact directories
    pub fn ensure_dirs(&self) -> ProbeResult<()> {
        fs::create_dir_all(&self.screenshot_dir)?;
        fs::create_dir_all(&self.report_dir)?;
        Ok(())
    }

    /// Write the artifacts for one failure, stamped with `at`
    pub fn capture(
        &mut self,
        scenario: &str,
        error: &ProbeError,
        capture: Option<&dyn AutomationDriver>,
        at: DateTime<Local>,
    ) -> ArtifactPaths {
        let stamp = at.format("%Y-%m-%d_%H-%M-%S").to_string();
        let base = format!("{}_{stamp}", sanitize_file_stem(scenario));

        let screenshot = match capture {
            Some(driver) => {
                let path = self.screenshot_dir.join(format!("{base}_FAILED.png"));
                match self.write_screenshot(driver, &path) {
                    Ok(()) => {
                        tracing::info!(path = %path.display(), "screenshot saved");
                        Some(path)
                    }
                    Err(e) => {
                        tracing::error!(scenario, error = %e, "failed to capture screenshot");
                        None
                    }
                }
            }
            None => {
                tracing::warn!(scenario, "no driver session available, screenshot skipped");
                None
            }
        };

        let path = self.report_dir.join(format!("{base}_failure_report.html"));
        let html = render_failure_report(scenario, error, &at.format("%Y-%m-%d %H:%M:%S").to_string());
        let report = match fs::create_dir_all(&self.report_dir).and_then(|()| fs::write(&path, html)) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "failure report saved");
                Some(path)
            }
            Err(e) => {
                tracing::error!(scenario, error = %e, "failed to write failure report");
                None
            }
        };

        let paths = ArtifactPaths { screenshot, report };
        self.written.push(paths.clone());
        paths
    }

    fn write_screenshot(&self, driver: &dyn AutomationDriver, path: &Path) -> ProbeResult<()> {
        let shot = driver.screenshot()?;
        fs::create_dir_all(&self.screenshot_dir)?;
        fs::write(path, &shot.data)?;
        Ok(())
    }
}

impl SuiteListener for FailureArtifacts {
    fn on_suite_start(&mut self, suite: &str) {
        if let Err(e) = self.ensure_dirs() {
            tracing::error!(suite, error = %e, "could not create artifact directories");
        }
    }

    fn on_test_failure(
        &mut self,
        scenario: &str,
        error: &ProbeError,
        capture: Option<&dyn AutomationDriver>,
    ) {
        let _ = self.capture(scenario, error, capture, Local::now());
    }
}

fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn render_failure_report(scenario: &str, error: &ProbeError, timestamp: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Test Failure Report - {name}</title>
    <style>
        body {{ font-family: 'Segoe UI', Roboto, sans-serif; margin: 20px; }}
        .error {{ color: #d32f2f; }}
        pre {{ background: #f5f5f5; padding: 10px; white-space: pre-wrap; }}
    </style>
</head>
<body>
    <h1>Test Failure Report</h1>
    <p><strong>Scenario:</strong> {name}</p>
    <p><strong>Time:</strong> {timestamp}</p>
    <p><strong>Reason:</strong> <span class="error">{reason}</span></p>
    <h2>Error chain</h2>
    <pre>{chain}</pre>
    <h2>Details</h2>
    <pre>{debug}</pre>
</body>
</html>
"#,
        name = escape_markup(scenario),
        timestamp = escape_markup(timestamp),
        reason = escape_markup(&error.to_string()),
        chain = escape_markup(&error_chain(error)),
        debug = escape_markup(&format!("{error:#?}")),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    mod test_status_tests {
        use super::*;

        #[test]
        fn test_default_failure_mode() {
            assert_eq!(FailureMode::default(), FailureMode::CollectAll);
        }

        #[test]
        fn test_status_predicates() {
            assert!(TestStatus::Passed.is_passed());
            assert!(TestStatus::Failed.is_failed());
            assert!(TestStatus::Skipped.is_skipped());
            assert!(!TestStatus::Skipped.is_failed());
        }
    }

    mod test_result_entry_tests {
        use super::*;

        #[test]
        fn test_failed_result() {
            let result =
                TestResultEntry::failed("addition", Duration::from_millis(50), "expected 42");
            assert_eq!(result.status, TestStatus::Failed);
            assert_eq!(result.error.as_deref(), Some("expected 42"));
        }

        #[test]
        fn test_skipped_result_keeps_reason() {
            let result = TestResultEntry::skipped("addition", "session unavailable");
            assert_eq!(result.duration, Duration::ZERO);
            assert_eq!(result.error.as_deref(), Some("session unavailable"));
        }

        #[test]
        fn test_duration_serialized_as_millis() {
            let json = serde_json::to_value(TestResultEntry::passed("t", Duration::from_millis(1500)))
                .unwrap();
            assert_eq!(json["duration"], 1500);
            let back: TestResultEntry = serde_json::from_value(json).unwrap();
            assert_eq!(back.duration, Duration::from_millis(1500));
        }
    }

    mod reporter_tests {
        use super::*;

        fn mixed() -> Reporter {
            let mut reporter = Reporter::new().with_name("Calculator");
            reporter.start();
            reporter
                .record(TestResultEntry::passed("addition", Duration::from_millis(10)))
                .unwrap();
            reporter
                .record(TestResultEntry::failed(
                    "division <by> zero",
                    Duration::from_millis(5),
                    "expected \"∞\" & got '0'",
                ))
                .unwrap();
            reporter
                .record(TestResultEntry::skipped("square", "session unavailable"))
                .unwrap();
            reporter
        }

        #[test]
        fn test_counts() {
            let reporter = mixed();
            assert_eq!(reporter.total_count(), 3);
            assert_eq!(reporter.passed_count(), 1);
            assert_eq!(reporter.failed_count(), 1);
            assert_eq!(reporter.skipped_count(), 1);
            assert!((reporter.pass_rate() - 1.0 / 3.0).abs() < f64::EPSILON);
            assert!(!reporter.all_passed());
            assert_eq!(reporter.failures().len(), 1);
            assert_eq!(reporter.total_duration(), Duration::from_millis(15));
        }

        #[test]
        fn test_andon_cord_pulled() {
            let mut reporter = Reporter::andon();
            assert!(reporter
                .record(TestResultEntry::passed("a", Duration::ZERO))
                .is_ok());
            let err = reporter
                .record(TestResultEntry::failed("b", Duration::ZERO, "boom"))
                .unwrap_err();
            assert!(err.to_string().contains("ANDON CORD PULLED"));
            assert_eq!(reporter.total_count(), 2);
        }

        #[test]
        fn test_empty_reporter() {
            let reporter = Reporter::collect_all();
            assert!(reporter.all_passed());
            assert!((reporter.pass_rate() - 1.0).abs() < f64::EPSILON);
        }

        #[test]
        fn test_html_escapes_content() {
            let html = mixed().render_html();
            assert!(html.contains("<h1>Calculator</h1>"));
            assert!(html.contains("division &lt;by&gt; zero"));
            assert!(html.contains("&quot;∞&quot; &amp; got &apos;0&apos;"));
            assert!(html.contains("class=\"test skip\""));
        }

        #[test]
        fn test_junit() {
            let xml = mixed().render_junit();
            assert!(xml.contains(r#"tests="3" failures="1" skipped="1""#));
            assert!(xml.contains("<failure message="));
            assert!(xml.contains(r#"<skipped message="session unavailable"/>"#));
        }

        #[test]
        fn test_json_summary() {
            let reporter = mixed();
            let json: serde_json::Value =
                serde_json::from_str(&reporter.render_json().unwrap()).unwrap();
            assert_eq!(json["suite"], "Calculator");
            assert_eq!(json["failed"], 1);
            assert_eq!(json["results"].as_array().unwrap().len(), 3);
            assert_eq!(json["run_id"], reporter.run_id().to_string());
        }

        #[test]
        fn test_write_reports() {
            let dir = TempDir::new().unwrap();
            let out = dir.path().join("reports");
            let written = mixed().write_reports(&out).unwrap();
            assert_eq!(written.len(), 3);
            assert!(written.iter().all(|p| p.is_file()));
        }
    }

    mod artifact_tests {
        use super::*;

        fn artifacts(dir: &TempDir) -> FailureArtifacts {
            FailureArtifacts::new(dir.path().join("shots"), dir.path().join("reports"))
        }

        #[test]
        fn test_capture_writes_both_files() {
            let dir = TempDir::new().unwrap();
            let mut listener = artifacts(&dir);
            let driver = MockDriver::calculator();
            let err = ProbeError::assertion("expected '42', got '41'");

            let paths = listener.capture("addition", &err, Some(&driver), fixed_time());

            let shot = paths.screenshot.unwrap();
            assert_eq!(
                shot.file_name().unwrap().to_str().unwrap(),
                "addition_2026-03-14_09-26-53_FAILED.png"
            );
            assert!(fs::read(&shot).unwrap().starts_with(&[0x89, b'P', b'N', b'G']));

            let report = paths.report.unwrap();
            assert_eq!(
                report.file_name().unwrap().to_str().unwrap(),
                "addition_2026-03-14_09-26-53_failure_report.html"
            );
            let html = fs::read_to_string(report).unwrap();
            assert!(html.contains("addition"));
            assert!(html.contains("expected &apos;42&apos;, got &apos;41&apos;"));
            assert_eq!(listener.written().len(), 1);
        }

        #[test]
        fn test_missing_capture_skips_screenshot() {
            let dir = TempDir::new().unwrap();
            let mut listener = artifacts(&dir);
            let paths = listener.capture("clear", &ProbeError::driver("gone"), None, fixed_time());
            assert!(paths.screenshot.is_none());
            assert!(paths.report.is_some());
        }

        #[test]
        fn test_screenshot_failure_is_not_fatal() {
            let dir = TempDir::new().unwrap();
            let mut listener = artifacts(&dir);
            let driver = MockDriver::calculator();
            driver.set_screenshot(None);
            let paths = listener.capture("square", &ProbeError::driver("x"), Some(&driver), fixed_time());
            assert!(paths.screenshot.is_none());
            assert!(paths.report.is_some());
        }

        #[test]
        fn test_unwritable_report_dir_is_not_fatal() {
            let dir = TempDir::new().unwrap();
            let blocker = dir.path().join("blocked");
            fs::write(&blocker, "file, not a directory").unwrap();
            let mut listener = FailureArtifacts::new(dir.path().join("shots"), &blocker);
            let paths = listener.capture("sqrt", &ProbeError::driver("x"), None, fixed_time());
            assert!(paths.report.is_none());
        }

        #[test]
        fn test_file_stem_sanitised() {
            assert_eq!(sanitize_file_stem("a/b c:d"), "a_b_c_d");
        }

        #[test]
        fn test_error_chain_includes_sources() {
            let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
            let chain = error_chain(&ProbeError::from(io));
            assert!(chain.starts_with("I/O error: denied"));
        }
    }
}
