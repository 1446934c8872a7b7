//! Winprobe: page-object UI automation for Windows Calculator
//!
//! Scenarios drive the calculator through [`CalculatorPage`], which turns
//! domain actions ("enter 25", "press plus", "read the display") into
//! accessibility-tree lookups and clicks on an [`AutomationDriver`]. The
//! production driver speaks the WebDriver JSON protocol to a WinAppDriver
//! endpoint; [`MockDriver`] simulates the window in-process.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    WINPROBE Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Calculator │    │ WinApp     │            │
//! │   │ Suite      │───►│ Page       │───►│ Driver     │            │
//! │   │ (harness)  │    │ (locators) │    │ (HTTP)     │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         │                                   │                   │
//! │         ▼                                   ▼                   │
//! │   ┌────────────┐                      ┌────────────┐            │
//! │   │ Reporter   │◄─── screenshots ─────│ calc.exe   │            │
//! │   │ (HTML/XML) │                      │            │            │
//! │   └────────────┘                      └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use winprobe::prelude::*;
//!
//! let driver = MockDriver::calculator();
//! let page = CalculatorPage::new(&driver);
//! let shown = page.add("25", "17")?.read_display()?;
//! assert_eq!(shown, "42");
//! # Ok::<(), ProbeError>(())
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod assertion;
#[allow(clippy::missing_errors_doc)]
mod driver;
mod locator;
mod result;

/// Suite harness: session lifecycle, listeners and scenario execution
#[allow(clippy::missing_errors_doc, clippy::cast_possible_truncation)]
pub mod harness;

/// Layered configuration from properties or YAML files and the environment
#[allow(clippy::missing_errors_doc)]
pub mod config;

/// In-process calculator simulation for tests and offline runs
#[allow(clippy::missing_errors_doc, clippy::float_cmp)]
pub mod mock;

/// Calculator page object
#[allow(clippy::missing_errors_doc, clippy::cast_possible_truncation)]
pub mod page_object;

/// Test result collection, suite reports and failure artifacts
#[allow(
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
pub mod reporter;

/// The standard calculator scenario catalogue
pub mod scenarios;

/// Element readiness and display stabilisation polling
#[allow(clippy::missing_errors_doc, clippy::cast_possible_truncation)]
pub mod wait;

/// WinAppDriver client over the WebDriver JSON protocol
#[allow(clippy::missing_errors_doc)]
pub mod webdriver;

pub use assertion::{Assertion, AssertionResult};
pub use config::{ConfigOverrides, ProbeConfig, Properties};
pub use driver::{AutomationDriver, ElementHandle, Screenshot, SessionConfig, CALCULATOR_APP_ID};
pub use harness::{
    Scenario, ScenarioFn, SessionFactory, SuiteHarness, SuiteListener, SuiteResults, TestSuite,
    WinAppDriverFactory,
};
pub use locator::{
    CalculatorMode, Control, LocatorRegistry, Operator, Selector, DIGIT_NAMES,
    DISPLAY_AUTOMATION_ID, NAVIGATION_MENU_NAME,
};
pub use mock::MockDriver;
pub use page_object::{normalize_display, CalculatorPage, PageObject, DISPLAY_PREFIX};
pub use reporter::{
    ArtifactPaths, FailureArtifacts, FailureMode, Reporter, RunSummary, TestResultEntry,
    TestStatus,
};
pub use result::{ProbeError, ProbeResult};
pub use scenarios::calculator_suite;
pub use wait::{Readiness, WaitPolicy, WaitResult, Waiter};
pub use webdriver::WinAppDriver;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::assertion::*;
    pub use super::config::{ConfigOverrides, ProbeConfig};
    pub use super::driver::*;
    pub use super::harness::*;
    pub use super::locator::*;
    pub use super::mock::MockDriver;
    pub use super::page_object::*;
    pub use super::reporter::{FailureArtifacts, FailureMode, Reporter, TestStatus};
    pub use super::result::*;
    pub use super::scenarios::calculator_suite;
    pub use super::wait::{Readiness, WaitPolicy};
    pub use super::webdriver::WinAppDriver;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod prelude_tests {
        use crate::prelude::*;

        #[test]
        fn test_prelude_drives_mock() {
            let driver = MockDriver::calculator();
            let page = CalculatorPage::new(&driver);
            assert!(page.is_loaded());
            assert_eq!(page.multiply("6", "7").unwrap().read_display().unwrap(), "42");
        }
    }

    mod reexport_tests {
        use super::*;

        #[test]
        fn test_default_session_targets_calculator() {
            let session = SessionConfig::default();
            assert_eq!(session.app, CALCULATOR_APP_ID);
        }

        #[test]
        fn test_suite_is_exported() {
            assert_eq!(calculator_suite().test_count(), 20);
        }
    }
}
