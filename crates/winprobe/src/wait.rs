//! Wait Mechanisms
//!
//! Bounded polling used before every interaction with the calculator window.
//!
//! - **Readiness waits**: poll the driver until an element is present or
//!   clickable, failing with [`ProbeError::ElementNotReady`] on timeout
//! - **Display stabilisation**: poll a reading until two consecutive values
//!   match, bounded by the settle timeout, instead of sleeping blindly

use crate::driver::{AutomationDriver, ElementHandle};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for element waits (25 seconds)
pub const DEFAULT_ELEMENT_TIMEOUT_MS: u64 = 25_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default upper bound for display stabilisation (500ms)
pub const DEFAULT_SETTLE_TIMEOUT_MS: u64 = 500;

// =============================================================================
// READINESS
// =============================================================================

/// Readiness state an element must reach before it is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Readiness {
    /// Element exists in the accessibility tree
    Present,
    /// Element exists, is displayed and is enabled
    Clickable,
}

impl Readiness {
    /// Name used in logs and error messages
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Clickable => "clickable",
        }
    }
}

impl std::fmt::Display for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// WAIT POLICY
// =============================================================================

/// Timeouts applied by the page object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitPolicy {
    /// Timeout for element readiness in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Upper bound for display stabilisation in milliseconds
    pub settle_timeout_ms: u64,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_ELEMENT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            settle_timeout_ms: DEFAULT_SETTLE_TIMEOUT_MS,
        }
    }
}

impl WaitPolicy {
    /// Create a policy with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set element timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set settle timeout in milliseconds
    #[must_use]
    pub const fn with_settle_timeout(mut self, settle_timeout_ms: u64) -> Self {
        self.settle_timeout_ms = settle_timeout_ms;
        self
    }

    /// Element timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Settle timeout as Duration
    #[must_use]
    pub const fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a wait operation
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Whether the condition was met before the deadline
    pub success: bool,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

impl WaitResult {
    /// Create a successful wait result
    #[must_use]
    pub fn success(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            success: true,
            elapsed,
            waited_for: waited_for.into(),
        }
    }

    /// Create a timeout wait result
    #[must_use]
    pub fn timeout(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            success: false,
            elapsed,
            waited_for: waited_for.into(),
        }
    }
}

/// Outcome of a display stabilisation poll
#[derive(Debug, Clone)]
pub struct StableReading {
    /// Last value read
    pub value: String,
    /// Timing information
    pub wait: WaitResult,
}

// =============================================================================
// WAITER
// =============================================================================

/// Poll-based synchroniser
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    policy: WaitPolicy,
}

impl Waiter {
    /// Create a waiter for the given policy
    #[must_use]
    pub const fn new(policy: WaitPolicy) -> Self {
        Self { policy }
    }

    /// The policy in use
    #[must_use]
    pub const fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    /// Wait until `selector` reaches `readiness`.
    ///
    /// The element is looked up at least once even with a zero timeout.
    ///
    /// # Errors
    ///
    /// [`ProbeError::ElementNotReady`] when the timeout elapses; driver
    /// errors other than "not found" are propagated unchanged.
    pub fn for_element<D: AutomationDriver + ?Sized>(
        &self,
        driver: &D,
        selector: &Selector,
        readiness: Readiness,
    ) -> ProbeResult<ElementHandle> {
        let start = Instant::now();
        let timeout = self.policy.timeout();

        loop {
            if let Some(element) = driver.find(selector)? {
                let ready = match readiness {
                    Readiness::Present => true,
                    Readiness::Clickable => {
                        driver.is_displayed(&element)? && driver.is_enabled(&element)?
                    }
                };
                if ready {
                    tracing::trace!(
                        selector = %selector,
                        readiness = %readiness,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "element ready"
                    );
                    return Ok(element);
                }
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                tracing::warn!(selector = %selector, readiness = %readiness, timeout_ms = self.policy.timeout_ms, "element wait timed out");
                return Err(ProbeError::ElementNotReady {
                    selector: selector.to_string(),
                    readiness: readiness.to_string(),
                    timeout_ms: self.policy.timeout_ms,
                });
            }
            std::thread::sleep(self.policy.poll_interval().min(timeout - elapsed));
        }
    }

    /// Poll `read` until two consecutive values match or the settle timeout
    /// elapses. Hitting the bound is not an error; the last value is returned
    /// with `wait.success == false`.
    ///
    /// # Errors
    ///
    /// Propagates errors from `read`.
    pub fn for_stable_value<F>(&self, mut read: F, waited_for: &str) -> ProbeResult<StableReading>
    where
        F: FnMut() -> ProbeResult<String>,
    {
        let start = Instant::now();
        let settle = self.policy.settle_timeout();
        let mut previous = read()?;

        loop {
            let elapsed = start.elapsed();
            if elapsed >= settle {
                return Ok(StableReading {
                    value: previous,
                    wait: WaitResult::timeout(elapsed, waited_for),
                });
            }
            std::thread::sleep(self.policy.poll_interval().min(settle - elapsed));

            let current = read()?;
            if current == previous {
                return Ok(StableReading {
                    value: current,
                    wait: WaitResult::success(start.elapsed(), waited_for),
                });
            }
            previous = current;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
