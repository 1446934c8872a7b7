//! Page Object Model for the Windows Calculator.
//!
//! [`CalculatorPage`] turns domain actions ("enter 25, press plus") into
//! driver calls. It holds no history: each operation resolves its control
//! through the [`LocatorRegistry`], waits for it to become actionable and
//! then acts, so a page can be rebuilt at any time against the same session.
//!
//! Mutating operations return `ProbeResult<&Self>` and chain with `?`:
//!
//! ```ignore
//! let page = CalculatorPage::new(&driver);
//! page.clear()?.enter_number("25")?.click_plus()?.enter_number("17")?.click_equals()?;
//! assert_eq!(page.read_display()?, "42");
//! ```

use crate::driver::AutomationDriver;
use crate::locator::{CalculatorMode, Control, LocatorRegistry, Operator, Selector};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{Readiness, WaitPolicy, Waiter};
use std::fmt;

/// Narration prefix the calculator puts in front of the display value
pub const DISPLAY_PREFIX: &str = "Display is ";

/// Strip the narration prefix from raw display text
#[must_use]
pub fn normalize_display(raw: &str) -> &str {
    raw.strip_prefix(DISPLAY_PREFIX).unwrap_or(raw)
}

/// Trait for page objects representing a window or panel of the application
/// under test.
pub trait PageObject {
    /// Check if the page is fully loaded and ready for interaction
    fn is_loaded(&self) -> bool {
        true
    }

    /// Optional wait time for page load (in milliseconds)
    fn load_timeout_ms(&self) -> u64 {
        30000
    }

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Control surface of the standard calculator
pub struct CalculatorPage<'a> {
    driver: &'a dyn AutomationDriver,
    registry: LocatorRegistry,
    policy: WaitPolicy,
}

impl fmt::Debug for CalculatorPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculatorPage")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<'a> CalculatorPage<'a> {
    /// Create a page bound to a session, with default wait policy
    #[must_use]
    pub fn new(driver: &'a dyn AutomationDriver) -> Self {
        Self::with_policy(driver, WaitPolicy::default())
    }

    /// Create a page with an explicit wait policy
    #[must_use]
    pub fn with_policy(driver: &'a dyn AutomationDriver, policy: WaitPolicy) -> Self {
        Self {
            driver,
            registry: LocatorRegistry::new(),
            policy,
        }
    }

    /// The session this page drives
    #[must_use]
    pub fn driver(&self) -> &'a dyn AutomationDriver {
        self.driver
    }

    /// The wait policy in use
    #[must_use]
    pub const fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    // =========================================================================
    // LOAD
    // =========================================================================

    /// Wait for the window to finish loading (the "One" button is present),
    /// bounded by [`PageObject::load_timeout_ms`]
    pub fn wait_for_load(&self) -> ProbeResult<&Self> {
        let selector = self.registry.digit(1)?;
        let load_policy = self.policy.with_timeout(self.load_timeout_ms());
        let _ = self
            .driver
            .wait_until(&selector, Readiness::Present, &load_policy)?;
        tracing::info!(page = self.page_name(), "calculator loaded");
        Ok(self)
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    fn press(&self, control: Control) -> ProbeResult<&Self> {
        let selector = self.registry.resolve(control)?;
        self.press_selector(&selector)
    }

    fn press_selector(&self, selector: &Selector) -> ProbeResult<&Self> {
        let element = self
            .driver
            .wait_until(selector, Readiness::Clickable, &self.policy)?;
        self.driver.click(&element)?;
        tracing::debug!(selector = %selector, "clicked");
        Ok(self)
    }

    /// Click a digit button.
    ///
    /// # Errors
    ///
    /// [`ProbeError::InvalidArgument`] for `digit > 9`; the driver is not
    /// touched in that case.
    pub fn click_digit(&self, digit: u8) -> ProbeResult<&Self> {
        if digit > 9 {
            return Err(ProbeError::invalid_argument(format!(
                "digit must be 0-9, got {digit}"
            )));
        }
        self.press(Control::Digit(digit))
    }

    /// Type a number left to right. ASCII digits and `.` are entered; any
    /// other character is skipped.
    pub fn enter_number(&self, number: &str) -> ProbeResult<&Self> {
        tracing::debug!(number, "entering number");
        for ch in number.chars() {
            match ch {
                '0'..='9' => {
                    let _ = self.click_digit(ch as u8 - b'0')?;
                }
                '.' => {
                    let _ = self.click_decimal()?;
                }
                other => tracing::debug!(character = %other, "skipping non-numeric character"),
            }
        }
        Ok(self)
    }

    /// Click an operator or editing button
    pub fn click_operator(&self, op: Operator) -> ProbeResult<&Self> {
        if op == Operator::Equals {
            return self.click_equals();
        }
        tracing::debug!(operator = %op, "operator");
        self.press(Control::Operator(op))
    }

    /// Click `+`
    pub fn click_plus(&self) -> ProbeResult<&Self> {
        self.click_operator(Operator::Plus)
    }

    /// Click `-`
    pub fn click_minus(&self) -> ProbeResult<&Self> {
        self.click_operator(Operator::Minus)
    }

    /// Click `×`
    pub fn click_multiply(&self) -> ProbeResult<&Self> {
        self.click_operator(Operator::Multiply)
    }

    /// Click `÷`
    pub fn click_divide(&self) -> ProbeResult<&Self> {
        self.click_operator(Operator::Divide)
    }

    /// Click `%`
    pub fn click_percent(&self) -> ProbeResult<&Self> {
        self.click_operator(Operator::Percent)
    }

    /// Click the decimal separator
    pub fn click_decimal(&self) -> ProbeResult<&Self> {
        self.click_operator(Operator::Decimal)
    }

    /// Click backspace
    pub fn click_backspace(&self) -> ProbeResult<&Self> {
        self.click_operator(Operator::Backspace)
    }

    /// Click `C`
    pub fn clear(&self) -> ProbeResult<&Self> {
        self.click_operator(Operator::Clear)
    }

    /// Click `CE`
    pub fn clear_entry(&self) -> ProbeResult<&Self> {
        self.click_operator(Operator::ClearEntry)
    }

    /// Click `±`
    pub fn click_sign_toggle(&self) -> ProbeResult<&Self> {
        self.click_operator(Operator::SignToggle)
    }

    /// Click `√x`
    pub fn click_square_root(&self) -> ProbeResult<&Self> {
        self.click_operator(Operator::SquareRoot)
    }

    /// Click `x²`
    pub fn click_square(&self) -> ProbeResult<&Self> {
        self.click_operator(Operator::Square)
    }

    /// Click `1/x`
    pub fn click_reciprocal(&self) -> ProbeResult<&Self> {
        self.click_operator(Operator::Reciprocal)
    }

    /// Click `=` and wait for the display to settle.
    ///
    /// The display is polled until two consecutive reads agree or the
    /// settle timeout elapses; an unsettled display is logged, not failed.
    pub fn click_equals(&self) -> ProbeResult<&Self> {
        let _ = self.press(Control::Operator(Operator::Equals))?;
        let reading =
            Waiter::new(self.policy).for_stable_value(|| self.read_display(), "display")?;
        if reading.wait.success {
            tracing::debug!(
                display = %reading.value,
                elapsed_ms = reading.wait.elapsed.as_millis() as u64,
                "display settled"
            );
        } else {
            tracing::warn!(
                display = %reading.value,
                settle_timeout_ms = self.policy.settle_timeout_ms,
                "display did not settle"
            );
        }
        Ok(self)
    }

    // =========================================================================
    // DISPLAY
    // =========================================================================

    /// Read the display with the narration prefix removed
    pub fn read_display(&self) -> ProbeResult<String> {
        let selector = self.registry.resolve(Control::Display)?;
        let element = self
            .driver
            .wait_until(&selector, Readiness::Present, &self.policy)?;
        let raw = self.driver.text(&element)?;
        Ok(normalize_display(&raw).to_string())
    }

    /// Exact, case-sensitive comparison of the display against `expected`
    pub fn verify_display(&self, expected: &str) -> ProbeResult<bool> {
        let actual = self.read_display()?;
        let matches = actual == expected;
        tracing::debug!(expected, actual = %actual, matches, "verify display");
        Ok(matches)
    }

    // =========================================================================
    // COMPOUND OPERATIONS
    // =========================================================================

    fn calculate(&self, a: &str, op: Operator, b: &str) -> ProbeResult<&Self> {
        tracing::info!(a, operator = %op, b, "calculate");
        self.clear()?
            .enter_number(a)?
            .click_operator(op)?
            .enter_number(b)?
            .click_equals()
    }

    /// Clear, then compute `a + b`
    pub fn add(&self, a: &str, b: &str) -> ProbeResult<&Self> {
        self.calculate(a, Operator::Plus, b)
    }

    /// Clear, then compute `a - b`
    pub fn subtract(&self, a: &str, b: &str) -> ProbeResult<&Self> {
        self.calculate(a, Operator::Minus, b)
    }

    /// Clear, then compute `a × b`
    pub fn multiply(&self, a: &str, b: &str) -> ProbeResult<&Self> {
        self.calculate(a, Operator::Multiply, b)
    }

    /// Clear, then compute `a ÷ b`
    pub fn divide(&self, a: &str, b: &str) -> ProbeResult<&Self> {
        self.calculate(a, Operator::Divide, b)
    }

    // =========================================================================
    // MODE
    // =========================================================================

    /// Switch calculator mode through the navigation menu.
    ///
    /// Best effort: failures are logged and the page is returned unchanged.
    pub fn switch_mode(&self, mode: CalculatorMode) -> &Self {
        match self.try_switch_mode(mode) {
            Ok(()) => tracing::info!(mode = %mode, "switched mode"),
            Err(e) => tracing::warn!(mode = %mode, error = %e, "could not switch mode"),
        }
        self
    }

    fn try_switch_mode(&self, mode: CalculatorMode) -> ProbeResult<()> {
        let _ = self.press(Control::NavigationMenu)?;
        let entry = self.registry.resolve(Control::Mode(mode))?;
        let menu_policy = self.policy.with_timeout(self.policy.settle_timeout_ms);
        let element = self
            .driver
            .wait_until(&entry, Readiness::Clickable, &menu_policy)?;
        self.driver.click(&element)
    }
}

impl PageObject for CalculatorPage<'_> {
    fn is_loaded(&self) -> bool {
        self.registry
            .digit(1)
            .and_then(|selector| self.driver.find(&selector))
            .is_ok_and(|found| found.is_some())
    }

    fn load_timeout_ms(&self) -> u64 {
        self.policy.timeout_ms
    }

    fn page_name(&self) -> &str {
        "Windows Calculator"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;
    use proptest::prelude::*;

    fn fast() -> WaitPolicy {
        WaitPolicy::new()
            .with_timeout(100)
            .with_poll_interval(5)
            .with_settle_timeout(50)
    }

    fn page(driver: &MockDriver) -> CalculatorPage<'_> {
        CalculatorPage::with_policy(driver, fast())
    }

    mod display_tests {
        use super::*;

        #[test]
        fn test_normalize_strips_prefix() {
            assert_eq!(normalize_display("Display is 42"), "42");
            assert_eq!(normalize_display("42"), "42");
            assert_eq!(normalize_display("Display is Cannot divide by zero"), "Cannot divide by zero");
        }

        #[test]
        fn test_read_display_initial() {
            let driver = MockDriver::calculator();
            assert_eq!(page(&driver).read_display().unwrap(), "0");
        }

        #[test]
        fn test_verify_display_is_exact() {
            let driver = MockDriver::calculator();
            let p = page(&driver);
            p.add("20", "22").unwrap();
            assert!(p.verify_display("42").unwrap());
            assert!(!p.verify_display("100").unwrap());
            assert!(!p.verify_display(" 42").unwrap());
            assert!(!p.verify_display("42.0").unwrap());
        }

        #[test]
        fn test_missing_display_times_out() {
            let driver = MockDriver::calculator();
            driver.remove_element(&Selector::automation_id("CalculatorResults"));
            let err = page(&driver).read_display().unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotReady { .. }));
        }
    }

    mod input_tests {
        use super::*;

        #[test]
        fn test_click_digit_out_of_range_skips_driver() {
            let driver = MockDriver::calculator();
            let err = page(&driver).click_digit(10).unwrap_err();
            assert!(matches!(err, ProbeError::InvalidArgument { .. }));
            assert!(driver.history().is_empty());
        }

        #[test]
        fn test_enter_zero() {
            let driver = MockDriver::calculator();
            let p = page(&driver);
            p.enter_number("0").unwrap();
            assert_eq!(p.read_display().unwrap(), "0");
        }

        #[test]
        fn test_enter_then_backspace() {
            let driver = MockDriver::calculator();
            let p = page(&driver);
            p.enter_number("12345").unwrap().click_backspace().unwrap();
            assert_eq!(p.read_display().unwrap(), "1234");
        }

        #[test]
        fn test_enter_number_is_lenient() {
            let driver = MockDriver::calculator();
            let p = page(&driver);
            p.enter_number("1a2-3 ").unwrap();
            assert_eq!(p.read_display().unwrap(), "123");
            assert!(!driver.was_called("click:name=Minus"));
        }

        #[test]
        fn test_repeated_clear() {
            let driver = MockDriver::calculator();
            let p = page(&driver);
            p.enter_number("987").unwrap().clear().unwrap().clear().unwrap();
            assert_eq!(p.read_display().unwrap(), "0");
        }

        #[test]
        fn test_disabled_button_times_out() {
            let driver = MockDriver::calculator();
            driver.set_enabled(&Selector::name("Plus"), false);
            let err = page(&driver).click_plus().unwrap_err();
            match err {
                ProbeError::ElementNotReady { readiness, .. } => assert_eq!(readiness, "clickable"),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    mod arithmetic_tests {
        use super::*;

        #[test]
        fn test_add() {
            let driver = MockDriver::calculator();
            let p = page(&driver);
            assert_eq!(p.add("25", "17").unwrap().read_display().unwrap(), "42");
            assert_eq!(p.add("10.5", "5.5").unwrap().read_display().unwrap(), "16");
        }

        #[test]
        fn test_consecutive_equals() {
            let driver = MockDriver::calculator();
            let p = page(&driver);
            p.enter_number("5")
                .unwrap()
                .click_plus()
                .unwrap()
                .enter_number("3")
                .unwrap()
                .click_equals()
                .unwrap();
            assert_eq!(p.read_display().unwrap(), "8");
            p.click_equals().unwrap();
            assert_eq!(p.read_display().unwrap(), "11");
        }

        #[test]
        fn test_divide_by_zero_marker() {
            let driver = MockDriver::calculator();
            let p = page(&driver);
            let shown = p.divide("10", "0").unwrap().read_display().unwrap();
            assert!(["Cannot divide by zero", "∞", "Error"]
                .iter()
                .any(|m| shown.contains(m)));
        }

        #[test]
        fn test_large_multiply() {
            let driver = MockDriver::calculator();
            let p = page(&driver);
            assert_eq!(
                p.multiply("999999", "2").unwrap().read_display().unwrap(),
                "1999998"
            );
        }

        #[test]
        fn test_percent() {
            let driver = MockDriver::calculator();
            let p = page(&driver);
            p.enter_number("200")
                .unwrap()
                .click_multiply()
                .unwrap()
                .enter_number("50")
                .unwrap()
                .click_percent()
                .unwrap()
                .click_equals()
                .unwrap();
            assert_eq!(p.read_display().unwrap(), "100");
        }

        #[test]
        fn test_click_operator_equals_routes_through_settle() {
            let driver = MockDriver::calculator();
            let p = page(&driver);
            p.enter_number("6")
                .unwrap()
                .click_operator(Operator::Multiply)
                .unwrap()
                .enter_number("7")
                .unwrap()
                .click_operator(Operator::Equals)
                .unwrap();
            assert_eq!(p.read_display().unwrap(), "42");
        }
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn test_wait_for_load() {
            let driver = MockDriver::calculator();
            let p = page(&driver);
            assert!(p.wait_for_load().is_ok());
            assert!(p.is_loaded());
            assert_eq!(p.page_name(), "Windows Calculator");
            assert_eq!(p.load_timeout_ms(), 100);
        }

        #[test]
        fn test_not_loaded_without_controls() {
            let driver = MockDriver::new();
            let p = page(&driver);
            assert!(!p.is_loaded());
            assert!(p.wait_for_load().is_err());
        }

        #[test]
        fn test_load_wait_uses_load_timeout() {
            let driver = MockDriver::new();
            let p = page(&driver);
            let err = p.wait_for_load().unwrap_err();
            match err {
                ProbeError::ElementNotReady { timeout_ms, .. } => {
                    assert_eq!(timeout_ms, p.load_timeout_ms());
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_pages_can_be_rebuilt_on_one_session() {
            let driver = MockDriver::calculator();
            page(&driver).enter_number("4").unwrap();
            let second = page(&driver);
            assert_eq!(second.read_display().unwrap(), "4");
        }

        #[test]
        fn test_switch_mode() {
            let driver = MockDriver::calculator();
            let _ = page(&driver).switch_mode(CalculatorMode::Scientific);
            assert_eq!(driver.mode(), CalculatorMode::Scientific);
        }

        #[test]
        fn test_switch_mode_failure_is_swallowed() {
            let driver = MockDriver::calculator();
            driver.remove_element(&Selector::name("Programmer Calculator"));
            let p = page(&driver);
            let same = p.switch_mode(CalculatorMode::Programmer);
            assert_eq!(driver.mode(), CalculatorMode::Standard);
            assert_eq!(same.read_display().unwrap(), "0");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_enter_number_shows_digits(n in 1u32..1_000_000) {
            let driver = MockDriver::calculator();
            let p = page(&driver);
            p.enter_number(&n.to_string()).unwrap();
            prop_assert_eq!(p.read_display().unwrap(), n.to_string());
        }
    }
}
