//! Standard-mode calculator scenarios.
//!
//! Each scenario is independent: the harness clears the calculator before it
//! runs, and compound operations clear again before computing.

use crate::assertion::Assertion;
use crate::harness::{Scenario, ScenarioFn, TestSuite};
use crate::page_object::CalculatorPage;
use crate::result::ProbeResult;

/// Markers any of which identify a divide-by-zero error on the display
pub const DIVIDE_BY_ZERO_MARKERS: [&str; 3] = ["Cannot divide by zero", "∞", "Error"];

fn expect_display(page: &CalculatorPage<'_>, expected: &str) -> ProbeResult<()> {
    let shown = page.read_display()?;
    Assertion::equals(expected, shown.as_str()).into_result()
}

fn addition(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.add("25", "17")?;
    expect_display(page, "42")
}

fn subtraction(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.subtract("100", "42")?;
    expect_display(page, "58")
}

fn multiplication(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.multiply("6", "7")?;
    expect_display(page, "42")
}

fn division(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.divide("84", "2")?;
    expect_display(page, "42")
}

fn decimal_addition(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.add("10.5", "5.5")?;
    expect_display(page, "16")
}

fn clear(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.enter_number("12345")?;
    expect_display(page, "12345")?;
    let _ = page.clear()?;
    expect_display(page, "0")
}

fn backspace(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.enter_number("123")?.click_backspace()?;
    expect_display(page, "12")
}

fn sign_toggle(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.enter_number("42")?.click_sign_toggle()?;
    expect_display(page, "-42")
}

fn square_root(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.enter_number("16")?.click_square_root()?;
    expect_display(page, "4")
}

fn square(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.enter_number("5")?.click_square()?;
    expect_display(page, "25")
}

fn reciprocal(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.enter_number("4")?.click_reciprocal()?;
    expect_display(page, "0.25")
}

fn chained_operations(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page
        .enter_number("10")?
        .click_plus()?
        .enter_number("5")?
        .click_equals()?
        .click_multiply()?
        .enter_number("2")?
        .click_equals()?;
    expect_display(page, "30")
}

fn divide_by_zero(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.divide("10", "0")?;
    let shown = page.read_display()?;
    Assertion::contains_any(&shown, &DIVIDE_BY_ZERO_MARKERS)
        .context("divide by zero")
        .into_result()
}

fn large_numbers(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.multiply("999999", "2")?;
    expect_display(page, "1999998")
}

fn consecutive_equals(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.add("5", "3")?;
    expect_display(page, "8")?;
    // repeats the last operation: 8 + 3
    let _ = page.click_equals()?;
    expect_display(page, "11")
}

fn percentage(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page
        .enter_number("200")?
        .click_multiply()?
        .enter_number("50")?
        .click_percent()?
        .click_equals()?;
    expect_display(page, "100")
}

fn clear_entry(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page
        .enter_number("10")?
        .click_plus()?
        .enter_number("999")?
        .clear_entry()?
        .enter_number("5")?
        .click_equals()?;
    expect_display(page, "15")
}

fn mixed_operations(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page
        .enter_number("100")?
        .click_minus()?
        .enter_number("50")?
        .click_plus()?
        .enter_number("20")?
        .click_equals()?;
    expect_display(page, "70")
}

fn verify_display(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.add("25", "17")?;
    Assertion::is_true(page.verify_display("42")?, "display should read 42").into_result()?;
    Assertion::is_false(page.verify_display("100")?, "display should not read 100").into_result()
}

fn zero_operations(page: &CalculatorPage<'_>) -> ProbeResult<()> {
    let _ = page.add("0", "0")?;
    expect_display(page, "0")?;
    let _ = page.multiply("0", "100")?;
    expect_display(page, "0")
}

/// The standard calculator suite, in priority order
#[must_use]
pub fn calculator_suite() -> TestSuite {
    let catalogue: [(&str, &str, ScenarioFn); 20] = [
        ("addition", "25 + 17 = 42", addition),
        ("subtraction", "100 - 42 = 58", subtraction),
        ("multiplication", "6 × 7 = 42", multiplication),
        ("division", "84 ÷ 2 = 42", division),
        ("decimal_addition", "10.5 + 5.5 = 16", decimal_addition),
        ("clear", "12345, clear resets to 0", clear),
        ("backspace", "123, backspace leaves 12", backspace),
        ("sign_toggle", "42, ± gives -42", sign_toggle),
        ("square_root", "√16 = 4", square_root),
        ("square", "5² = 25", square),
        ("reciprocal", "1/4 = 0.25", reciprocal),
        ("chained_operations", "(10 + 5 =) × 2 = 30", chained_operations),
        ("divide_by_zero", "10 ÷ 0 shows an error", divide_by_zero),
        ("large_numbers", "999999 × 2 = 1999998", large_numbers),
        ("consecutive_equals", "5 + 3 = 8, = again gives 11", consecutive_equals),
        ("percentage", "200 × 50 % = 100", percentage),
        ("clear_entry", "10 + 999, CE, 5 = 15", clear_entry),
        ("mixed_operations", "100 - 50 + 20 = 70", mixed_operations),
        ("verify_display", "verify_display matches exactly", verify_display),
        ("zero_operations", "0 + 0 = 0 and 0 × 100 = 0", zero_operations),
    ];

    catalogue
        .into_iter()
        .zip(1..)
        .fold(TestSuite::new("Windows Calculator"), |suite, ((name, description, run), priority)| {
            suite.with_scenario(Scenario::new(name, priority, run).with_description(description))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use crate::harness::SuiteHarness;
    use crate::mock::MockDriver;
    use crate::wait::WaitPolicy;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_is_ordered_and_unique() {
        let suite = calculator_suite();
        assert_eq!(suite.test_count(), 20);
        let priorities: Vec<u32> = suite.scenarios.iter().map(|s| s.priority).collect();
        assert_eq!(priorities, (1..=20).collect::<Vec<_>>());
        let names: HashSet<&str> = suite.scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), 20);
    }

    #[test]
    fn test_each_scenario_passes_on_fresh_calculator() {
        let policy = WaitPolicy::new()
            .with_timeout(200)
            .with_poll_interval(5)
            .with_settle_timeout(30);
        for scenario in &calculator_suite().scenarios {
            let mock = MockDriver::calculator();
            let page = CalculatorPage::with_policy(&mock, policy);
            scenario
                .run(&page)
                .unwrap_or_else(|e| panic!("{} failed: {e}", scenario.name));
        }
    }

    #[test]
    fn test_full_suite_on_one_session() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = ProbeConfig::for_endpoint("http://127.0.0.1:4723");
        config.element_timeout_ms = 200;
        config.poll_interval_ms = 5;
        config.settle_timeout_ms = 30;
        config.screenshot_dir = dir.path().join("screenshots");
        config.report_dir = dir.path().join("reports");

        let mock = MockDriver::calculator();
        let results =
            SuiteHarness::new(config, mock.session_factory()).run(&calculator_suite());

        assert_eq!(results.total(), 20);
        assert!(results.all_passed(), "failures: {:?}", results.failures());
        assert_eq!(mock.quit_count(), 1);
    }

    #[test]
    fn test_divide_by_zero_markers() {
        assert!(DIVIDE_BY_ZERO_MARKERS.contains(&crate::mock::DIVIDE_BY_ZERO));
    }
}
