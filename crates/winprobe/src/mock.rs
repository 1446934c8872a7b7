//! In-process mock of the calculator window.
//!
//! [`MockDriver`] answers lookups for every control in the
//! [`LocatorRegistry`] and runs clicks through a small model of the
//! standard calculator, so page-object operations and the full scenario
//! catalogue run without a Windows host.

use crate::config::ProbeConfig;
use crate::driver::{AutomationDriver, ElementHandle, Screenshot};
use crate::locator::{
    CalculatorMode, LocatorRegistry, Operator, Selector, DIGIT_NAMES, DISPLAY_AUTOMATION_ID,
    NAVIGATION_MENU_NAME,
};
use crate::result::{ProbeError, ProbeResult};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Message shown when dividing by zero
pub const DIVIDE_BY_ZERO: &str = "Cannot divide by zero";

/// Message shown for invalid unary input (square root of a negative)
pub const INVALID_INPUT: &str = "Invalid input";

const MAX_ENTRY_DIGITS: usize = 16;

/// Encode a blank RGBA image as PNG bytes
///
/// # Errors
///
/// [`ProbeError::Screenshot`] if the encoder rejects the dimensions.
pub fn encode_png(width: u32, height: u32) -> ProbeResult<Vec<u8>> {
    let to_err = |e: png::EncodingError| ProbeError::Screenshot {
        message: format!("PNG encoding failed: {e}"),
    };
    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().map_err(to_err)?;
        let pixels = vec![0xFF_u8; (width as usize) * (height as usize) * 4];
        writer.write_image_data(&pixels).map_err(to_err)?;
        writer.finish().map_err(to_err)?;
    }
    Ok(buf)
}

// =============================================================================
// CALCULATOR MODEL
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    const fn from_operator(op: Operator) -> Option<Self> {
        match op {
            Operator::Plus => Some(Self::Add),
            Operator::Minus => Some(Self::Subtract),
            Operator::Multiply => Some(Self::Multiply),
            Operator::Divide => Some(Self::Divide),
            _ => None,
        }
    }

    fn apply(self, a: f64, b: f64) -> Option<f64> {
        match self {
            Self::Add => Some(a + b),
            Self::Subtract => Some(a - b),
            Self::Multiply => Some(a * b),
            Self::Divide if b == 0.0 => None,
            Self::Divide => Some(a / b),
        }
    }
}

/// Standard-mode calculator semantics, evaluated left to right
#[derive(Debug, Clone)]
struct CalculatorModel {
    entry: String,
    accumulator: f64,
    pending: Option<BinaryOp>,
    repeat: Option<(BinaryOp, f64)>,
    /// Next digit starts a new entry
    fresh: bool,
    /// Display holds an operand for the pending operator
    operand_ready: bool,
    error: bool,
}

impl Default for CalculatorModel {
    fn default() -> Self {
        Self {
            entry: "0".to_string(),
            accumulator: 0.0,
            pending: None,
            repeat: None,
            fresh: true,
            operand_ready: false,
            error: false,
        }
    }
}

impl CalculatorModel {
    fn display(&self) -> &str {
        &self.entry
    }

    fn value(&self) -> f64 {
        self.entry.parse().unwrap_or(0.0)
    }

    fn format(value: f64) -> String {
        if value == 0.0 {
            "0".to_string()
        } else {
            format!("{value}")
        }
    }

    fn show_result(&mut self, value: Option<f64>, error_text: &str) {
        match value {
            Some(v) if v.is_finite() => {
                self.entry = Self::format(v);
            }
            _ => {
                self.entry = error_text.to_string();
                self.error = true;
                self.pending = None;
                self.repeat = None;
            }
        }
        self.fresh = true;
    }

    fn digit(&mut self, d: u8) {
        if self.error {
            *self = Self::default();
        }
        let ch = char::from(b'0' + d);
        if self.fresh || self.entry == "0" {
            self.entry = ch.to_string();
            self.fresh = false;
        } else if self.entry.chars().filter(char::is_ascii_digit).count() < MAX_ENTRY_DIGITS {
            self.entry.push(ch);
        }
        self.operand_ready = true;
    }

    fn decimal(&mut self) {
        if self.error {
            *self = Self::default();
        }
        if self.fresh {
            self.entry = "0.".to_string();
            self.fresh = false;
        } else if !self.entry.contains('.') {
            self.entry.push('.');
        }
        self.operand_ready = true;
    }

    fn binary(&mut self, op: BinaryOp) {
        if self.error {
            return;
        }
        match self.pending {
            Some(pending) if self.operand_ready => {
                let result = pending.apply(self.accumulator, self.value());
                self.show_result(result, DIVIDE_BY_ZERO);
                if self.error {
                    return;
                }
                self.accumulator = self.value();
            }
            Some(_) => {}
            None => self.accumulator = self.value(),
        }
        self.pending = Some(op);
        self.fresh = true;
        self.operand_ready = false;
    }

    fn equals(&mut self) {
        if self.error {
            *self = Self::default();
            return;
        }
        let (op, lhs, rhs) = if let Some(op) = self.pending.take() {
            (op, self.accumulator, self.value())
        } else if let Some((op, rhs)) = self.repeat {
            (op, self.value(), rhs)
        } else {
            self.fresh = true;
            return;
        };
        self.repeat = Some((op, rhs));
        self.show_result(op.apply(lhs, rhs), DIVIDE_BY_ZERO);
        self.accumulator = self.value();
        self.operand_ready = false;
    }

    fn percent(&mut self) {
        if self.error {
            return;
        }
        let v = self.value();
        let result = match self.pending {
            Some(BinaryOp::Multiply | BinaryOp::Divide) => v / 100.0,
            Some(BinaryOp::Add | BinaryOp::Subtract) => self.accumulator * v / 100.0,
            None => 0.0,
        };
        self.show_result(Some(result), INVALID_INPUT);
        self.operand_ready = true;
    }

    fn unary(&mut self, f: impl Fn(f64) -> Option<f64>, error_text: &str) {
        if self.error {
            return;
        }
        let result = f(self.value());
        self.show_result(result, error_text);
        self.operand_ready = true;
    }

    fn backspace(&mut self) {
        if self.error {
            *self = Self::default();
            return;
        }
        if self.fresh {
            return;
        }
        let _ = self.entry.pop();
        if self.entry.is_empty() || self.entry == "-" {
            self.entry = "0".to_string();
        }
    }

    fn clear_entry(&mut self) {
        if self.error {
            *self = Self::default();
            return;
        }
        self.entry = "0".to_string();
        self.fresh = true;
        self.operand_ready = true;
    }

    fn sign_toggle(&mut self) {
        if self.error || self.entry == "0" {
            return;
        }
        if let Some(rest) = self.entry.strip_prefix('-') {
            self.entry = rest.to_string();
        } else {
            self.entry.insert(0, '-');
        }
    }

    fn press(&mut self, op: Operator) {
        if let Some(binary) = BinaryOp::from_operator(op) {
            self.binary(binary);
            return;
        }
        match op {
            Operator::Equals => self.equals(),
            Operator::Percent => self.percent(),
            Operator::Decimal => self.decimal(),
            Operator::Backspace => self.backspace(),
            Operator::Clear => *self = Self::default(),
            Operator::ClearEntry => self.clear_entry(),
            Operator::SignToggle => self.sign_toggle(),
            Operator::SquareRoot => {
                self.unary(|v| (v >= 0.0).then(|| v.sqrt()), INVALID_INPUT);
            }
            Operator::Square => self.unary(|v| Some(v * v), INVALID_INPUT),
            Operator::Reciprocal => self.unary(|v| (v != 0.0).then(|| 1.0 / v), DIVIDE_BY_ZERO),
            Operator::Plus | Operator::Minus | Operator::Multiply | Operator::Divide => {}
        }
    }
}

// =============================================================================
// MOCK DRIVER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockControl {
    Digit(u8),
    Operator(Operator),
    Display,
    NavigationMenu,
    Mode(CalculatorMode),
}

#[derive(Debug, Clone)]
struct MockElement {
    id: String,
    control: MockControl,
    displayed: bool,
    enabled: bool,
}

/// Mock driver simulating the Windows Calculator for unit tests
#[derive(Debug, Default)]
pub struct MockDriver {
    elements: RefCell<HashMap<Selector, MockElement>>,
    model: RefCell<CalculatorModel>,
    mode: Cell<CalculatorMode>,
    menu_open: Cell<bool>,
    screenshot_data: RefCell<Option<Vec<u8>>>,
    quit_count: Cell<u32>,
    call_history: RefCell<Vec<String>>,
}

impl MockDriver {
    /// Create an empty mock driver with no elements
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock exposing every control of the standard calculator
    #[must_use]
    pub fn calculator() -> Self {
        let driver = Self::new();
        let registry = LocatorRegistry::new();
        for d in 0..=9u8 {
            if let Ok(selector) = registry.digit(d) {
                driver.add_element(selector, MockControl::Digit(d), true);
            }
        }
        for op in Operator::ALL {
            driver.add_element(registry.operator(op), MockControl::Operator(op), true);
        }
        driver.add_element(
            Selector::automation_id(DISPLAY_AUTOMATION_ID),
            MockControl::Display,
            true,
        );
        driver.add_element(
            Selector::name(NAVIGATION_MENU_NAME),
            MockControl::NavigationMenu,
            true,
        );
        for mode in [
            CalculatorMode::Standard,
            CalculatorMode::Scientific,
            CalculatorMode::Programmer,
        ] {
            driver.add_element(
                Selector::name(mode.accessibility_name()),
                MockControl::Mode(mode),
                false,
            );
        }
        *driver.screenshot_data.borrow_mut() = encode_png(4, 3).ok();
        driver
    }

    fn add_element(&self, selector: Selector, control: MockControl, displayed: bool) {
        let mut elements = self.elements.borrow_mut();
        let id = format!("mock-{}", elements.len() + 1);
        let _ = elements.insert(
            selector,
            MockElement {
                id,
                control,
                displayed,
                enabled: true,
            },
        );
    }

    /// Remove an element so lookups for it return nothing
    pub fn remove_element(&self, selector: &Selector) {
        let _ = self.elements.borrow_mut().remove(selector);
    }

    /// Enable or disable an element
    pub fn set_enabled(&self, selector: &Selector, enabled: bool) {
        if let Some(el) = self.elements.borrow_mut().get_mut(selector) {
            el.enabled = enabled;
        }
    }

    /// Replace the screenshot returned by [`AutomationDriver::screenshot`];
    /// `None` makes capture fail
    pub fn set_screenshot(&self, png: Option<Vec<u8>>) {
        *self.screenshot_data.borrow_mut() = png;
    }

    /// Current display text without the narration prefix
    #[must_use]
    pub fn display_value(&self) -> String {
        self.model.borrow().display().to_string()
    }

    /// Mode selected through the navigation menu
    #[must_use]
    pub fn mode(&self) -> CalculatorMode {
        self.mode.get()
    }

    /// Session factory handing out this mock for every session request
    pub fn session_factory<'m>(&'m self) -> impl Fn(&ProbeConfig) -> ProbeResult<&'m Self> + 'm {
        move |_| Ok(self)
    }

    /// Number of times [`AutomationDriver::quit`] was called
    #[must_use]
    pub fn quit_count(&self) -> u32 {
        self.quit_count.get()
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.call_history.borrow().clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history
            .borrow()
            .iter()
            .any(|c| c.starts_with(method))
    }

    fn record(&self, call: String) {
        self.call_history.borrow_mut().push(call);
    }

    fn lookup(&self, element: &ElementHandle) -> ProbeResult<MockElement> {
        self.elements
            .borrow()
            .get(&element.selector)
            .filter(|el| el.id == element.id)
            .cloned()
            .ok_or_else(|| ProbeError::driver(format!("stale element reference: {}", element.id)))
    }

    fn set_mode_entries_displayed(&self, displayed: bool) {
        for el in self.elements.borrow_mut().values_mut() {
            if matches!(el.control, MockControl::Mode(_)) {
                el.displayed = displayed;
            }
        }
        self.menu_open.set(displayed);
    }
}

impl AutomationDriver for MockDriver {
    fn find(&self, selector: &Selector) -> ProbeResult<Option<ElementHandle>> {
        self.record(format!("find:{selector}"));
        Ok(self
            .elements
            .borrow()
            .get(selector)
            .map(|el| ElementHandle::new(el.id.clone(), selector.clone())))
    }

    fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool> {
        Ok(self.lookup(element)?.displayed)
    }

    fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool> {
        Ok(self.lookup(element)?.enabled)
    }

    fn click(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.record(format!("click:{}", element.selector));
        let el = self.lookup(element)?;
        if !el.displayed || !el.enabled {
            return Err(ProbeError::driver(format!(
                "element not interactable: {}",
                element.selector
            )));
        }
        match el.control {
            MockControl::Digit(d) => self.model.borrow_mut().digit(d),
            MockControl::Operator(op) => self.model.borrow_mut().press(op),
            MockControl::Display => {}
            MockControl::NavigationMenu => {
                let open = !self.menu_open.get();
                self.set_mode_entries_displayed(open);
            }
            MockControl::Mode(mode) => {
                self.mode.set(mode);
                *self.model.borrow_mut() = CalculatorModel::default();
                self.set_mode_entries_displayed(false);
            }
        }
        Ok(())
    }

    fn text(&self, element: &ElementHandle) -> ProbeResult<String> {
        self.record(format!("text:{}", element.selector));
        let el = self.lookup(element)?;
        Ok(match el.control {
            MockControl::Display => format!("Display is {}", self.model.borrow().display()),
            MockControl::Digit(d) => DIGIT_NAMES[usize::from(d)].to_string(),
            MockControl::Operator(op) => op.accessibility_name().to_string(),
            MockControl::NavigationMenu => NAVIGATION_MENU_NAME.to_string(),
            MockControl::Mode(mode) => mode.accessibility_name().to_string(),
        })
    }

    fn screenshot(&self) -> ProbeResult<Screenshot> {
        self.record("screenshot".to_string());
        let data = self
            .screenshot_data
            .borrow()
            .clone()
            .ok_or_else(|| ProbeError::Screenshot {
                message: "No mock screenshot set".to_string(),
            })?;
        Screenshot::from_png(data)
    }

    fn quit(&self) -> ProbeResult<()> {
        self.record("quit".to_string());
        self.quit_count.set(self.quit_count.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn press(driver: &MockDriver, name: &str) {
        let selector = LocatorRegistry::new().resolve_name(name).unwrap();
        let el = driver.find(&selector).unwrap().unwrap();
        driver.click(&el).unwrap();
    }

    fn keys(driver: &MockDriver, seq: &[&str]) -> String {
        for k in seq {
            press(driver, k);
        }
        driver.display_value()
    }

    mod model_tests {
        use super::*;

        #[test]
        fn test_starts_at_zero() {
            assert_eq!(MockDriver::calculator().display_value(), "0");
        }

        #[test]
        fn test_leading_zero_replaced() {
            let d = MockDriver::calculator();
            assert_eq!(keys(&d, &["0", "0", "7"]), "7");
        }

        #[test]
        fn test_left_to_right_chain() {
            let d = MockDriver::calculator();
            assert_eq!(
                keys(&d, &["1", "0", "0", "minus", "5", "0", "plus", "2", "0", "equals"]),
                "70"
            );
        }

        #[test]
        fn test_repeated_equals() {
            let d = MockDriver::calculator();
            assert_eq!(keys(&d, &["5", "plus", "3", "equals"]), "8");
            assert_eq!(keys(&d, &["equals"]), "11");
            assert_eq!(keys(&d, &["equals"]), "14");
        }

        #[test]
        fn test_percent_in_multiply_context() {
            let d = MockDriver::calculator();
            assert_eq!(keys(&d, &["2", "0", "0", "multiply", "5", "0", "percent"]), "0.5");
            assert_eq!(keys(&d, &["equals"]), "100");
        }

        #[test]
        fn test_percent_in_add_context() {
            let d = MockDriver::calculator();
            assert_eq!(keys(&d, &["2", "0", "0", "plus", "1", "0", "percent", "equals"]), "220");
        }

        #[test]
        fn test_divide_by_zero() {
            let d = MockDriver::calculator();
            assert_eq!(keys(&d, &["1", "0", "divide", "0", "equals"]), DIVIDE_BY_ZERO);
            // next digit starts over
            assert_eq!(keys(&d, &["4"]), "4");
        }

        #[test]
        fn test_unary_operators() {
            let d = MockDriver::calculator();
            assert_eq!(keys(&d, &["1", "6", "sqrt"]), "4");
            assert_eq!(keys(&d, &["clear", "5", "square"]), "25");
            assert_eq!(keys(&d, &["clear", "4", "reciprocal"]), "0.25");
            assert_eq!(keys(&d, &["clear", "0", "reciprocal"]), DIVIDE_BY_ZERO);
        }

        #[test]
        fn test_sign_toggle_and_backspace() {
            let d = MockDriver::calculator();
            assert_eq!(keys(&d, &["4", "2", "sign_toggle"]), "-42");
            assert_eq!(keys(&d, &["sign_toggle"]), "42");
            assert_eq!(keys(&d, &["clear", "1", "2", "3", "backspace"]), "12");
            assert_eq!(keys(&d, &["backspace", "backspace", "backspace"]), "0");
        }

        #[test]
        fn test_clear_entry_keeps_pending_operation() {
            let d = MockDriver::calculator();
            assert_eq!(
                keys(&d, &["1", "0", "plus", "9", "9", "9", "clear_entry", "5", "equals"]),
                "15"
            );
        }

        #[test]
        fn test_decimal_entry() {
            let d = MockDriver::calculator();
            assert_eq!(
                keys(&d, &["1", "0", "decimal", "5", "plus", "5", "decimal", "5", "equals"]),
                "16"
            );
            assert_eq!(keys(&d, &["decimal", "5"]), "0.5");
        }

        #[test]
        fn test_large_numbers_are_not_truncated() {
            let d = MockDriver::calculator();
            assert_eq!(
                keys(&d, &["9", "9", "9", "9", "9", "9", "multiply", "2", "equals"]),
                "1999998"
            );
        }
    }

    mod driver_tests {
        use super::*;

        #[test]
        fn test_display_text_has_prefix() {
            let d = MockDriver::calculator();
            let el = d
                .find(&Selector::automation_id(DISPLAY_AUTOMATION_ID))
                .unwrap()
                .unwrap();
            assert_eq!(d.text(&el).unwrap(), "Display is 0");
        }

        #[test]
        fn test_removed_element_not_found() {
            let d = MockDriver::calculator();
            d.remove_element(&Selector::name("Seven"));
            assert!(d.find(&Selector::name("Seven")).unwrap().is_none());
        }

        #[test]
        fn test_disabled_click_fails() {
            let d = MockDriver::calculator();
            let sel = Selector::name("Plus");
            d.set_enabled(&sel, false);
            let el = d.find(&sel).unwrap().unwrap();
            assert!(matches!(d.click(&el), Err(ProbeError::Driver { .. })));
        }

        #[test]
        fn test_navigation_reveals_modes() {
            let d = MockDriver::calculator();
            let sci = d
                .find(&Selector::name("Scientific Calculator"))
                .unwrap()
                .unwrap();
            assert!(!d.is_displayed(&sci).unwrap());
            press(&d, "Open Navigation");
            assert!(d.is_displayed(&sci).unwrap());
            d.click(&sci).unwrap();
            assert_eq!(d.mode(), CalculatorMode::Scientific);
            assert!(!d.is_displayed(&sci).unwrap());
        }

        #[test]
        fn test_screenshot_and_history() {
            let d = MockDriver::calculator();
            let shot = d.screenshot().unwrap();
            assert_eq!((shot.width, shot.height), (4, 3));
            assert!(d.was_called("screenshot"));

            d.set_screenshot(None);
            assert!(matches!(d.screenshot(), Err(ProbeError::Screenshot { .. })));
        }

        #[test]
        fn test_quit_is_counted() {
            let d = MockDriver::calculator();
            d.quit().unwrap();
            d.quit().unwrap();
            assert_eq!(d.quit_count(), 2);
        }

        #[test]
        fn test_empty_mock_finds_nothing() {
            let d = MockDriver::new();
            assert!(d.find(&Selector::name("One")).unwrap().is_none());
            assert!(d.history().iter().any(|c| c == "find:name=One"));
        }
    }
}
