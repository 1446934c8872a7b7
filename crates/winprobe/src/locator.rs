//! Locator registry for the Windows Calculator accessibility tree.
//!
//! Every control the page object touches is listed here exactly once. The
//! registry is closed: there is no dynamic registration, and resolution is a
//! pure table lookup with no driver interaction.
//!
//! # Design Philosophy
//!
//! - **Strict Selection**: one selector per logical control
//! - **Fail Early**: out-of-range digits and unknown names never reach the driver

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::result::{ProbeError, ProbeResult};

/// Accessibility name of each digit button, indexed by the digit value
pub const DIGIT_NAMES: [&str; 10] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine",
];

/// Automation id of the result display
pub const DISPLAY_AUTOMATION_ID: &str = "CalculatorResults";

/// Accessibility name of the navigation menu toggle
pub const NAVIGATION_MENU_NAME: &str = "Open Navigation";

/// Selector type for locating elements in the accessibility tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// Match on the element's accessibility name
    ByName(String),
    /// Match on the element's automation id
    ByAutomationId(String),
}

impl Selector {
    /// Create a name selector
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::ByName(name.into())
    }

    /// Create an automation id selector
    #[must_use]
    pub fn automation_id(id: impl Into<String>) -> Self {
        Self::ByAutomationId(id.into())
    }

    /// Locator strategy understood by the remote automation endpoint
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::ByName(_) => "name",
            Self::ByAutomationId(_) => "accessibility id",
        }
    }

    /// The raw lookup value
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::ByName(v) | Self::ByAutomationId(v) => v,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

/// Operator and editing controls of the standard calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `×`
    Multiply,
    /// `÷`
    Divide,
    /// `=`
    Equals,
    /// `%`
    Percent,
    /// Decimal separator
    Decimal,
    /// `⌫`
    Backspace,
    /// `C`
    Clear,
    /// `CE`
    ClearEntry,
    /// `±`
    SignToggle,
    /// `√x`
    SquareRoot,
    /// `x²`
    Square,
    /// `1/x`
    Reciprocal,
}

impl Operator {
    /// Every operator, in registry order
    pub const ALL: [Self; 14] = [
        Self::Plus,
        Self::Minus,
        Self::Multiply,
        Self::Divide,
        Self::Equals,
        Self::Percent,
        Self::Decimal,
        Self::Backspace,
        Self::Clear,
        Self::ClearEntry,
        Self::SignToggle,
        Self::SquareRoot,
        Self::Square,
        Self::Reciprocal,
    ];

    /// Accessibility name of the button
    #[must_use]
    pub const fn accessibility_name(self) -> &'static str {
        match self {
            Self::Plus => "Plus",
            Self::Minus => "Minus",
            Self::Multiply => "Multiply by",
            Self::Divide => "Divide by",
            Self::Equals => "Equals",
            Self::Percent => "Percent",
            Self::Decimal => "Decimal separator",
            Self::Backspace => "Backspace",
            Self::Clear => "Clear",
            Self::ClearEntry => "Clear entry",
            Self::SignToggle => "Positive negative",
            Self::SquareRoot => "Square root",
            Self::Square => "Square",
            Self::Reciprocal => "Reciprocal",
        }
    }

    /// Snake-case key used in logs and name resolution
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
            Self::Equals => "equals",
            Self::Percent => "percent",
            Self::Decimal => "decimal",
            Self::Backspace => "backspace",
            Self::Clear => "clear",
            Self::ClearEntry => "clear_entry",
            Self::SignToggle => "sign_toggle",
            Self::SquareRoot => "sqrt",
            Self::Square => "square",
            Self::Reciprocal => "reciprocal",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Calculator modes reachable from the navigation menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CalculatorMode {
    /// Standard calculator
    #[default]
    Standard,
    /// Scientific calculator
    Scientific,
    /// Programmer calculator
    Programmer,
}

impl CalculatorMode {
    /// Parse a mode name; unrecognised names fall back to [`CalculatorMode::Standard`]
    #[must_use]
    pub fn parse(mode: &str) -> Self {
        match mode.trim().to_lowercase().as_str() {
            "scientific" => Self::Scientific,
            "programmer" => Self::Programmer,
            _ => Self::Standard,
        }
    }

    /// Accessibility name of the navigation entry
    #[must_use]
    pub const fn accessibility_name(self) -> &'static str {
        match self {
            Self::Standard => "Standard Calculator",
            Self::Scientific => "Scientific Calculator",
            Self::Programmer => "Programmer Calculator",
        }
    }
}

impl fmt::Display for CalculatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Standard => "standard",
            Self::Scientific => "scientific",
            Self::Programmer => "programmer",
        };
        f.write_str(name)
    }
}

/// A logical control on the calculator window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Digit button, valid for 0..=9
    Digit(u8),
    /// Operator or editing button
    Operator(Operator),
    /// Result display
    Display,
    /// Navigation menu toggle
    NavigationMenu,
    /// Mode entry inside the navigation menu
    Mode(CalculatorMode),
}

/// Fixed mapping from logical control to accessibility selector
#[derive(Debug, Clone, Copy, Default)]
pub struct LocatorRegistry;

impl LocatorRegistry {
    /// Create the registry
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolve a logical control to its selector
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidArgument`] for digits outside 0–9.
    pub fn resolve(&self, control: Control) -> ProbeResult<Selector> {
        match control {
            Control::Digit(d) => self.digit(d),
            Control::Operator(op) => Ok(self.operator(op)),
            Control::Display => Ok(Selector::automation_id(DISPLAY_AUTOMATION_ID)),
            Control::NavigationMenu => Ok(Selector::name(NAVIGATION_MENU_NAME)),
            Control::Mode(mode) => Ok(Selector::name(mode.accessibility_name())),
        }
    }

    /// Selector for a digit button
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidArgument`] when `d > 9`.
    pub fn digit(&self, d: u8) -> ProbeResult<Selector> {
        DIGIT_NAMES
            .get(usize::from(d))
            .map(|name| Selector::name(*name))
            .ok_or_else(|| ProbeError::invalid_argument(format!("digit must be 0-9, got {d}")))
    }

    /// Selector for an operator button
    #[must_use]
    pub fn operator(&self, op: Operator) -> Selector {
        Selector::name(op.accessibility_name())
    }

    /// Resolve a control by name.
    ///
    /// Accepts accessibility names ("Multiply by", "Seven"), operator keys
    /// ("clear_entry"), numerals ("7") and the display/menu names, all
    /// case-insensitive.
    ///
    /// # Errors
    ///
    /// Numerals above 9 fail with [`ProbeError::InvalidArgument`]; anything
    /// else unrecognised fails with [`ProbeError::UnknownControl`].
    pub fn resolve_name(&self, name: &str) -> ProbeResult<Selector> {
        let wanted = name.trim();
        if let Ok(n) = wanted.parse::<i64>() {
            return u8::try_from(n)
                .ok()
                .filter(|d| *d <= 9)
                .ok_or_else(|| ProbeError::invalid_argument(format!("digit must be 0-9, got {n}")))
                .and_then(|d| self.digit(d));
        }

        if let Some(d) = DIGIT_NAMES
            .iter()
            .position(|n| n.eq_ignore_ascii_case(wanted))
        {
            return self.digit(d as u8);
        }

        if let Some(op) = Operator::ALL.iter().find(|op| {
            op.accessibility_name().eq_ignore_ascii_case(wanted) || op.key().eq_ignore_ascii_case(wanted)
        }) {
            return Ok(self.operator(*op));
        }

        if wanted.eq_ignore_ascii_case(DISPLAY_AUTOMATION_ID) || wanted.eq_ignore_ascii_case("display") {
            return self.resolve(Control::Display);
        }
        if wanted.eq_ignore_ascii_case(NAVIGATION_MENU_NAME) {
            return self.resolve(Control::NavigationMenu);
        }
        for mode in [
            CalculatorMode::Standard,
            CalculatorMode::Scientific,
            CalculatorMode::Programmer,
        ] {
            if mode.accessibility_name().eq_ignore_ascii_case(wanted) {
                return self.resolve(Control::Mode(mode));
            }
        }

        Err(ProbeError::UnknownControl {
            name: name.to_string(),
        })
    }

    /// Every control in the registry with its selector
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Selector)> {
        let mut entries: Vec<(String, Selector)> = DIGIT_NAMES
            .iter()
            .map(|n| ((*n).to_string(), Selector::name(*n)))
            .collect();
        entries.extend(
            Operator::ALL
                .iter()
                .map(|op| (op.key().to_string(), self.operator(*op))),
        );
        entries.push((
            "display".to_string(),
            Selector::automation_id(DISPLAY_AUTOMATION_ID),
        ));
        entries.push((
            "navigation".to_string(),
            Selector::name(NAVIGATION_MENU_NAME),
        ));
        for mode in [
            CalculatorMode::Standard,
            CalculatorMode::Scientific,
            CalculatorMode::Programmer,
        ] {
            entries.push((
                format!("mode_{mode}"),
                Selector::name(mode.accessibility_name()),
            ));
        }
        entries
    }
}
