//! AutomationDriver - Abstract Accessibility Automation Trait
//!
//! The page object never talks to a transport directly. It issues lookups,
//! clicks and text reads through this trait, which lets the same operations
//! run against a live WinAppDriver session or the in-process [`MockDriver`].
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  AutomationDriver (trait)                                     │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────┐   ┌───────────────────────────┐  │
//! │  │  WinAppDriver           │   │  MockDriver               │  │
//! │  │  remote JSON protocol   │   │  simulated calculator     │  │
//! │  │  over reqwest::blocking │   │  for unit tests           │  │
//! │  └─────────────────────────┘   └───────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`MockDriver`]: crate::mock::MockDriver

use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{Readiness, WaitPolicy, Waiter};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::SystemTime;

/// Opaque reference to a UI element returned by the driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned element id
    pub id: String,
    /// Selector the element was found with
    pub selector: Selector,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, selector: Selector) -> Self {
        Self {
            id: id.into(),
            selector,
        }
    }
}

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Timestamp when screenshot was taken
    pub timestamp: SystemTime,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp: SystemTime::now(),
        }
    }

    /// Build a screenshot from encoded PNG bytes, reading the dimensions
    /// from the image header.
    ///
    /// # Errors
    ///
    /// [`ProbeError::Screenshot`] if the bytes are not a PNG stream.
    pub fn from_png(data: Vec<u8>) -> ProbeResult<Self> {
        let (width, height) = {
            let decoder = png::Decoder::new(Cursor::new(data.as_slice()));
            let reader = decoder.read_info().map_err(|e| ProbeError::Screenshot {
                message: format!("invalid PNG data: {e}"),
            })?;
            let info = reader.info();
            (info.width, info.height)
        };
        Ok(Self::new(data, width, height))
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if screenshot is valid (has data)
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty() && self.width > 0 && self.height > 0
    }
}

/// Capability interface to the accessibility automation layer.
///
/// Methods take `&self`; a session is exclusive to one thread and
/// implementations are free to use interior mutability.
pub trait AutomationDriver {
    /// Look up an element; `Ok(None)` when nothing matches
    fn find(&self, selector: &Selector) -> ProbeResult<Option<ElementHandle>>;

    /// Whether the element is displayed
    fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool>;

    /// Whether the element accepts input
    fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool>;

    /// Invoke a click on the element
    fn click(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Read the element's text content
    fn text(&self, element: &ElementHandle) -> ProbeResult<String>;

    /// Capture the application window
    fn screenshot(&self) -> ProbeResult<Screenshot>;

    /// End the session. Calling it more than once is allowed.
    fn quit(&self) -> ProbeResult<()>;

    /// Wait until `selector` reaches `readiness` within `policy`
    fn wait_until(
        &self,
        selector: &Selector,
        readiness: Readiness,
        policy: &WaitPolicy,
    ) -> ProbeResult<ElementHandle> {
        Waiter::new(*policy).for_element(self, selector, readiness)
    }
}

impl<D: AutomationDriver + ?Sized> AutomationDriver for &D {
    fn find(&self, selector: &Selector) -> ProbeResult<Option<ElementHandle>> {
        (**self).find(selector)
    }

    fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool> {
        (**self).is_displayed(element)
    }

    fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool> {
        (**self).is_enabled(element)
    }

    fn click(&self, element: &ElementHandle) -> ProbeResult<()> {
        (**self).click(element)
    }

    fn text(&self, element: &ElementHandle) -> ProbeResult<String> {
        (**self).text(element)
    }

    fn screenshot(&self) -> ProbeResult<Screenshot> {
        (**self).screenshot()
    }

    fn quit(&self) -> ProbeResult<()> {
        (**self).quit()
    }
}

/// Connection settings for a driver session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Remote endpoint (e.g. `http://127.0.0.1:4723`)
    pub endpoint: String,
    /// Value of the `app` capability
    pub app: String,
    /// Additional desired capabilities
    pub extra_capabilities: Vec<(String, String)>,
}

/// Package identifier of the inbox Windows Calculator
pub const CALCULATOR_APP_ID: &str = "Microsoft.WindowsCalculator_8wekyb3d8bbwe!App";

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:4723".to_string(),
            app: CALCULATOR_APP_ID.to_string(),
            extra_capabilities: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Create a session config for an endpoint
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set the `app` capability
    #[must_use]
    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = app.into();
        self
    }

    /// Add a desired capability
    #[must_use]
    pub fn with_capability(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_capabilities.push((name.into(), value.into()));
        self
    }

    /// Desired capabilities as a JSON object
    #[must_use]
    pub fn capabilities(&self) -> serde_json::Value {
        let mut caps = serde_json::Map::new();
        let _ = caps.insert("app".to_string(), self.app.clone().into());
        let _ = caps.insert("platformName".to_string(), "Windows".into());
        let _ = caps.insert("deviceName".to_string(), "WindowsPC".into());
        for (name, value) in &self.extra_capabilities {
            let _ = caps.insert(name.clone(), value.clone().into());
        }
        serde_json::Value::Object(caps)
    }
}
