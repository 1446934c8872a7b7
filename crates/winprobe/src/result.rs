//! Result and error types for winprobe.

use thiserror::Error;

/// Result type for winprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving the calculator
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Required configuration missing or invalid
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Driver session could not be established
    #[error("Failed to start driver session at {endpoint}: {message}")]
    SessionStart {
        /// Endpoint the session was requested from
        endpoint: String,
        /// Error message
        message: String,
    },

    /// Wait-for-condition timed out on a control
    #[error("Element {selector} not {readiness} after {timeout_ms}ms")]
    ElementNotReady {
        /// Selector that was waited on
        selector: String,
        /// Readiness state that was required
        readiness: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Out-of-domain input to an operation
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Locator resolution miss
    #[error("Unknown control: {name}")]
    UnknownControl {
        /// Name that failed to resolve
        name: String,
    },

    /// A single driver command failed
    #[error("Driver command failed: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Screenshot capture or decoding failed
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Scenario expectation not met
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ProbeError {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a driver command error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Whether this error must abort the whole suite
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::SessionStart { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_element_not_ready_message() {
        let err = ProbeError::ElementNotReady {
            selector: "name=Plus".to_string(),
            readiness: "clickable".to_string(),
            timeout_ms: 25_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("name=Plus"));
        assert!(msg.contains("clickable"));
        assert!(msg.contains("25000ms"));
    }

    #[test]
    fn test_constructors() {
        assert!(ProbeError::configuration("x")
            .to_string()
            .starts_with("Configuration error"));
        assert!(ProbeError::invalid_argument("x")
            .to_string()
            .starts_with("Invalid argument"));
        assert!(ProbeError::driver("x").to_string().contains("Driver"));
        assert!(ProbeError::assertion("x").to_string().contains("Assertion"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ProbeError::configuration("missing").is_fatal());
        assert!(ProbeError::SessionStart {
            endpoint: "http://127.0.0.1:4723".to_string(),
            message: "refused".to_string(),
        }
        .is_fatal());
        assert!(!ProbeError::invalid_argument("digit 12").is_fatal());
        assert!(!ProbeError::UnknownControl {
            name: "Foo".to_string()
        }
        .is_fatal());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ProbeError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
