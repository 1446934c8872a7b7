//! WinAppDriver client over the remote WebDriver JSON protocol.
//!
//! Speaks both response dialects WinAppDriver has shipped: the legacy
//! JSON-wire form (`{"status": 0, "value": ...}` with `{"ELEMENT": id}`
//! references) and the W3C form (HTTP error codes, `{"value": {"error": ..}}`
//! and `element-6066-...` references). Response parsing lives in free
//! functions so it can be tested without a server.

use crate::driver::{AutomationDriver, ElementHandle, Screenshot, SessionConfig};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use base64::Engine;
use reqwest::blocking::Client;
use reqwest::{Method, Url};
use serde_json::{json, Value};
use std::cell::Cell;
use std::time::Duration;

/// W3C web element reference key
pub const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// JSON-wire status code for "no such element"
const STATUS_NO_SUCH_ELEMENT: i64 = 7;

/// Per-request HTTP timeout; app launch on session creation can be slow
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// RESPONSE PARSING
// =============================================================================

/// Extract the session id from a `POST /session` response
#[must_use]
pub fn parse_session_id(body: &Value) -> Option<String> {
    body.get("sessionId")
        .or_else(|| body.get("value").and_then(|v| v.get("sessionId")))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Extract an element id from a find-element `value`
#[must_use]
pub fn parse_element_id(value: &Value) -> Option<String> {
    value
        .get("ELEMENT")
        .or_else(|| value.get(W3C_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Error text carried by a response body, if it reports a failure
#[must_use]
pub fn protocol_error(body: &Value) -> Option<String> {
    let value = body.get("value");
    let message = value
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("");

    if let Some(status) = body.get("status").and_then(Value::as_i64) {
        if status != 0 {
            return Some(format!("status {status}: {message}"));
        }
    }
    value
        .and_then(|v| v.get("error"))
        .and_then(Value::as_str)
        .map(|error| format!("{error}: {message}"))
}

/// Whether a response body reports a missing element
#[must_use]
pub fn is_no_such_element(body: &Value) -> bool {
    body.get("status").and_then(Value::as_i64) == Some(STATUS_NO_SUCH_ELEMENT)
        || body
            .get("value")
            .and_then(|v| v.get("error"))
            .and_then(Value::as_str)
            == Some("no such element")
}

// =============================================================================
// CLIENT
// =============================================================================

/// A live session against a WinAppDriver endpoint
#[derive(Debug)]
pub struct WinAppDriver {
    client: Client,
    base: String,
    session_id: String,
    closed: Cell<bool>,
}

impl WinAppDriver {
    /// Launch the application and open a session.
    ///
    /// # Errors
    ///
    /// [`ProbeError::SessionStart`] for an unusable endpoint URL, a transport
    /// failure or a protocol error from the server.
    pub fn create(config: &SessionConfig) -> ProbeResult<Self> {
        let start_err = |message: String| ProbeError::SessionStart {
            endpoint: config.endpoint.clone(),
            message,
        };

        let url = Url::parse(&config.endpoint).map_err(|e| start_err(format!("invalid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(start_err(format!("unsupported scheme '{}'", url.scheme())));
        }
        let base = config.endpoint.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| start_err(e.to_string()))?;

        tracing::info!(endpoint = %base, app = %config.app, "starting driver session");
        let response = client
            .post(format!("{base}/session"))
            .json(&json!({ "desiredCapabilities": config.capabilities() }))
            .send()
            .map_err(|e| start_err(e.to_string()))?;
        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| start_err(format!("unreadable response (HTTP {status}): {e}")))?;

        if let Some(error) = protocol_error(&body) {
            return Err(start_err(error));
        }
        let session_id = parse_session_id(&body)
            .ok_or_else(|| start_err(format!("no session id in response (HTTP {status})")))?;

        tracing::info!(session_id = %session_id, "driver session started");
        Ok(Self {
            client,
            base,
            session_id,
            closed: Cell::new(false),
        })
    }

    /// Session id assigned by the server
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a session command and return the raw response body
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> ProbeResult<Value> {
        let url = format!("{}/session/{}{path}", self.base, self.session_id);
        tracing::trace!(method = %method, url = %url, "driver command");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send()?;
        let text = response.text()?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Send a session command and return its `value`, failing on protocol errors
    fn command(&self, method: Method, path: &str, body: Option<&Value>) -> ProbeResult<Value> {
        let response = self.send(method, path, body)?;
        if let Some(error) = protocol_error(&response) {
            return Err(ProbeError::driver(format!("{path}: {error}")));
        }
        Ok(response.get("value").cloned().unwrap_or(Value::Null))
    }

    fn element_path(element: &ElementHandle, suffix: &str) -> String {
        format!("/element/{}/{suffix}", element.id)
    }
}

impl AutomationDriver for WinAppDriver {
    fn find(&self, selector: &Selector) -> ProbeResult<Option<ElementHandle>> {
        let body = json!({ "using": selector.strategy(), "value": selector.value() });
        let response = self.send(Method::POST, "/element", Some(&body))?;
        if is_no_such_element(&response) {
            return Ok(None);
        }
        if let Some(error) = protocol_error(&response) {
            return Err(ProbeError::driver(format!("find {selector}: {error}")));
        }
        let id = response
            .get("value")
            .and_then(parse_element_id)
            .ok_or_else(|| ProbeError::driver(format!("find {selector}: no element reference")))?;
        Ok(Some(ElementHandle::new(id, selector.clone())))
    }

    fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool> {
        let value = self.command(Method::GET, &Self::element_path(element, "displayed"), None)?;
        Ok(value.as_bool().unwrap_or(false))
    }

    fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool> {
        let value = self.command(Method::GET, &Self::element_path(element, "enabled"), None)?;
        Ok(value.as_bool().unwrap_or(false))
    }

    fn click(&self, element: &ElementHandle) -> ProbeResult<()> {
        let _ = self.command(
            Method::POST,
            &Self::element_path(element, "click"),
            Some(&json!({})),
        )?;
        Ok(())
    }

    fn text(&self, element: &ElementHandle) -> ProbeResult<String> {
        let value = self.command(Method::GET, &Self::element_path(element, "text"), None)?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn screenshot(&self) -> ProbeResult<Screenshot> {
        let value = self.command(Method::GET, "/screenshot", None)?;
        let encoded = value.as_str().ok_or_else(|| ProbeError::Screenshot {
            message: "screenshot response is not a string".to_string(),
        })?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| ProbeError::Screenshot {
                message: format!("invalid base64: {e}"),
            })?;
        Screenshot::from_png(data)
    }

    fn quit(&self) -> ProbeResult<()> {
        if self.closed.replace(true) {
            return Ok(());
        }
        tracing::info!(session_id = %self.session_id, "ending driver session");
        let url = format!("{}/session/{}", self.base, self.session_id);
        let _ = self.client.delete(&url).send()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod parsing_tests {
        use super::*;

        #[test]
        fn test_session_id_json_wire() {
            let body = json!({ "sessionId": "ABC-1", "status": 0, "value": {} });
            assert_eq!(parse_session_id(&body).as_deref(), Some("ABC-1"));
        }

        #[test]
        fn test_session_id_w3c() {
            let body = json!({ "value": { "sessionId": "w3c-7", "capabilities": {} } });
            assert_eq!(parse_session_id(&body).as_deref(), Some("w3c-7"));
        }

        #[test]
        fn test_session_id_missing() {
            assert!(parse_session_id(&json!({ "value": null })).is_none());
            assert!(parse_session_id(&json!({ "sessionId": "" })).is_none());
        }

        #[test]
        fn test_element_reference_dialects() {
            assert_eq!(
                parse_element_id(&json!({ "ELEMENT": "42.1" })).as_deref(),
                Some("42.1")
            );
            assert_eq!(
                parse_element_id(&json!({ W3C_ELEMENT_KEY: "42.2" })).as_deref(),
                Some("42.2")
            );
            assert!(parse_element_id(&json!({ "id": "x" })).is_none());
        }

        #[test]
        fn test_no_such_element_json_wire() {
            let body = json!({ "status": 7, "value": { "message": "An element could not be located" } });
            assert!(is_no_such_element(&body));
            assert!(protocol_error(&body).unwrap().starts_with("status 7"));
        }

        #[test]
        fn test_no_such_element_w3c() {
            let body = json!({ "value": { "error": "no such element", "message": "not found" } });
            assert!(is_no_such_element(&body));
            assert_eq!(
                protocol_error(&body).as_deref(),
                Some("no such element: not found")
            );
        }

        #[test]
        fn test_success_has_no_error() {
            assert!(protocol_error(&json!({ "status": 0, "value": "Display is 0" })).is_none());
            assert!(protocol_error(&json!({ "value": true })).is_none());
            assert!(!is_no_such_element(&json!({ "status": 0, "value": {} })));
        }

        #[test]
        fn test_other_errors_are_not_missing_elements() {
            let body = json!({ "value": { "error": "invalid session id", "message": "gone" } });
            assert!(!is_no_such_element(&body));
            assert!(protocol_error(&body).is_some());
        }
    }

    mod session_tests {
        use super::*;

        #[test]
        fn test_invalid_url_is_session_start_error() {
            let err = WinAppDriver::create(&SessionConfig::new("not a url")).unwrap_err();
            match err {
                ProbeError::SessionStart { endpoint, message } => {
                    assert_eq!(endpoint, "not a url");
                    assert!(message.contains("invalid URL"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_unsupported_scheme() {
            let err = WinAppDriver::create(&SessionConfig::new("ftp://127.0.0.1:4723")).unwrap_err();
            assert!(matches!(err, ProbeError::SessionStart { .. }));
            assert!(err.is_fatal());
        }

        #[test]
        fn test_unreachable_endpoint() {
            // port 9 (discard) is closed on test hosts
            let err = WinAppDriver::create(&SessionConfig::new("http://127.0.0.1:9")).unwrap_err();
            assert!(matches!(err, ProbeError::SessionStart { .. }));
        }
    }
}
