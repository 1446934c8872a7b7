//! Run configuration.
//!
//! Settings come from a flat key-value property set, loaded from either a
//! `.properties` file or a YAML mapping. Runtime overrides (environment
//! variables, then command-line flags) are layered on top, and the merged
//! set is validated once, before any session is opened.

use crate::driver::{SessionConfig, CALCULATOR_APP_ID};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{
    WaitPolicy, DEFAULT_ELEMENT_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SETTLE_TIMEOUT_MS,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key of the driver endpoint URL
pub const KEY_ENDPOINT: &str = "driverEndpointUrl";
/// Key of the application path
pub const KEY_APP_PATH: &str = "applicationPath";
/// Prefix of forwarded desired capabilities
pub const CAPABILITY_PREFIX: &str = "capability.";

/// Environment variable overriding the endpoint
pub const ENV_ENDPOINT: &str = "WINPROBE_ENDPOINT";
/// Environment variable overriding the application path
pub const ENV_APP_PATH: &str = "WINPROBE_APP_PATH";

const ENDPOINT_KEYS: [&str; 2] = [KEY_ENDPOINT, "winAppDriverUrl"];
const APP_PATH_KEYS: [&str; 3] = [KEY_APP_PATH, "calculatorAppPath", "appPath"];

// =============================================================================
// PROPERTIES
// =============================================================================

/// Flat, ordered key-value property set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Create an empty property set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` / `key: value` lines.
    ///
    /// `#` and `!` start comment lines; an odd number of trailing
    /// backslashes continues the value on the next line. Escapes (`\\`,
    /// `\t`, `\n`, `\r`, `\f`, `\uXXXX`, `\=`, `\:`) are decoded in keys
    /// and values.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut props = Self::new();
        let mut logical = String::new();

        for raw in text.lines() {
            let line = raw.trim_start();
            if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
                continue;
            }
            let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
            if trailing % 2 == 1 {
                logical.push_str(&line[..line.len() - 1]);
                continue;
            }
            logical.push_str(line);
            props.insert_line(&logical);
            logical.clear();
        }
        if !logical.is_empty() {
            props.insert_line(&logical);
        }
        props
    }

    fn insert_line(&mut self, line: &str) {
        let (key, value) = match separator_index(line) {
            Some(i) => (&line[..i], &line[i + 1..]),
            None => (line, ""),
        };
        let key = unescape(key.trim());
        if !key.is_empty() {
            self.set(key, unescape(value.trim()));
        }
    }

    /// Parse a YAML mapping; nested mappings flatten to dotted keys
    ///
    /// # Errors
    ///
    /// [`ProbeError::Yaml`] on malformed input, [`ProbeError::Configuration`]
    /// if the document is not a mapping.
    pub fn from_yaml_str(text: &str) -> ProbeResult<Self> {
        let doc: serde_yaml_ng::Value = serde_yaml_ng::from_str(text)?;
        let mut props = Self::new();
        match &doc {
            serde_yaml_ng::Value::Null => {}
            serde_yaml_ng::Value::Mapping(_) => flatten_yaml("", &doc, &mut props),
            _ => {
                return Err(ProbeError::configuration(
                    "YAML configuration must be a mapping",
                ))
            }
        }
        Ok(props)
    }

    /// Load a file, choosing the format from its extension
    ///
    /// # Errors
    ///
    /// [`ProbeError::Configuration`] if the file cannot be read, plus YAML
    /// parse errors.
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            ProbeError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        let props = if is_yaml {
            Self::from_yaml_str(&text)?
        } else {
            Self::parse(&text)
        };
        tracing::info!(path = %path.display(), keys = props.len(), "configuration loaded");
        Ok(props)
    }

    /// Set a property, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let _ = self.entries.insert(key.into(), value.into());
    }

    /// Get a property
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// First non-empty value among `keys`
    #[must_use]
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.get(k))
            .find(|v| !v.is_empty())
    }

    /// Number of properties
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over properties in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Byte index of the first `=` or `:` not preceded by an escaping backslash
fn separator_index(line: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' | ':' => return Some(i),
            _ => {}
        }
    }
    None
}

/// Decode `.properties` escape sequences
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        chars.nth(3);
                    }
                    _ => out.push('u'),
                }
            }
            // any other escaped character stands for itself
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn flatten_yaml(prefix: &str, value: &serde_yaml_ng::Value, out: &mut Properties) {
    use serde_yaml_ng::Value;
    match value {
        Value::Mapping(map) => {
            for (k, v) in map {
                let key = match k {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                let full = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_yaml(&full, v, out);
            }
        }
        Value::String(s) => out.set(prefix, s.clone()),
        Value::Number(n) => out.set(prefix, n.to_string()),
        Value::Bool(b) => out.set(prefix, b.to_string()),
        Value::Null => out.set(prefix, ""),
        Value::Sequence(_) | Value::Tagged(_) => {
            tracing::warn!(key = prefix, "ignoring non-scalar configuration value");
        }
    }
}

// =============================================================================
// OVERRIDES
// =============================================================================

/// Runtime values that take precedence over the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Driver endpoint URL
    pub endpoint: Option<String>,
    /// Application path or app id
    pub app_path: Option<String>,
    /// Element timeout in milliseconds
    pub element_timeout_ms: Option<u64>,
    /// Screenshot directory
    pub screenshot_dir: Option<PathBuf>,
    /// Report directory
    pub report_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Read overrides from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary lookup function
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            endpoint: non_empty(ENV_ENDPOINT),
            app_path: non_empty(ENV_APP_PATH),
            ..Self::default()
        }
    }

    /// Layer `other` on top of `self`; values present in `other` win
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            endpoint: other.endpoint.or(self.endpoint),
            app_path: other.app_path.or(self.app_path),
            element_timeout_ms: other.element_timeout_ms.or(self.element_timeout_ms),
            screenshot_dir: other.screenshot_dir.or(self.screenshot_dir),
            report_dir: other.report_dir.or(self.report_dir),
        }
    }

    /// Write the overrides into a property set
    pub fn apply(&self, props: &mut Properties) {
        if let Some(endpoint) = &self.endpoint {
            props.set(KEY_ENDPOINT, endpoint.as_str());
        }
        if let Some(app) = &self.app_path {
            props.set(KEY_APP_PATH, app.as_str());
        }
        if let Some(timeout) = self.element_timeout_ms {
            props.set("elementTimeoutMs", timeout.to_string());
        }
        if let Some(dir) = &self.screenshot_dir {
            props.set("screenshotDir", dir.display().to_string());
        }
        if let Some(dir) = &self.report_dir {
            props.set("reportDir", dir.display().to_string());
        }
    }
}

// =============================================================================
// PROBE CONFIG
// =============================================================================

/// Validated run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Driver endpoint URL
    pub endpoint: String,
    /// Application path or app id; `None` targets the inbox calculator
    pub application_path: Option<String>,
    /// Title used in reports
    pub project_name: String,
    /// Element readiness timeout
    pub element_timeout_ms: u64,
    /// Polling interval
    pub poll_interval_ms: u64,
    /// Display settle bound
    pub settle_timeout_ms: u64,
    /// Directory for failure screenshots
    pub screenshot_dir: PathBuf,
    /// Directory for HTML and summary reports
    pub report_dir: PathBuf,
    /// Extra desired capabilities
    pub capabilities: BTreeMap<String, String>,
}

impl ProbeConfig {
    /// Load a file, apply overrides and validate
    pub fn load(path: &Path, overrides: &ConfigOverrides) -> ProbeResult<Self> {
        let mut props = Properties::load(path)?;
        overrides.apply(&mut props);
        Self::from_properties(&props)
    }

    /// Build from a property set and validate
    ///
    /// # Errors
    ///
    /// [`ProbeError::Configuration`] when the endpoint is missing, a numeric
    /// value does not parse, or an `.exe` application path does not exist.
    pub fn from_properties(props: &Properties) -> ProbeResult<Self> {
        let endpoint = props
            .first_of(&ENDPOINT_KEYS)
            .ok_or_else(|| {
                ProbeError::configuration(format!("missing required property: {KEY_ENDPOINT}"))
            })?
            .to_string();

        let application_path = props.first_of(&APP_PATH_KEYS).map(str::to_string);
        if let Some(app) = &application_path {
            validate_app_path(app)?;
        }

        let poll_interval_ms = parse_ms(props, "pollIntervalMs", DEFAULT_POLL_INTERVAL_MS)?;
        if poll_interval_ms == 0 {
            return Err(ProbeError::configuration("pollIntervalMs must be positive"));
        }

        let capabilities = props
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(CAPABILITY_PREFIX)
                    .filter(|name| !name.is_empty())
                    .map(|name| (name.to_string(), v.to_string()))
            })
            .collect();

        let config = Self {
            endpoint,
            application_path,
            project_name: props
                .first_of(&["projectName"])
                .unwrap_or("Calculator")
                .to_string(),
            element_timeout_ms: parse_ms(props, "elementTimeoutMs", DEFAULT_ELEMENT_TIMEOUT_MS)?,
            poll_interval_ms,
            settle_timeout_ms: parse_ms(props, "settleTimeoutMs", DEFAULT_SETTLE_TIMEOUT_MS)?,
            screenshot_dir: PathBuf::from(props.first_of(&["screenshotDir"]).unwrap_or("screenshots")),
            report_dir: PathBuf::from(props.first_of(&["reportDir"]).unwrap_or("test-reports")),
            capabilities,
        };
        tracing::debug!(endpoint = %config.endpoint, app = ?config.application_path, "configuration validated");
        Ok(config)
    }

    /// Minimal configuration for an endpoint, with defaults elsewhere
    #[must_use]
    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            application_path: None,
            project_name: "Calculator".to_string(),
            element_timeout_ms: DEFAULT_ELEMENT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            settle_timeout_ms: DEFAULT_SETTLE_TIMEOUT_MS,
            screenshot_dir: PathBuf::from("screenshots"),
            report_dir: PathBuf::from("test-reports"),
            capabilities: BTreeMap::new(),
        }
    }

    /// Session parameters for the driver
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        let app = self
            .application_path
            .clone()
            .unwrap_or_else(|| CALCULATOR_APP_ID.to_string());
        self.capabilities.iter().fold(
            SessionConfig::new(self.endpoint.clone()).with_app(app),
            |session, (name, value)| session.with_capability(name.clone(), value.clone()),
        )
    }

    /// Wait policy for page objects
    #[must_use]
    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new()
            .with_timeout(self.element_timeout_ms)
            .with_poll_interval(self.poll_interval_ms)
            .with_settle_timeout(self.settle_timeout_ms)
    }
}

fn parse_ms(props: &Properties, key: &str, default: u64) -> ProbeResult<u64> {
    props.first_of(&[key]).map_or(Ok(default), |raw| {
        raw.parse().map_err(|_| {
            ProbeError::configuration(format!("{key} must be a non-negative integer, got '{raw}'"))
        })
    })
}

fn validate_app_path(app: &str) -> ProbeResult<()> {
    let is_exe = app.to_ascii_lowercase().ends_with(".exe");
    if is_exe && !Path::new(app).is_file() {
        return Err(ProbeError::configuration(format!(
            "application path points to a non-existent file: {app}"
        )));
    }
    Ok(())
}
