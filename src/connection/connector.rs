//! Connector details sent to the service for request tracing.
//!
//! The service records which connector and application issued a request via
//! two header values: the application string
//! (`Kusto.<connector>:{<version>}|App.{<app>}:{<app version>}|...`) and the
//! user string.

use std::env;
use std::path::Path;

const UNKNOWN: &str = "unknown";
const NONE: &str = "[none]";

/// Describes the connector and application on whose behalf requests are made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectorDetails {
    pub name: String,
    pub version: String,
    pub app_name: Option<String>,
    pub app_version: Option<String>,
    pub send_user: bool,
    pub override_user: Option<String>,
    pub additional_fields: Vec<(String, String)>,
}

impl ConnectorDetails {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            ..Self::default()
        }
    }

    /// Set the application name and version.
    pub fn app(mut self, name: &str, version: &str) -> Self {
        self.app_name = Some(name.to_string());
        self.app_version = Some(version.to_string());
        self
    }

    /// Report the user, optionally replacing the detected user name.
    pub fn send_user(mut self, override_user: Option<&str>) -> Self {
        self.send_user = true;
        self.override_user = override_user.map(str::to_string);
        self
    }

    /// Append an extra `key:{value}` pair to the application string.
    pub fn field(mut self, key: &str, value: &str) -> Self {
        self.additional_fields
            .push((key.to_string(), value.to_string()));
        self
    }

    /// Build the application tracing value.
    pub fn application_for_tracing(&self) -> String {
        let app_name = self
            .app_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(default_app_name);
        let app_version = self
            .app_version
            .as_deref()
            .filter(|version| !version.is_empty())
            .unwrap_or(UNKNOWN);

        let mut fields = Vec::with_capacity(self.additional_fields.len() + 2);
        fields.push((format!("Kusto.{}", self.name), self.version.as_str()));
        fields.push((format!("App.{}", escape_header_value(&app_name)), app_version));
        fields.extend(
            self.additional_fields
                .iter()
                .map(|(key, value)| (key.clone(), value.as_str())),
        );

        fields
            .iter()
            .map(|(key, value)| format!("{}:{}", key, escape_header_value(value)))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Build the user tracing value.
    pub fn user_for_tracing(&self) -> String {
        if !self.send_user {
            return NONE.to_string();
        }
        match self.override_user.as_deref() {
            Some(user) if !user.is_empty() => user.to_string(),
            _ => current_user().unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

/// Wrap a value in braces, escaping backslashes and braces.
fn escape_header_value(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('{', "\\{")
        .replace('}', "\\}");
    format!("{{{}}}", escaped)
}

fn default_app_name() -> String {
    env::args()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn current_user() -> Option<String> {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .ok()
        .filter(|user| !user.is_empty())
}
