//! Client configuration.
//!
//! # Design
//! `ClientConfig` is plain data that deserializes with serde, every field
//! falling back to its default. Nothing is validated here: header names,
//! header values and the base URL are checked when `ClientBuilder::build`
//! turns the config into a `Client`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default request timeout, shared by [`ClientConfig`] and [`crate::Client`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `Content-Type` set by [`crate::Client::with_json_content_type`].
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Serializable settings for building a [`crate::Client`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Upper bound on the duration of a single request
    pub timeout: Duration,

    /// Base URL that relative request URLs are resolved against
    pub base_url: Option<String>,

    /// Headers sent with every request unless a call overrides them
    pub default_headers: BTreeMap<String, String>,

    /// Send `Content-Type: application/json; charset=utf-8` by default
    pub json_content_type: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            base_url: None,
            default_headers: BTreeMap::new(),
            json_content_type: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"https://api.example.com"}"#).unwrap();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.base_url.as_deref(), Some("https://api.example.com"));
        assert!(config.default_headers.is_empty());
        assert!(!config.json_content_type);
    }

    #[test]
    fn timeout_uses_serde_duration_shape() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"timeout":{"secs":5,"nanos":0},"default_headers":{"Accept":"application/json"}}"#)
                .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.default_headers["Accept"], "application/json");
    }
}
