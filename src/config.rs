//! Serializable client configuration.

use crate::auth::Credentials;
use crate::settings::Settings;
use crate::timeouts::ClickHouseLinkTimeouts;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_URL: &str = "http://localhost:8123/";
pub const DEFAULT_USER: &str = "default";

pub const ENV_URL: &str = "CLICKHOUSE_URL";
pub const ENV_USER: &str = "CLICKHOUSE_USER";
pub const ENV_PASSWORD: &str = "CLICKHOUSE_PASSWORD";

/// Client configuration that can be loaded from a file or the environment.
///
/// # Example
///
/// ```rust
/// use clickhouse_link::ClientConfig;
///
/// let config: ClientConfig = serde_json::from_str(r#"{
///     "url": "http://clickhouse:8123/",
///     "password": "test",
///     "default_settings": { "max_threads": 4, "log_comment": "etl" }
/// }"#).unwrap();
///
/// assert_eq!(config.user, "default");
/// assert_eq!(config.settings().unwrap().get("max_threads"), Some("4"));
/// assert_eq!(config.settings().unwrap().get("log_comment"), Some("etl"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the HTTP interface
    /// Default: http://localhost:8123/
    #[serde(default = "default_url")]
    pub url: String,

    /// Default: "default"
    #[serde(default = "default_user")]
    pub user: String,

    /// Default: empty
    #[serde(default)]
    pub password: String,

    /// Settings sent with every query unless overridden per call.
    /// Numbers and booleans are accepted and kept as their JSON text.
    #[serde(
        default,
        deserialize_with = "deserialize_settings",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_settings: Option<BTreeMap<String, String>>,

    /// Default: 10000ms
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// Total request timeout; 0 disables it
    /// Default: 0
    #[serde(default)]
    pub receive_timeout_ms: u64,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

fn default_connection_timeout_ms() -> u64 {
    10_000
}

fn deserialize_settings<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, JsonValue>>::deserialize(deserializer)?;
    Ok(raw.map(|map| {
        map.into_iter()
            .map(|(name, value)| {
                let value = match value {
                    JsonValue::String(s) => s,
                    other => other.to_string(),
                };
                (name, value)
            })
            .collect()
    }))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            user: default_user(),
            password: String::new(),
            default_settings: None,
            connection_timeout_ms: default_connection_timeout_ms(),
            receive_timeout_ms: 0,
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `CLICKHOUSE_URL`, `CLICKHOUSE_USER` and
    /// `CLICKHOUSE_PASSWORD` when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_URL) {
            config.url = url;
        }
        if let Some(user) = lookup(ENV_USER) {
            config.user = user;
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            config.password = password;
        }
        config
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.user.clone(), self.password.clone())
    }

    pub fn settings(&self) -> Option<Settings> {
        self.default_settings.clone().map(Settings::from)
    }

    pub fn timeouts(&self) -> ClickHouseLinkTimeouts {
        ClickHouseLinkTimeouts::builder()
            .connection_timeout(Duration::from_millis(self.connection_timeout_ms))
            .receive_timeout(Duration::from_millis(self.receive_timeout_ms))
            .build()
    }
}
