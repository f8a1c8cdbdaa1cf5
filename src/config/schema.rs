//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Deserializer, Serialize};

/// Root configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and worker settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Charset annotation settings. The only section that is hot-reloaded.
    pub charset: CharsetConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Threads in the worker runtime. 0 means one per CPU.
    pub worker_threads: usize,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Expose `GET /admin/modules`.
    pub admin_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            worker_threads: 0,
            request_timeout_secs: 30,
            admin_enabled: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Fallback charset when none is configured, matching what most servlet
/// style stacks assume for undeclared text.
pub const DEFAULT_CHARSET: &str = "ISO-8859-1";

/// Raw `[charset]` section as written by the operator.
///
/// Use [`CharsetSnapshot`](crate::charset::CharsetSnapshot) for lookups; this
/// type keeps the entries exactly as they appear in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CharsetConfig {
    /// Global on/off switch for the charset stage.
    #[serde(deserialize_with = "bool_or_string")]
    pub enabled: bool,

    /// Charset appended to matching content types.
    pub charset: String,

    /// Base media types eligible for annotation. `None` when the key is absent.
    #[serde(rename = "contentTypeList", skip_serializing_if = "Option::is_none")]
    pub content_type_list: Option<Vec<String>>,
}

impl Default for CharsetConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            charset: DEFAULT_CHARSET.to_string(),
            content_type_list: None,
        }
    }
}

/// Accepts `true`/`false` as booleans or as (case-insensitive) strings.
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean for `enabled`, found \"{}\"",
                other
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(!config.charset.enabled);
        assert_eq!(config.charset.charset, "ISO-8859-1");
        assert!(config.charset.content_type_list.is_none());
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_charset_section() {
        let config: AppConfig = toml::from_str(
            r#"
            [charset]
            enabled = true
            charset = "UTF-8"
            contentTypeList = ["text/html", "application/json", "text/xml"]
            "#,
        )
        .unwrap();

        assert!(config.charset.enabled);
        assert_eq!(config.charset.charset, "UTF-8");
        assert_eq!(config.charset.content_type_list.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_enabled_accepts_strings() {
        let config: CharsetConfig = toml::from_str(r#"enabled = "TRUE""#).unwrap();
        assert!(config.enabled);

        let config: CharsetConfig = toml::from_str(r#"enabled = "false""#).unwrap();
        assert!(!config.enabled);

        assert!(toml::from_str::<CharsetConfig>(r#"enabled = "yes please""#).is_err());
        assert!(toml::from_str::<CharsetConfig>("enabled = 3").is_err());
    }
}
