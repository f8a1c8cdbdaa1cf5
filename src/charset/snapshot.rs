//! Immutable charset configuration snapshot.

use std::collections::HashSet;

use serde_json::{json, Value};

use crate::charset::content_type::base_media_type;
use crate::config::CharsetConfig;

/// A resolved `[charset]` section.
///
/// Never mutated after construction; a reload builds a new one and swaps it in
/// whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharsetSnapshot {
    enabled: bool,
    charset: String,
    textual_types: HashSet<String>,
    /// Entries as configured, kept for introspection.
    configured: Option<Vec<String>>,
}

impl CharsetSnapshot {
    pub fn from_config(config: &CharsetConfig) -> Self {
        let textual_types = config
            .content_type_list
            .iter()
            .flatten()
            .map(|entry| base_media_type(entry))
            .filter(|base| !base.is_empty())
            .collect();

        Self {
            enabled: config.enabled,
            charset: config.charset.clone(),
            textual_types,
            configured: config.content_type_list.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn textual_types(&self) -> &HashSet<String> {
        &self.textual_types
    }

    /// `base` must already be a normalized base media type.
    pub fn is_textual(&self, base: &str) -> bool {
        self.textual_types.contains(base)
    }

    /// Plain key/value view, as recorded in the module registry.
    pub fn to_map(&self) -> Value {
        let mut map = json!({
            "enabled": self.enabled,
            "charset": self.charset,
        });
        if let Some(list) = &self.configured {
            map["contentTypeList"] = json!(list);
        }
        map
    }
}

impl Default for CharsetSnapshot {
    fn default() -> Self {
        Self::from_config(&CharsetConfig::default())
    }
}

impl From<&CharsetConfig> for CharsetSnapshot {
    fn from(config: &CharsetConfig) -> Self {
        Self::from_config(config)
    }
}
