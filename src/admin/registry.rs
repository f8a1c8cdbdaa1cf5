//! Registry of active modules and their configuration.
//!
//! Components record themselves here on startup and on every reload so ops
//! tooling can see what is running with which settings.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;

/// One registered component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleInfo {
    /// Configuration name, e.g. `charset`.
    pub name: String,
    /// Implementing type.
    pub component: String,
    /// Active configuration as a plain key/value mapping.
    pub config: Value,
}

/// Shared, cloneable handle to the registry.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    inner: Arc<DashMap<String, ModuleInfo>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name`, replacing any earlier entry.
    pub fn register_module(&self, name: &str, component: &str, config: Value) {
        tracing::debug!(module = name, component, "Module registered");
        self.inner.insert(
            name.to_string(),
            ModuleInfo {
                name: name.to_string(),
                component: component.to_string(),
                config,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<ModuleInfo> {
        self.inner.get(name).map(|r| r.value().clone())
    }

    /// All modules, sorted by name.
    pub fn modules(&self) -> Vec<ModuleInfo> {
        let mut modules: Vec<_> = self.inner.iter().map(|r| r.value().clone()).collect();
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        modules
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
