//! Shared state of the charset stage: the current snapshot and how to reload it.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::admin::ModuleRegistry;
use crate::charset::snapshot::CharsetSnapshot;
use crate::config::{CharsetConfig, ConfigError, ConfigSource};

/// Registry name of the charset module.
pub const CONFIG_NAME: &str = "charset";

const COMPONENT: &str = "charset_proxy::charset::CharsetMiddleware";

/// Owner of the charset configuration.
///
/// Readers take a full `Arc<CharsetSnapshot>` and keep it for the whole
/// request, so a concurrent [`reload`](Self::reload) is never observed halfway.
pub struct CharsetMiddleware {
    snapshot: ArcSwap<CharsetSnapshot>,
    source: Box<dyn ConfigSource>,
    registry: ModuleRegistry,
}

impl CharsetMiddleware {
    /// Load the initial snapshot from `source`. A malformed source is fatal.
    pub fn load(
        source: impl ConfigSource + 'static,
        registry: ModuleRegistry,
    ) -> Result<Self, ConfigError> {
        let config = source.load()?;
        let middleware = Self {
            snapshot: ArcSwap::from_pointee(CharsetSnapshot::from_config(&config)),
            source: Box::new(source),
            registry,
        };

        tracing::info!(
            enabled = config.enabled,
            charset = %config.charset,
            content_types = config.content_type_list.as_ref().map_or(0, Vec::len),
            "Charset configuration loaded"
        );
        Ok(middleware)
    }

    /// Whether the stage should take part in request handling at all.
    pub fn is_active(&self) -> bool {
        self.snapshot.load().is_enabled()
    }

    /// The snapshot current at the time of the call.
    pub fn snapshot(&self) -> Arc<CharsetSnapshot> {
        self.snapshot.load_full()
    }

    /// Record the active configuration in the module registry.
    pub fn register(&self) {
        self.registry
            .register_module(CONFIG_NAME, COMPONENT, self.snapshot.load().to_map());
    }

    /// Fetch a fresh configuration from the source and swap it in.
    ///
    /// On error the current snapshot stays in place.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let config = self.source.load()?;
        self.apply(&config);
        Ok(())
    }

    /// Swap in an already loaded and validated configuration.
    pub fn apply(&self, config: &CharsetConfig) {
        self.snapshot
            .store(Arc::new(CharsetSnapshot::from_config(config)));
        self.register();
        tracing::info!(
            enabled = config.enabled,
            charset = %config.charset,
            "Charset configuration reloaded"
        );
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for CharsetMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharsetMiddleware")
            .field("snapshot", &self.snapshot.load())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Hands out a scripted sequence of configs.
    struct Scripted(Mutex<Vec<Result<CharsetConfig, ConfigError>>>);

    impl ConfigSource for Scripted {
        fn load(&self) -> Result<CharsetConfig, ConfigError> {
            self.0.lock().unwrap().remove(0)
        }
    }

    fn config(enabled: bool, charset: &str) -> CharsetConfig {
        CharsetConfig {
            enabled,
            charset: charset.into(),
            content_type_list: Some(vec!["text/html".into()]),
        }
    }

    #[test]
    fn test_load_and_register() {
        let registry = ModuleRegistry::new();
        let middleware = CharsetMiddleware::load(config(true, "UTF-8"), registry.clone()).unwrap();
        assert!(middleware.is_active());
        assert!(registry.get(CONFIG_NAME).is_none());

        middleware.register();
        let info = registry.get(CONFIG_NAME).unwrap();
        assert_eq!(info.component, COMPONENT);
        assert_eq!(info.config["charset"], "UTF-8");
    }

    #[test]
    fn test_invalid_static_source_is_fatal() {
        let result = CharsetMiddleware::load(config(true, "bad charset"), ModuleRegistry::new());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_reload_swaps_and_keeps_old_readers_consistent() {
        let source = Scripted(Mutex::new(vec![
            Ok(config(false, "ISO-8859-1")),
            Ok(config(true, "UTF-8")),
        ]));
        let registry = ModuleRegistry::new();
        let middleware = CharsetMiddleware::load(source, registry.clone()).unwrap();

        let before = middleware.snapshot();
        assert!(!middleware.is_active());

        middleware.reload().unwrap();

        assert!(middleware.is_active());
        assert_eq!(middleware.snapshot().charset(), "UTF-8");
        // A reader holding the old snapshot still sees all of it.
        assert!(!before.is_enabled());
        assert_eq!(before.charset(), "ISO-8859-1");
        assert_eq!(registry.get(CONFIG_NAME).unwrap().config["enabled"], true);
    }

    #[test]
    fn test_failed_reload_keeps_current() {
        let source = Scripted(Mutex::new(vec![
            Ok(config(true, "UTF-8")),
            Err(ConfigError::Validation(vec![])),
        ]));
        let middleware = CharsetMiddleware::load(source, ModuleRegistry::new()).unwrap();

        assert!(middleware.reload().is_err());
        assert!(middleware.is_active());
        assert_eq!(middleware.snapshot().charset(), "UTF-8");
    }
}
