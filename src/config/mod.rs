//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → [charset] section becomes a CharsetSnapshot
//!
//! On reload (file change or SIGHUP):
//!     watcher.rs detects change / ConfigSource::load
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<CharsetSnapshot>
//!     → requests started afterwards observe the new snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError, ConfigSource, FileSource};
pub use schema::{AppConfig, CharsetConfig, ObservabilityConfig, ServerConfig};
pub use validation::ValidationError;
