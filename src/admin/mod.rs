//! Admin introspection.
//!
//! # Endpoints
//! - `GET /admin/status` - version and liveness
//! - `GET /admin/modules` - registered modules with their active configuration

pub mod handlers;
pub mod registry;

pub use registry::{ModuleInfo, ModuleRegistry};
