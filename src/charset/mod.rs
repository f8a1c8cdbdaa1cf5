//! Charset annotation.
//!
//! # Data Flow
//! ```text
//! [charset] config
//!     → snapshot.rs (normalized, immutable CharsetSnapshot)
//!     → middleware.rs (ArcSwap holder, reload, registry)
//!     → http::middleware::charset (per request: pick snapshot, register commit listener)
//!     → content_type.rs (decide and rewrite right before the response is sent)
//! ```

pub mod content_type;
pub mod middleware;
pub mod snapshot;

pub use content_type::{annotate, base_media_type, Outcome, RewriteError, FALLBACK_CONTENT_TYPE};
pub use middleware::CharsetMiddleware;
pub use snapshot::CharsetSnapshot;
