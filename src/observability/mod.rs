//! Observability subsystem.
//!
//! Structured `tracing` events from every subsystem; `logging.rs` installs
//! the subscriber. Per-request spans come from tower-http's `TraceLayer`.

pub mod logging;
