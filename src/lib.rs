//! Charset-annotating HTTP middleware.
//!
//! Makes sure textual responses leave the server with an explicit charset on
//! their `Content-Type`, without looking at or changing response bodies.

pub mod admin;
pub mod charset;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use charset::{CharsetMiddleware, CharsetSnapshot};
pub use config::AppConfig;
pub use http::{CharsetLayer, CommitLayer, HttpServer};
pub use lifecycle::Shutdown;
