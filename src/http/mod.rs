//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (I/O runtime)
//!     → server.rs (Axum setup)
//!     → commit.rs (install per-request ResponseCommit)
//!     → middleware/charset.rs (register Content-Type listener, hand off to worker runtime)
//!     → handlers (set or omit Content-Type)
//!     → commit.rs fires listeners on the final headers
//!     → Send to client
//! ```

pub mod commit;
pub mod middleware;
pub mod server;

pub use commit::{CommitLayer, ResponseCommit};
pub use middleware::{CharsetLayer, CharsetService};
pub use server::HttpServer;
