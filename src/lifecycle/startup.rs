//! Startup orchestration.
//!
//! Config first, then the charset stage and its registry entry, then the
//! runtimes. The listener is bound last so traffic only arrives when ready.
//! Any error here is fatal.

use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::admin::ModuleRegistry;
use crate::charset::CharsetMiddleware;
use crate::config::{AppConfig, ConfigError, ConfigSource, FileSource};

/// Build the charset stage. With a config file, reloads re-read that file;
/// otherwise the startup config is the only source.
pub fn charset_middleware(
    config: &AppConfig,
    config_path: Option<&Path>,
    registry: ModuleRegistry,
) -> Result<Arc<CharsetMiddleware>, ConfigError> {
    let source: Box<dyn ConfigSource> = match config_path {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(config.charset.clone()),
    };

    let middleware = CharsetMiddleware::load(source, registry)?;
    middleware.register();
    Ok(Arc::new(middleware))
}

/// Runtime the handler chain runs on. `threads == 0` uses one per CPU.
pub fn worker_runtime(threads: usize) -> io::Result<Runtime> {
    let mut builder = Builder::new_multi_thread();
    builder.enable_all().thread_name("charset-worker");
    if threads > 0 {
        builder.worker_threads(threads);
    }
    builder.build()
}

/// Runtime the listener and connections are driven on.
pub fn io_runtime() -> io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}
