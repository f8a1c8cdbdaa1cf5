//! Hot reload of the charset stage on config file changes.
//!
//! A change only triggers [`CharsetMiddleware::reload`], so file edits and
//! SIGHUP go through the same source and the same validation. Sections other
//! than `[charset]` are never re-read here; they need a restart.
//!
//! The parent directory is watched rather than the file itself, so editors
//! and deploy tools that replace the file by rename are picked up too.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::charset::CharsetMiddleware;

/// Reloads a [`CharsetMiddleware`] whenever its config file is written.
pub struct ConfigWatcher {
    path: PathBuf,
    charset: Arc<CharsetMiddleware>,
}

impl ConfigWatcher {
    pub fn new(path: &Path, charset: Arc<CharsetMiddleware>) -> Self {
        Self {
            path: path.to_path_buf(),
            charset,
        }
    }

    /// Start watching on notify's background thread.
    ///
    /// Watching stops when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let charset = self.charset;
        let file_name = self.path.file_name().map(|name| name.to_os_string());
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(Event {
                    kind: EventKind::Modify(_) | EventKind::Create(_),
                    paths,
                    ..
                }) if paths.iter().any(|p| p.file_name() == file_name.as_deref()) => {
                    if let Err(e) = charset.reload() {
                        tracing::error!(error = %e, "Charset reload rejected, keeping current snapshot");
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Watching charset configuration");
        Ok(watcher)
    }
}
