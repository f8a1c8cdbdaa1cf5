//! charset-proxy
//!
//! Serves HTTP with every textual response carrying an explicit charset.
//!
//! ```text
//!   I/O runtime (current thread)            worker runtime (multi thread)
//!  ┌──────────────────────────────┐        ┌──────────────────────────────┐
//!  │ listener → hyper connection  │        │                              │
//!  │   → TraceLayer               │        │                              │
//!  │   → CommitLayer              │        │                              │
//!  │   → CharsetLayer ────────────┼──────▶ │ TimeoutLayer → handlers      │
//!  │   ◀ commit listeners fire ◀──┼─────── │ (set or omit Content-Type)   │
//!  │   → bytes to client          │        │                              │
//!  └──────────────────────────────┘        └──────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::runtime::Handle;

use charset_proxy::admin::ModuleRegistry;
use charset_proxy::charset::CharsetMiddleware;
use charset_proxy::config::{load_config, watcher::ConfigWatcher, AppConfig};
use charset_proxy::http::HttpServer;
use charset_proxy::lifecycle::{signals, startup, Shutdown};
use charset_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "charset-proxy")]
#[command(about = "HTTP server that annotates textual responses with a charset", long_about = None)]
struct Cli {
    /// TOML configuration file. Watched for changes; SIGHUP also reloads it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    logging::init(&config.observability.log_level);
    tracing::info!("charset-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let registry = ModuleRegistry::new();
    let charset = startup::charset_middleware(&config, cli.config.as_deref(), registry)?;

    tracing::info!(
        bind_address = %config.server.bind_address,
        worker_threads = config.server.worker_threads,
        charset_enabled = charset.is_active(),
        "Configuration loaded"
    );

    let worker = startup::worker_runtime(config.server.worker_threads)?;
    let io = startup::io_runtime()?;

    io.block_on(serve(config, cli.config, charset, worker.handle().clone()))?;

    worker.shutdown_timeout(Duration::from_secs(5));
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn serve(
    config: AppConfig,
    config_path: Option<PathBuf>,
    charset: Arc<CharsetMiddleware>,
    worker: Handle,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Shutdown::new();

    // Keep the watcher alive for the whole run.
    let _watcher = match &config_path {
        Some(path) => Some(ConfigWatcher::new(path, charset.clone()).run()?),
        None => None,
    };

    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));
    tokio::spawn(signals::reload_on_hangup(charset.clone(), shutdown.clone()));

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server_shutdown = shutdown.subscribe();
    HttpServer::new(config, charset, Some(worker))
        .run(listener, server_shutdown)
        .await?;

    Ok(())
}
