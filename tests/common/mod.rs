//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use charset_proxy::admin::ModuleRegistry;
use charset_proxy::charset::CharsetMiddleware;
use charset_proxy::config::{AppConfig, CharsetConfig, ConfigSource};
use charset_proxy::http::HttpServer;
use charset_proxy::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::runtime::{Handle, Runtime};

/// A server running on an ephemeral port, stopped on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    pub charset: Arc<CharsetMiddleware>,
    pub registry: ModuleRegistry,
    shutdown: Shutdown,
    worker: Option<Runtime>,
}

impl TestServer {
    /// Start with a static `[charset]` config and handlers on the calling runtime.
    pub async fn start(charset: CharsetConfig) -> Self {
        Self::start_with_source(charset, false).await
    }

    /// Start with an arbitrary reload source. `with_worker` moves handlers
    /// onto a separate multi-thread runtime.
    pub async fn start_with_source(source: impl ConfigSource + 'static, with_worker: bool) -> Self {
        let registry = ModuleRegistry::new();
        let charset = Arc::new(CharsetMiddleware::load(source, registry.clone()).unwrap());

        let mut config = AppConfig::default();
        config.server.admin_enabled = true;

        let worker = with_worker.then(|| {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .thread_name("test-worker")
                .build()
                .unwrap()
        });
        let handle: Option<Handle> = worker.as_ref().map(|rt| rt.handle().clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();

        let server = HttpServer::new(config, charset.clone(), handle);
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        Self {
            addr,
            charset,
            registry,
            shutdown,
            worker,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// `Content-Type` of a GET to `path`, if any.
    pub async fn content_type(&self, path: &str) -> Option<String> {
        let response = client().get(self.url(path)).send().await.expect("server unreachable");
        assert!(response.status().is_success(), "GET {} -> {}", path, response.status());
        response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
        if let Some(worker) = self.worker.take() {
            worker.shutdown_background();
        }
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

pub fn charset_config(enabled: bool, charset: &str, types: &[&str]) -> CharsetConfig {
    CharsetConfig {
        enabled,
        charset: charset.to_string(),
        content_type_list: Some(types.iter().map(|s| s.to_string()).collect()),
    }
}
