//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the demo content handlers and admin routes
//! - Wire up middleware (tracing, commit hooks, charset, timeout)
//! - Bind server to listener
//! - Register the charset module before accepting traffic

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::Query,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::charset::CharsetMiddleware;
use crate::config::AppConfig;
use crate::http::commit::CommitLayer;
use crate::http::middleware::CharsetLayer;

/// HTTP server fronting the charset stage.
pub struct HttpServer {
    router: Router,
    charset: Arc<CharsetMiddleware>,
}

impl HttpServer {
    /// Create a new HTTP server. With a `worker` handle, handlers run there
    /// instead of on the runtime that drives the listener.
    pub fn new(config: AppConfig, charset: Arc<CharsetMiddleware>, worker: Option<Handle>) -> Self {
        let router = Self::build_router(&config, &charset, worker);
        Self { router, charset }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, charset: &Arc<CharsetMiddleware>, worker: Option<Handle>) -> Router {
        let mut router = Router::new()
            .route("/", get(index))
            .route("/json", get(json))
            .route("/image", get(image))
            .route("/raw", get(raw))
            .route("/echo", get(echo));

        if config.server.admin_enabled {
            router = router.merge(admin::handlers::router(charset.registry().clone()));
        }

        let mut charset_layer = CharsetLayer::new(charset.clone());
        if let Some(worker) = worker {
            charset_layer = charset_layer.with_worker(worker);
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
            .layer(charset_layer)
            .layer(CommitLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Reloads of the charset stage happen on the shared
    /// [`CharsetMiddleware`] and take effect without restarting this loop.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        self.charset.register();

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn index() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/html")],
        "<!doctype html><title>charset-proxy</title><p>ok</p>",
    )
}

async fn json() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn image() -> impl IntoResponse {
    // 1x1 transparent GIF.
    const PIXEL: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00\x00\x00\x00\xff\xff\xff\x21\xf9\x04\x01\x00\x00\x00\x00\x2c\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02\x44\x01\x00\x3b";
    ([(CONTENT_TYPE, "image/gif")], PIXEL)
}

/// No `Content-Type` at all.
async fn raw() -> Response {
    Response::new(Body::from("raw bytes"))
}

#[derive(Deserialize)]
struct EchoParams {
    #[serde(rename = "type")]
    content_type: Option<String>,
}

/// Responds with whatever `Content-Type` the `type` query parameter names.
async fn echo(Query(params): Query<EchoParams>) -> Response {
    let mut response = Response::new(Body::from("echo"));
    if let Some(value) = params
        .content_type
        .and_then(|ct| ct.parse().ok())
    {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}
