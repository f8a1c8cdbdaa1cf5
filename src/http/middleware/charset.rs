//! Charset annotation stage.
//!
//! Per request the stage:
//! 1. takes the current [`CharsetSnapshot`] once, so a reload mid-request is
//!    invisible to it;
//! 2. registers a single listener on the request's [`ResponseCommit`] that
//!    fixes up `Content-Type` right before transmission;
//! 3. forwards to the next service, moving that work onto the worker runtime
//!    when called from the I/O runtime.
//!
//! When the configuration is disabled the stage is a pure passthrough.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{HeaderMap, Request, Response, StatusCode};
use futures_util::future::BoxFuture;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio_util::task::AbortOnDropHandle;
use tower::{Layer, Service};

use crate::charset::{annotate, CharsetMiddleware, CharsetSnapshot, Outcome, FALLBACK_CONTENT_TYPE};
use crate::http::commit::ResponseCommit;

/// Layer wrapping the next stage in a [`CharsetService`].
#[derive(Debug, Clone)]
pub struct CharsetLayer {
    middleware: Arc<CharsetMiddleware>,
    worker: Option<Handle>,
}

impl CharsetLayer {
    pub fn new(middleware: Arc<CharsetMiddleware>) -> Self {
        Self {
            middleware,
            worker: None,
        }
    }

    /// Runtime to hand downstream processing to when called on the I/O runtime.
    pub fn with_worker(mut self, handle: Handle) -> Self {
        self.worker = Some(handle);
        self
    }
}

impl<S> Layer<S> for CharsetLayer {
    type Service = CharsetService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CharsetService {
            inner,
            middleware: self.middleware.clone(),
            worker: self.worker.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CharsetService<S> {
    inner: S,
    middleware: Arc<CharsetMiddleware>,
    worker: Option<Handle>,
}

impl<S> CharsetService<S> {
    /// The next stage in the chain.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CharsetService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        // Call the instance that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let snapshot = self.middleware.snapshot();
        if !snapshot.is_enabled() {
            return Box::pin(inner.call(req));
        }

        tracing::debug!(uri = %req.uri(), "Charset stage entered");

        // Without a host commit hook, fire our own on the way out.
        let (commit, owned) = match req.extensions().get::<ResponseCommit>() {
            Some(commit) => (commit.clone(), false),
            None => {
                let commit = ResponseCommit::new();
                req.extensions_mut().insert(commit.clone());
                (commit, true)
            }
        };
        commit.add_listener(move |headers| rewrite_content_type(headers, &snapshot));

        let worker = self.worker.clone().filter(|_| on_io_runtime());

        Box::pin(async move {
            let result = match worker {
                Some(handle) => dispatch(handle, inner, req).await,
                None => inner.call(req).await,
            };

            let mut response = result?;
            if owned {
                commit.fire(response.headers_mut());
            }
            tracing::debug!("Charset stage finished");
            Ok(response)
        })
    }
}

/// The commit listener body. Never fails; problems are logged and the
/// header is left as it was.
fn rewrite_content_type(headers: &mut HeaderMap, snapshot: &CharsetSnapshot) {
    match annotate(headers, snapshot) {
        Ok(Outcome::Rewritten { from, to }) => {
            tracing::debug!(%from, %to, "Content-Type annotated with charset");
        }
        Ok(Outcome::Defaulted) => {
            tracing::debug!(to = FALLBACK_CONTENT_TYPE, "Content-Type missing, using fallback");
        }
        Ok(Outcome::Unchanged) => {}
        Err(e) => {
            tracing::error!(error = %e, "Failed to annotate Content-Type, sending as is");
        }
    }
}

/// The transport's I/O driver runs on a current-thread runtime; nothing that
/// might block may run there.
fn on_io_runtime() -> bool {
    matches!(
        Handle::try_current().map(|h| h.runtime_flavor()),
        Ok(RuntimeFlavor::CurrentThread)
    )
}

async fn dispatch<S, ReqBody, ResBody>(
    handle: Handle,
    mut inner: S,
    req: Request<ReqBody>,
) -> Result<Response<ResBody>, S::Error>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
{
    // Dropping the request on the I/O side cancels the downstream work too.
    let task = AbortOnDropHandle::new(handle.spawn(async move { inner.call(req).await }));

    match task.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            tracing::error!(error = %e, "Worker task cancelled before producing a response");
            let mut response = Response::new(ResBody::default());
            *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
            Ok(response)
        }
    }
}
