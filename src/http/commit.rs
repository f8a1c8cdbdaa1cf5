//! Response commit hooks.
//!
//! `CommitLayer` sits at the outside of the handler stack. It puts a
//! [`ResponseCommit`] into every request's extensions; stages further in
//! register listeners on it. Once the inner stack has produced the response,
//! every listener runs exactly once on the final headers, right before the
//! response is handed back to hyper for transmission.
//!
//! If the response future is dropped first (client gone, timeout upstream of
//! this layer) no listener runs.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use axum::http::{HeaderMap, Request, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

type Listener = Box<dyn FnOnce(&mut HeaderMap) + Send>;

/// Per-request handle for registering pre-transmission listeners.
#[derive(Clone, Default)]
pub struct ResponseCommit {
    listeners: Arc<Mutex<Vec<Listener>>>,
}

impl ResponseCommit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` to run once on the final response headers.
    pub fn add_listener<F>(&self, listener: F)
    where
        F: FnOnce(&mut HeaderMap) + Send + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    /// Listeners registered and not yet fired.
    pub fn pending(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run and drop every pending listener, in registration order.
    ///
    /// A panicking listener is logged and skipped. Returns how many ran.
    pub fn fire(&self, headers: &mut HeaderMap) -> usize {
        let listeners =
            std::mem::take(&mut *self.listeners.lock().unwrap_or_else(PoisonError::into_inner));
        let count = listeners.len();

        for listener in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(headers))).is_err() {
                tracing::error!("Response commit listener panicked, continuing");
            }
        }

        count
    }
}

impl std::fmt::Debug for ResponseCommit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCommit")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Layer that installs a [`ResponseCommit`] on every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitLayer;

impl<S> Layer<S> for CommitLayer {
    type Service = CommitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CommitService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct CommitService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CommitService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let commit = ResponseCommit::new();
        req.extensions_mut().insert(commit.clone());
        let response = self.inner.call(req);

        Box::pin(async move {
            let mut response = response.await?;
            commit.fire(response.headers_mut());
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::{HeaderValue, CONTENT_TYPE};
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::{service_fn, ServiceExt};

    #[test]
    fn test_fire_runs_once_in_order() {
        let commit = ResponseCommit::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            commit.add_listener(move |_| order.lock().unwrap().push(i));
        }
        assert_eq!(commit.pending(), 3);

        let mut headers = HeaderMap::new();
        assert_eq!(commit.fire(&mut headers), 3);
        assert_eq!(commit.fire(&mut headers), 0);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_others() {
        let commit = ResponseCommit::new();
        commit.add_listener(|_| panic!("boom"));
        commit.add_listener(|headers| {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        });

        let mut headers = HeaderMap::new();
        assert_eq!(commit.fire(&mut headers), 2);
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
    }

    #[tokio::test]
    async fn test_listener_sees_final_headers() {
        let svc = CommitLayer.layer(service_fn(|req: Request<Body>| async move {
            let commit = req.extensions().get::<ResponseCommit>().unwrap().clone();
            commit.add_listener(|headers| {
                let seen = headers.get(CONTENT_TYPE).cloned();
                headers.insert("x-seen", seen.unwrap_or(HeaderValue::from_static("none")));
            });

            // Set after the listener was registered.
            let mut response = Response::new(Body::empty());
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
            Ok::<_, Infallible>(response)
        }));

        let response = svc.oneshot(Request::new(Body::empty())).await.unwrap();
        assert_eq!(response.headers()["x-seen"], "text/html");
    }

    #[tokio::test]
    async fn test_dropped_response_never_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();

        let mut svc = CommitLayer.layer(service_fn(move |req: Request<Body>| {
            let f = f.clone();
            async move {
                req.extensions()
                    .get::<ResponseCommit>()
                    .unwrap()
                    .add_listener(move |_| {
                        f.fetch_add(1, Ordering::SeqCst);
                    });
                std::future::pending::<Result<Response<Body>, Infallible>>().await
            }
        }));

        let svc = svc.ready().await.unwrap();
        let future = svc.call(Request::new(Body::empty()));
        let _ = tokio::time::timeout(std::time::Duration::from_millis(20), future).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
