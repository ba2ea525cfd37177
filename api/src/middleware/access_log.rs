use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service, ServiceExt};

use crate::extract::{ANONYMOUS_USER, USER_ID_HEADER};
use crate::metrics::Metrics;

/// Tower Layer for per-request access logging.
///
/// Emits one structured `tracing` event per request and feeds the
/// response status into [`Metrics`]. Docs routes are not logged.
#[derive(Clone)]
pub struct AccessLogLayer {
    metrics: Arc<Metrics>,
}

impl AccessLogLayer {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService {
            inner,
            metrics: self.metrics.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AccessLogService<S> {
    inner: S,
    metrics: Arc<Metrics>,
}

impl<S> Service<Request> for AccessLogService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let not_ready = self.inner.clone();
        let ready = std::mem::replace(&mut self.inner, not_ready);
        let metrics = self.metrics.clone();

        Box::pin(async move {
            let path = req.uri().path().to_owned();

            if is_docs_path(&path) {
                return Ok(ready.oneshot(req).await.into_response());
            }

            let start = Instant::now();
            let method = req.method().to_string();
            let user = req
                .headers()
                .get(USER_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(ANONYMOUS_USER)
                .to_owned();

            let response = ready.oneshot(req).await.into_response();

            let status = response.status().as_u16();
            let latency_ms = start.elapsed().as_millis().min(u64::MAX as u128) as u64;
            metrics.record_response(status);

            tracing::info!(
                target: "divbridge_api::access",
                method = %method,
                path = %path,
                status,
                latency_ms,
                user = %user,
                "request served"
            );

            Ok(response)
        })
    }
}

fn is_docs_path(path: &str) -> bool {
    path.starts_with("/swagger-ui") || path.starts_with("/api-doc")
}
