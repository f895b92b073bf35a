//! The request → forward → response pipeline stage.

use axum::{extract::Request, response::Response};
use std::{future::Future, sync::Arc};
use tracing::debug;

use crate::{
    request_logger::RequestLogger, response_logger::ResponseLogger, sink::TaggedSink,
    InterceptorConfig, LogSink, TracingSink,
};

/// Logs a request, forwards it, and logs the response that comes back.
///
/// The interceptor holds only configuration fixed at construction, so a single
/// instance can serve any number of concurrent calls. Cloning is cheap.
///
/// # Examples
///
/// ```rust
/// use axum::{body::Body, http::{Request, Response}};
/// use reqlog::{InterceptorConfig, LogInterceptor};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let interceptor = LogInterceptor::tracing(InterceptorConfig::new("api").show_response(true));
///
/// let request = Request::builder()
///     .uri("http://example.com/ping")
///     .body(Body::empty())
///     .unwrap();
///
/// let response = interceptor
///     .process(request, |_request| async {
///         Ok::<_, std::convert::Infallible>(Response::new(Body::from("pong")))
///     })
///     .await
///     .unwrap();
/// assert_eq!(response.status(), 200);
/// # }
/// ```
#[derive(Clone)]
pub struct LogInterceptor {
    requests: RequestLogger,
    responses: ResponseLogger,
}

impl LogInterceptor {
    /// Create an interceptor writing to `sink`.
    ///
    /// An empty tag in `config` is replaced with [`DEFAULT_TAG`](crate::DEFAULT_TAG).
    pub fn new<S: LogSink>(config: InterceptorConfig, sink: S) -> Self {
        let out = TaggedSink::new(config.resolved_tag(), Arc::new(sink));
        Self {
            requests: RequestLogger::new(out.clone()),
            responses: ResponseLogger::new(out, config.show_response),
        }
    }

    /// Create an interceptor writing to a default [`TracingSink`].
    pub fn tracing(config: InterceptorConfig) -> Self {
        Self::new(config, TracingSink::new())
    }

    /// Run one call through the interceptor.
    ///
    /// `proceed` forwards the request through the rest of the pipeline. Its
    /// error is returned to the caller unchanged, and nothing the logging does
    /// can turn a successful call into a failed one.
    pub async fn process<F, Fut, E>(&self, request: Request, proceed: F) -> Result<Response, E>
    where
        F: FnOnce(Request) -> Fut,
        Fut: Future<Output = Result<Response, E>>,
    {
        let request = self.requests.log(request).await;
        let uri = request.uri().clone();

        debug!(uri = %uri, "Forwarding request");
        let response = proceed(request).await?;

        Ok(self.responses.log(&uri, response).await)
    }
}
