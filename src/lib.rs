//! # reqlog
//!
//! A Tower layer that logs outgoing HTTP requests and the responses that come
//! back, without taking anything away from the caller.
//!
//! Reading a body to log it consumes the body. `reqlog` reads it exactly once,
//! keeps the bytes, and hands the rest of the pipeline a fresh body carrying the
//! same payload, so the call behaves as if the logger had never been there.
//!
//! ## Features
//!
//! - **Non-destructive**: requests are forwarded and responses returned with
//!   their full payload, whether or not the body was logged
//! - **Binary-safe**: only text media types (`text/*`, `json`, `xml`, `html`)
//!   are printed; anything else is reported with a placeholder
//! - **Fail-open**: a problem while logging never fails the call, the caller
//!   just gets the response as it was received
//! - **Pluggable output**: lines go to any [`LogSink`]; the default forwards to
//!   `tracing`
//!
//! ## Quick Start
//!
//! Wrap any Tower service that sends requests. Here an in-process Axum router
//! stands in for the transport:
//!
//! ```rust,no_run
//! use axum::{body::Body, http::Request, routing::get, Router};
//! use reqlog::{InterceptorConfig, LogInterceptorLayer};
//! use tower::{ServiceBuilder, ServiceExt};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let transport = Router::new().route("/hello", get(|| async { "Hello, World!" }));
//!
//! let client = ServiceBuilder::new()
//!     .layer(LogInterceptorLayer::tracing(
//!         InterceptorConfig::new("OK_HTTP").show_response(true),
//!     ))
//!     .service(transport);
//!
//! let request = Request::builder()
//!     .uri("http://localhost/hello")
//!     .body(Body::empty())
//!     .unwrap();
//! let response = client.oneshot(request).await.unwrap();
//! # }
//! ```
//!
//! ## Custom Sinks
//!
//! Implement [`LogSink`] to send lines somewhere other than `tracing`:
//!
//! ```rust
//! use reqlog::{InterceptorConfig, LogInterceptorLayer, LogSink};
//!
//! #[derive(Debug)]
//! struct StdoutSink;
//!
//! impl LogSink for StdoutSink {
//!     fn log(&self, tag: &str, message: &str) {
//!         println!("{tag}: {message}");
//!     }
//! }
//!
//! let layer = LogInterceptorLayer::new(InterceptorConfig::default(), StdoutSink);
//! ```

use axum::{
    extract::Request,
    http::HeaderMap,
    response::Response,
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};

pub mod body_capture;
mod error;
pub mod interceptor;
pub mod media_type;
pub mod request_logger;
pub mod response_logger;
pub mod sink;

pub use interceptor::LogInterceptor;
pub use media_type::MediaType;
pub use sink::{LogSink, MultiSink, TracingSink};

/// Tag used when the configuration does not provide one.
pub const DEFAULT_TAG: &str = "reqlog";

/// Logged instead of a body whose media type is not text.
pub const SKIPPED_BODY: &str = "maybe [file part], too large to print, ignored!";

/// Render headers as `name:value` pairs in map order.
fn format_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}:{}", name, String::from_utf8_lossy(value.as_bytes())))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Configuration for the logging interceptor.
///
/// Both options are fixed once the interceptor is built.
///
/// # Examples
///
/// ```rust
/// use reqlog::{InterceptorConfig, DEFAULT_TAG};
///
/// // Default configuration: default tag, response bodies not read
/// let config = InterceptorConfig::default();
/// assert_eq!(config.resolved_tag(), DEFAULT_TAG);
/// assert!(!config.show_response);
///
/// // Custom configuration
/// let config = InterceptorConfig::new("OK_HTTP").show_response(true);
/// assert_eq!(config.resolved_tag(), "OK_HTTP");
/// ```
#[derive(Clone, Debug, Default)]
pub struct InterceptorConfig {
    /// Label attached to every log line. Empty means [`DEFAULT_TAG`].
    pub tag: String,
    /// Whether response bodies are read and logged
    pub show_response: bool,
}

impl InterceptorConfig {
    /// Create a configuration logging under `tag`, with response bodies off.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            show_response: false,
        }
    }

    /// Set whether response bodies are read and logged. Returns self for
    /// builder pattern.
    pub fn show_response(mut self, show_response: bool) -> Self {
        self.show_response = show_response;
        self
    }

    /// The tag lines are logged under, with the default applied.
    pub fn resolved_tag(&self) -> &str {
        if self.tag.is_empty() {
            DEFAULT_TAG
        } else {
            &self.tag
        }
    }
}

/// Tower layer for the logging interceptor.
///
/// Place it in front of the service that actually sends requests (a `hyper`
/// client, a mock, another layer) and every call through the stack is logged.
///
/// # Examples
///
/// ```rust
/// use reqlog::{InterceptorConfig, LogInterceptorLayer, MultiSink, TracingSink};
/// use tracing::Level;
///
/// let sink = MultiSink::new()
///     .with(TracingSink::new())
///     .with(TracingSink::with_level(Level::DEBUG));
///
/// let layer = LogInterceptorLayer::new(InterceptorConfig::new("api"), sink);
/// ```
#[derive(Clone)]
pub struct LogInterceptorLayer {
    interceptor: LogInterceptor,
}

impl LogInterceptorLayer {
    /// Create a layer writing to `sink`.
    pub fn new<S: LogSink>(config: InterceptorConfig, sink: S) -> Self {
        Self {
            interceptor: LogInterceptor::new(config, sink),
        }
    }

    /// Create a layer writing to a default [`TracingSink`].
    pub fn tracing(config: InterceptorConfig) -> Self {
        Self {
            interceptor: LogInterceptor::tracing(config),
        }
    }
}

impl<S> Layer<S> for LogInterceptorLayer {
    type Service = LogInterceptorService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LogInterceptorService {
            inner,
            interceptor: self.interceptor.clone(),
        }
    }
}

/// Tower service implementation for the logging interceptor.
///
/// Users typically don't interact with this type directly - it's created by
/// [`LogInterceptorLayer`].
#[derive(Clone)]
pub struct LogInterceptorService<S> {
    inner: S,
    interceptor: LogInterceptor,
}

impl<S> Service<Request> for LogInterceptorService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        // The service that was driven to readiness is the one that must be called.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let interceptor = self.interceptor.clone();

        Box::pin(async move {
            interceptor
                .process(request, |request| inner.call(request))
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_resolved_tag() {
        assert_eq!(InterceptorConfig::new("").resolved_tag(), DEFAULT_TAG);
        assert_eq!(InterceptorConfig::new("OK_HTTP").resolved_tag(), "OK_HTTP");
    }

    #[test]
    fn test_format_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x", HeaderValue::from_static("1"));
        headers.append("accept", HeaderValue::from_static("text/html"));
        headers.append("accept", HeaderValue::from_static("application/json"));

        assert_eq!(
            format_headers(&headers),
            "x:1, accept:text/html, accept:application/json"
        );
    }
}
