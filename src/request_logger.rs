//! Request side of the interceptor.

use axum::{
    body::Body,
    extract::Request,
    http::HeaderMap,
};
use tracing::debug;

use crate::{
    body_capture::capture_request_body, error::Abort, format_headers, media_type::MediaType,
    sink::TaggedSink, SKIPPED_BODY,
};

const BANNER: &str = "========request'log=======";
const BANNER_END: &str = "========request'log=======end";

/// Logs method, URL, headers and (for text payloads) the body of a request.
///
/// Request bodies are logged whenever they are text, independent of the
/// interceptor's `show_response` switch.
#[derive(Clone)]
pub struct RequestLogger {
    out: TaggedSink,
}

impl RequestLogger {
    pub(crate) fn new(out: TaggedSink) -> Self {
        Self { out }
    }

    /// Log `request` and return it ready to be forwarded.
    ///
    /// Method, URI, version, headers and extensions are passed through as-is.
    /// If the body was read for logging, the returned request carries a fresh
    /// body with the same payload. Logging problems are swallowed: the log
    /// simply stops for this call.
    pub async fn log(&self, request: Request) -> Request {
        let (parts, body) = request.into_parts();

        self.out.emit(BANNER);
        self.out.emit(format!("method : {}", parts.method));
        self.out.emit(format!("url : {}", parts.uri));
        if !parts.headers.is_empty() {
            self.out.emit(format!("headers : {}", format_headers(&parts.headers)));
        }

        let body = match self.log_body(&parts.headers, body).await {
            Ok(body) => {
                self.out.emit(BANNER_END);
                body
            }
            Err(abort) => {
                debug!(tag = %self.out.tag(), error = %abort.error, "Request logging aborted");
                abort.passthrough
            }
        };

        Request::from_parts(parts, body)
    }

    async fn log_body(&self, headers: &HeaderMap, body: Body) -> Result<Body, Abort<Body>> {
        let media_type = match MediaType::from_headers(headers) {
            Ok(Some(media_type)) => media_type,
            Ok(None) => return Ok(body),
            Err(e) => return Err(Abort::new(body, e)),
        };

        self.out
            .emit(format!("requestBody's contentType : {media_type}"));
        if media_type.is_text() {
            let (body, text) = capture_request_body(body).await;
            self.out.emit(format!("requestBody's content : {text}"));
            Ok(body)
        } else {
            self.out.emit(format!("requestBody's content : {SKIPPED_BODY}"));
            Ok(body)
        }
    }
}
