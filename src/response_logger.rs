//! Response side of the interceptor.
//!
//! Reading a response body for the log consumes it, so whenever the body is
//! read the response is rebuilt around a new body holding the captured bytes.
//! Every other part (status, version, headers, extensions) is moved across
//! unchanged.

use axum::{http::Uri, response::Response};
use tracing::debug;

use crate::{
    body_capture::capture_response_body, error::Abort, media_type::MediaType, sink::TaggedSink,
    SKIPPED_BODY,
};

const BANNER: &str = "========response'log=======";
const BANNER_END: &str = "========response'log=======end";

/// Logs status line metadata and, when enabled, the body of a response.
#[derive(Clone)]
pub struct ResponseLogger {
    out: TaggedSink,
    show_response: bool,
}

impl ResponseLogger {
    pub(crate) fn new(out: TaggedSink, show_response: bool) -> Self {
        Self { out, show_response }
    }

    /// Log `response`, received for a request sent to `uri`.
    ///
    /// Returns the response the caller should see: the original one when the
    /// body was never read, or an equivalent one with a fresh body when it was.
    /// Failures never escape; the fallback is always the response as received.
    ///
    /// The `message` line is the canonical reason phrase for the status code.
    /// A custom reason phrase sent on the wire is not shown.
    pub async fn log(&self, uri: &Uri, response: Response) -> Response {
        self.out.emit(BANNER);
        self.out.emit(format!("url : {uri}"));
        self.out.emit(format!("code : {}", response.status().as_u16()));
        self.out.emit(format!("protocol : {:?}", response.version()));
        if let Some(message) = response
            .status()
            .canonical_reason()
            .filter(|reason| !reason.is_empty())
        {
            self.out.emit(format!("message : {message}"));
        }

        match self.log_body(response).await {
            Ok(response) => {
                self.out.emit(BANNER_END);
                response
            }
            Err(abort) => {
                debug!(tag = %self.out.tag(), error = %abort.error, "Response logging aborted");
                abort.passthrough
            }
        }
    }

    async fn log_body(&self, response: Response) -> Result<Response, Abort<Response>> {
        if !self.show_response {
            return Ok(response);
        }
        let media_type = match MediaType::from_headers(response.headers()) {
            Ok(Some(media_type)) => media_type,
            Ok(None) => return Ok(response),
            Err(e) => return Err(Abort::new(response, e)),
        };

        self.out
            .emit(format!("responseBody's contentType : {media_type}"));
        if !media_type.is_text() {
            self.out.emit(format!("responseBody's content : {SKIPPED_BODY}"));
            return Ok(response);
        }

        let (parts, body) = response.into_parts();
        match capture_response_body(body).await {
            Ok((body, text)) => {
                self.out.emit(format!("responseBody's content : {text}"));
                Ok(Response::from_parts(parts, body))
            }
            Err((body, e)) => {
                Err(Abort::new(body, e).map(|body| Response::from_parts(parts, body)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::LogSink;
    use axum::{
        body::Body,
        http::{self, header::CONTENT_TYPE, StatusCode, Version},
    };
    use futures::{stream, StreamExt};
    use http_body_util::BodyExt;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    #[derive(Default)]
    struct Lines(Mutex<Vec<String>>);

    impl LogSink for Lines {
        fn log(&self, _tag: &str, message: &str) {
            self.0.lock().unwrap().push(message.to_owned());
        }
    }

    fn logger(show_response: bool) -> (ResponseLogger, Arc<Lines>) {
        let lines = Arc::new(Lines::default());
        let logger = ResponseLogger::new(TaggedSink::new("test", lines.clone()), show_response);
        (logger, lines)
    }

    fn lines(recorded: &Lines) -> Vec<String> {
        recorded.0.lock().unwrap().clone()
    }

    /// A body that counts how many times it gets polled for data
    fn counting_body(payload: &'static str) -> (Body, Arc<AtomicUsize>) {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();
        let body = Body::from_stream(stream::once(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>(payload)
        }));
        (body, polls)
    }

    fn response(content_type: &str, body: Body) -> Response {
        http::Response::builder()
            .status(StatusCode::OK)
            .version(Version::HTTP_11)
            .header(CONTENT_TYPE, content_type)
            .header("x-trace", "abc")
            .body(body)
            .unwrap()
    }

    fn uri() -> Uri {
        Uri::from_static("http://a/b")
    }

    #[tokio::test]
    async fn test_metadata_always_logged() {
        let (logger, recorded) = logger(false);
        let response = http::Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::empty())
            .unwrap();

        logger.log(&uri(), response).await;
        assert_eq!(
            lines(&recorded),
            vec![
                BANNER.to_owned(),
                "url : http://a/b".to_owned(),
                "code : 404".to_owned(),
                "protocol : HTTP/1.1".to_owned(),
                "message : Not Found".to_owned(),
                BANNER_END.to_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_message_for_unknown_status() {
        let (logger, recorded) = logger(false);
        let response = http::Response::builder()
            .status(StatusCode::from_u16(599).unwrap())
            .body(Body::empty())
            .unwrap();

        logger.log(&uri(), response).await;
        assert!(!lines(&recorded).iter().any(|l| l.starts_with("message")));
    }

    #[tokio::test]
    async fn test_show_response_off_leaves_body_untouched() {
        let (logger, recorded) = logger(false);
        let (body, polls) = counting_body(r#"{"a":1}"#);

        let returned = logger.log(&uri(), response("application/json", body)).await;
        assert_eq!(polls.load(Ordering::SeqCst), 0);
        assert!(!lines(&recorded).iter().any(|l| l.starts_with("responseBody")));

        let bytes = returned.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes, r#"{"a":1}"#);
        assert_eq!(polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_text_body_logged_and_rebuilt() {
        let (logger, recorded) = logger(true);
        let mut original = response("application/json", Body::from(r#"{"a":1}"#));
        original.extensions_mut().insert(7u32);

        let returned = logger.log(&uri(), original).await;
        assert_eq!(returned.status(), StatusCode::OK);
        assert_eq!(returned.version(), Version::HTTP_11);
        assert_eq!(returned.headers()["x-trace"], "abc");
        assert_eq!(returned.extensions().get::<u32>(), Some(&7));

        let recorded = lines(&recorded);
        assert!(recorded.contains(&"responseBody's contentType : application/json".to_owned()));
        assert!(recorded.contains(&r#"responseBody's content : {"a":1}"#.to_owned()));
        assert_eq!(recorded.last().unwrap(), BANNER_END);

        let bytes = returned.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_binary_body_skipped_and_never_read() {
        let (logger, recorded) = logger(true);
        let (body, polls) = counting_body("PNG");

        let returned = logger.log(&uri(), response("image/png", body)).await;
        assert_eq!(polls.load(Ordering::SeqCst), 0);
        assert!(lines(&recorded).contains(&format!("responseBody's content : {SKIPPED_BODY}")));

        let bytes = returned.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes, "PNG");
    }

    #[tokio::test]
    async fn test_stream_error_falls_back_to_equivalent_response() {
        let (logger, recorded) = logger(true);
        let body = Body::from_stream(stream::iter(vec![
            Ok("half"),
            Err(std::io::Error::other("reset")),
        ]));

        let returned = logger.log(&uri(), response("text/plain", body)).await;
        let recorded = lines(&recorded);
        assert!(recorded.contains(&"responseBody's contentType : text/plain".to_owned()));
        assert!(!recorded.iter().any(|l| l.starts_with("responseBody's content :")));
        assert!(!recorded.contains(&BANNER_END.to_owned()));

        assert_eq!(returned.headers()["x-trace"], "abc");
        let mut frames = returned.into_body().into_data_stream();
        assert_eq!(frames.next().await.unwrap().unwrap(), "half");
        assert!(frames.next().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_invalid_utf8_falls_back_to_same_bytes() {
        let (logger, _recorded) = logger(true);
        let payload = vec![b'o', b'k', 0xff];

        let returned = logger
            .log(&uri(), response("text/plain", Body::from(payload.clone())))
            .await;
        let bytes = returned.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.to_vec(), payload);
    }

    #[tokio::test]
    async fn test_no_content_type_returns_untouched() {
        let (logger, recorded) = logger(true);
        let (body, polls) = counting_body("plain");
        let response = http::Response::builder().body(body).unwrap();

        let returned = logger.log(&uri(), response).await;
        assert_eq!(polls.load(Ordering::SeqCst), 0);
        assert!(!lines(&recorded).iter().any(|l| l.starts_with("responseBody")));
        let bytes = returned.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes, "plain");
    }

    #[tokio::test]
    async fn test_malformed_content_type_returns_original() {
        let (logger, recorded) = logger(true);
        let (body, polls) = counting_body("payload");

        let returned = logger.log(&uri(), response("nonsense", body)).await;
        assert_eq!(polls.load(Ordering::SeqCst), 0);

        let recorded = lines(&recorded);
        assert_eq!(recorded.last().unwrap(), "message : OK");
        assert!(!recorded.contains(&BANNER_END.to_owned()));

        assert_eq!(returned.status(), StatusCode::OK);
        assert_eq!(returned.headers()["x-trace"], "abc");
        assert_eq!(returned.headers()[CONTENT_TYPE], "nonsense");
        let bytes = returned.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes, "payload");
    }

    #[tokio::test]
    async fn test_non_ascii_content_type_returns_original() {
        let (logger, recorded) = logger(true);
        let mut original = response("text/plain", Body::from("payload"));
        original.headers_mut().insert(
            CONTENT_TYPE,
            http::HeaderValue::from_bytes(b"text/\xffplain").unwrap(),
        );

        let returned = logger.log(&uri(), original).await;
        assert!(!lines(&recorded).iter().any(|l| l.starts_with("responseBody")));
        let bytes = returned.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes, "payload");
    }
}
