//! Body buffering and capture utilities.
//!
//! A [`Body`] is a one-shot stream: once it has been polled to the end there is
//! nothing left for the next reader. The functions here read a body into memory
//! exactly once and hand back a replacement body built from the retained bytes,
//! so whoever comes after the logger sees the same payload it would have seen
//! had the logger never looked.

use axum::body::Body;
use bytes::Bytes;
use futures::{stream, StreamExt};
use tracing::debug;

/// Text logged in place of a request body that could not be read.
pub const REQUEST_BODY_ERROR: &str = "something error when show requestBody.";

/// Error type for body capture operations
#[derive(Debug, thiserror::Error)]
pub enum BodyCaptureError {
    #[error("Body stream error: {0}")]
    StreamError(String),
    #[error("Body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Read `body` to the end, keeping every chunk.
///
/// On success the chunks are joined into a single buffer. If the stream fails
/// part-way, the returned body replays the chunks that were already read
/// followed by the same error, so a downstream reader observes exactly what the
/// original body would have produced.
pub async fn buffer_body(body: Body) -> Result<Bytes, (Body, BodyCaptureError)> {
    let mut frames = body.into_data_stream();
    let mut chunks: Vec<Bytes> = Vec::new();

    while let Some(result) = frames.next().await {
        match result {
            Ok(chunk) => chunks.push(chunk),
            Err(e) => {
                debug!(error = %e, chunks = chunks.len(), "Stream error during body capture");
                let error = BodyCaptureError::StreamError(e.to_string());
                let replay = stream::iter(chunks.into_iter().map(Ok).chain(std::iter::once(Err(e))));
                return Err((Body::from_stream(replay), error));
            }
        }
    }

    Ok(match chunks.len() {
        0 => Bytes::new(),
        1 => chunks.swap_remove(0),
        _ => chunks.concat().into(),
    })
}

/// Capture a request body as text.
///
/// Never fails: if the body cannot be read or is not UTF-8, the text is
/// [`REQUEST_BODY_ERROR`]. The returned body always carries the original
/// payload and must be forwarded in place of the one passed in.
pub async fn capture_request_body(body: Body) -> (Body, String) {
    match buffer_body(body).await {
        Ok(bytes) => {
            let decoded = std::str::from_utf8(&bytes).map(str::to_owned);
            let text = match decoded {
                Ok(text) => text,
                Err(e) => {
                    debug!(error = %e, "Request body is not valid UTF-8");
                    REQUEST_BODY_ERROR.to_owned()
                }
            };
            (Body::from(bytes), text)
        }
        Err((replay, _)) => (replay, REQUEST_BODY_ERROR.to_owned()),
    }
}

/// Capture a response body as text, consuming it.
///
/// The captured bytes are the only source for the replacement body: on success
/// the returned body is built from them, and on failure the body handed back
/// with the error carries whatever was read (plus the stream error, if any).
pub async fn capture_response_body(body: Body) -> Result<(Body, String), (Body, BodyCaptureError)> {
    let bytes = buffer_body(body).await?;
    let decoded = std::str::from_utf8(&bytes).map(str::to_owned);
    match decoded {
        Ok(text) => Ok((Body::from(bytes), text)),
        Err(e) => Err((Body::from(bytes), e.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn failing_body(prefix: &'static str) -> Body {
        Body::from_stream(stream::iter(vec![
            Ok(Bytes::from_static(prefix.as_bytes())),
            Err(std::io::Error::other("connection reset")),
        ]))
    }

    #[tokio::test]
    async fn test_buffer_joins_chunks() {
        let body = Body::from_stream(stream::iter(vec![
            Ok::<_, std::io::Error>(Bytes::from("chunk1")),
            Ok(Bytes::from("chunk2")),
            Ok(Bytes::from("chunk3")),
        ]));

        let bytes = buffer_body(body).await.unwrap();
        assert_eq!(bytes, "chunk1chunk2chunk3");
    }

    #[tokio::test]
    async fn test_buffer_failure_replays_prefix_then_error() {
        let (replay, error) = buffer_body(failing_body("partial")).await.unwrap_err();
        assert!(matches!(error, BodyCaptureError::StreamError(_)));

        let mut frames = replay.into_data_stream();
        assert_eq!(frames.next().await.unwrap().unwrap(), "partial");
        let err = frames.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn test_capture_request_body_keeps_payload() {
        let (body, text) = capture_request_body(Body::from("name=value")).await;
        assert_eq!(text, "name=value");

        let forwarded = body.collect().await.unwrap().to_bytes();
        assert_eq!(forwarded, "name=value");
    }

    #[tokio::test]
    async fn test_capture_request_body_failure_is_text() {
        let (body, text) = capture_request_body(failing_body("abc")).await;
        assert_eq!(text, REQUEST_BODY_ERROR);
        assert!(body.collect().await.is_err());
    }

    #[tokio::test]
    async fn test_capture_request_body_invalid_utf8() {
        let payload = Bytes::from_static(&[0x66, 0x6f, 0xff, 0x6f]);
        let (body, text) = capture_request_body(Body::from(payload.clone())).await;
        assert_eq!(text, REQUEST_BODY_ERROR);
        assert_eq!(body.collect().await.unwrap().to_bytes(), payload);
    }

    #[tokio::test]
    async fn test_capture_response_body_round_trip() {
        let (body, text) = capture_response_body(Body::from(r#"{"a":1}"#))
            .await
            .unwrap();
        assert_eq!(text, r#"{"a":1}"#);
        assert_eq!(body.collect().await.unwrap().to_bytes(), text.as_bytes());
    }

    #[tokio::test]
    async fn test_capture_response_body_invalid_utf8_hands_back_bytes() {
        let payload = Bytes::from_static(&[0xc3, 0x28]);
        let (body, error) = capture_response_body(Body::from(payload.clone()))
            .await
            .unwrap_err();
        assert!(matches!(error, BodyCaptureError::InvalidUtf8(_)));
        assert_eq!(body.collect().await.unwrap().to_bytes(), payload);
    }
}
