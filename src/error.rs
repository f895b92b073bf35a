//! Errors raised while producing log output.
//!
//! None of these ever reach the caller of the interceptor. They are caught at
//! the request/response logger boundary and reported as `debug` diagnostics.

use crate::body_capture::BodyCaptureError;
use crate::media_type::MediaTypeError;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    BodyCapture(#[from] BodyCaptureError),
    #[error("unusable Content-Type: {0}")]
    MediaType(#[from] MediaTypeError),
}

/// A logging step that gave up part-way.
///
/// Carries back the message (or body) it was working on so the caller can pass
/// it along untouched.
#[derive(Debug)]
pub(crate) struct Abort<T> {
    pub(crate) passthrough: T,
    pub(crate) error: Error,
}

impl<T> Abort<T> {
    pub(crate) fn new(passthrough: T, error: impl Into<Error>) -> Self {
        Self {
            passthrough,
            error: error.into(),
        }
    }

    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> Abort<U> {
        Abort {
            passthrough: f(self.passthrough),
            error: self.error,
        }
    }
}
