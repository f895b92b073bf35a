//! Content type parsing and text classification.
//!
//! Bodies are only printed when their media type says they are text. Everything
//! else (images, archives, multipart uploads) is reported with a placeholder so a
//! large binary payload never ends up in the log.

use axum::http::{header::CONTENT_TYPE, HeaderMap};
use std::fmt;

/// Subtypes that are printable even when the primary type is not `text`.
const TEXT_SUBTYPES: [&str; 4] = ["json", "xml", "html", "webviewhtml"];

/// Error type for `Content-Type` parsing
#[derive(Debug, thiserror::Error)]
pub enum MediaTypeError {
    #[error("Content-Type header is not visible ASCII")]
    NotAscii,
    #[error("malformed media type: {0:?}")]
    Malformed(String),
}

/// A `type/subtype` pair taken from a `Content-Type` header.
///
/// Both tokens are lowercased for comparison. The header text is kept as-is
/// (parameters included) for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    type_: String,
    subtype: String,
    raw: String,
}

impl MediaType {
    /// Parse a media type such as `application/json; charset=utf-8`.
    pub fn parse(value: &str) -> Result<Self, MediaTypeError> {
        let raw = value.trim();
        let essence = raw.split(';').next().unwrap_or_default().trim();
        let (type_, subtype) = essence
            .split_once('/')
            .ok_or_else(|| MediaTypeError::Malformed(raw.to_owned()))?;

        let valid = |token: &str| {
            !token.is_empty() && !token.contains(|c: char| c.is_whitespace() || c == '/')
        };
        if !valid(type_) || !valid(subtype) {
            return Err(MediaTypeError::Malformed(raw.to_owned()));
        }

        Ok(Self {
            type_: type_.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            raw: raw.to_owned(),
        })
    }

    /// Read the media type of a message from its headers.
    ///
    /// Returns `Ok(None)` when there is no `Content-Type` header at all.
    pub fn from_headers(headers: &HeaderMap) -> Result<Option<Self>, MediaTypeError> {
        headers
            .get(CONTENT_TYPE)
            .map(|value| {
                let value = value.to_str().map_err(|_| MediaTypeError::NotAscii)?;
                Self::parse(value)
            })
            .transpose()
    }

    /// The primary type, lowercased (`application` in `application/json`).
    pub fn type_(&self) -> &str {
        &self.type_
    }

    /// The subtype, lowercased, without parameters (`json` in `application/json`).
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Whether a body of this type is safe to print as text.
    pub fn is_text(&self) -> bool {
        self.type_ == "text" || TEXT_SUBTYPES.contains(&self.subtype.as_str())
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
