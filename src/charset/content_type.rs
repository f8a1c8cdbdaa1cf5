//! Content-Type classification and rewriting.
//!
//! Pure functions over header values; no I/O and no allocation beyond the
//! rewritten value itself.

use axum::http::header::{HeaderMap, HeaderValue, InvalidHeaderValue, ToStrError, CONTENT_TYPE};
use thiserror::Error;

use crate::charset::snapshot::CharsetSnapshot;

/// Value set on responses that reach the client without any `Content-Type`.
pub const FALLBACK_CONTENT_TYPE: &str = "text/plain; charset=UTF-8";

/// What happened to a response's `Content-Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Header was absent and got the fallback.
    Defaulted,
    /// Header was rebuilt as `<base>; charset=<charset>`.
    Rewritten { from: String, to: String },
    /// Header left byte-for-byte as it was.
    Unchanged,
}

/// Reasons a rewrite attempt is abandoned.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Content-Type is not visible ASCII: {0}")]
    Unreadable(#[from] ToStrError),

    #[error("cannot build Content-Type value: {0}")]
    Unbuildable(#[from] InvalidHeaderValue),
}

/// The part of a `Content-Type` before the first `;`, trimmed and lower-cased.
pub fn base_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether the raw header mentions a charset anywhere, in any case.
pub fn declares_charset(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("charset")
}

/// Apply the charset policy of `snapshot` to `headers`.
///
/// Only the first `Content-Type` value is inspected. Any other parameters on a
/// matching header are dropped in favour of the bare base type plus charset.
/// On error the headers are untouched.
pub fn annotate(headers: &mut HeaderMap, snapshot: &CharsetSnapshot) -> Result<Outcome, RewriteError> {
    let Some(value) = headers.get(CONTENT_TYPE) else {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
        return Ok(Outcome::Defaulted);
    };

    let content_type = value.to_str()?;
    let base = base_media_type(content_type);

    if !snapshot.is_textual(&base) || declares_charset(content_type) {
        return Ok(Outcome::Unchanged);
    }

    let rewritten = format!("{}; charset={}", base, snapshot.charset());
    let new_value = HeaderValue::from_str(&rewritten)?;
    let from = content_type.to_string();
    headers.insert(CONTENT_TYPE, new_value);

    Ok(Outcome::Rewritten { from, to: rewritten })
}
