//! Request correlation ids and the `X-Request-Id` header.
//!
//! A caller that already tags its requests (a gateway, another service) keeps
//! its id so log lines join up across hops. Everyone else gets a fresh ULID.

use std::fmt;
use std::sync::Arc;

/// Header carrying a caller-supplied request id, lowercase.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied id that is reused as-is.
pub const MAX_REQUEST_ID_LEN: usize = 128;

/// Where a [`RequestId`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdOrigin {
    /// Taken from the request's `X-Request-Id`
    Header,
    /// Minted for this request
    Generated,
}

/// Per-request correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId {
    value: Arc<str>,
    origin: IdOrigin,
}

impl RequestId {
    /// A fresh ULID-backed id.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            value: Arc::from(ulid::Ulid::new().to_string()),
            origin: IdOrigin::Generated,
        }
    }

    /// Accept a header value as an id when it is safe to echo into logs and
    /// response headers: trimmed, non-empty, at most [`MAX_REQUEST_ID_LEN`]
    /// bytes of ASCII letters, digits, `-`, `_`, `.` or `:`.
    #[must_use]
    pub fn from_header_value(value: &str) -> Option<Self> {
        let value = value.trim();
        let acceptable = !value.is_empty()
            && value.len() <= MAX_REQUEST_ID_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'));
        acceptable.then(|| Self {
            value: Arc::from(value),
            origin: IdOrigin::Header,
        })
    }

    /// The id for a request with these headers: the first acceptable
    /// `X-Request-Id` (name matched case-insensitively), else a fresh one.
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        headers
            .into_iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(REQUEST_ID_HEADER))
            .find_map(|(_, value)| Self::from_header_value(value))
            .unwrap_or_else(Self::generate)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn origin(&self) -> IdOrigin {
        self.origin
    }

    /// `(name, value)` for echoing the id back on a response.
    #[must_use]
    pub fn header(&self) -> (&'static str, &str) {
        (REQUEST_ID_HEADER, self.as_str())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
