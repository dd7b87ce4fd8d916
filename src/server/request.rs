use crate::dispatcher::HandlerRequest;
use crate::error::{ApiError, BodyParseError, ErrorKind, HandlerError};
use crate::ids::RequestId;
use crate::router::ParamVec;
use http::Method;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// Request data as read off the wire, before any interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRequest {
    pub method: String,
    /// Request target, query string included
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub remote_addr: Option<SocketAddr>,
}

/// Result of interpreting a [`RawRequest`].
///
/// `error` is set when the request is unusable (unknown method, oversized or
/// malformed body); the request is still returned so the failure can be
/// rendered and logged against it.
#[derive(Debug)]
pub struct ParsedRequest {
    pub request: HandlerRequest,
    pub error: Option<HandlerError>,
}

/// Split a request target into path and query string (without `?`).
/// A `#fragment` is dropped.
#[must_use]
pub fn split_url(url: &str) -> (&str, &str) {
    let url = url.split_once('#').map_or(url, |(before, _)| before);
    match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    }
}

fn decode_component(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Parse `a=1&b=x%20y` into ordered pairs.
///
/// Percent-escapes are decoded but a literal `+` stays `+`, so values such as
/// phone numbers and timezone offsets survive unescaped.
#[must_use]
pub fn parse_query(query: &str) -> ParamVec {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (Arc::from(decode_component(key)), decode_component(value))
        })
        .collect()
}

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Interpret a raw request: method, headers, query, and a JSON body when the
/// content type says so.
#[must_use]
pub fn parse_request(raw: RawRequest, max_body_bytes: usize) -> ParsedRequest {
    let mut error: Option<HandlerError> = None;
    let method = match Method::from_bytes(raw.method.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            error = Some(ApiError::with_message(ErrorKind::BadRequest, "Invalid HTTP method").into());
            Method::GET
        }
    };

    let mut request = HandlerRequest::new(method, &raw.url);
    request.remote_addr = raw.remote_addr;
    request.request_id =
        RequestId::from_headers(raw.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    for (name, value) in raw.headers {
        request.push_header(&name, value);
    }

    if error.is_none() && !raw.body.is_empty() {
        if raw.body.len() > max_body_bytes {
            error = Some(ApiError::new("Request body too large", 413, "PAYLOAD_TOO_LARGE").into());
        } else if request
            .get_header("content-type")
            .is_some_and(is_json_content_type)
        {
            match serde_json::from_slice::<Value>(&raw.body) {
                Ok(body) => request.body = Some(body),
                Err(e) => error = Some(BodyParseError::from(e).into()),
            }
        } else {
            debug!(
                request_id = %request.request_id,
                bytes = raw.body.len(),
                "Ignoring non-JSON request body"
            );
        }
    }

    ParsedRequest { request, error }
}
