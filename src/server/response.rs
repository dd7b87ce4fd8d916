use crate::dispatcher::HandlerResponse;
use serde_json::Value;
use tracing::error;

/// A response ready to be written: status, headers, body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Encode a handler response.
///
/// A `Value::String` body is written as-is (`text/plain` unless a content
/// type was set), `Value::Null` as an empty body, anything else as JSON. An
/// explicit `Content-Type` header always wins.
#[must_use]
pub fn encode_response(res: &HandlerResponse) -> EncodedResponse {
    let (default_type, body) = match &res.body {
        Value::String(s) => ("text/plain; charset=utf-8", s.clone().into_bytes()),
        Value::Null => ("application/json", Vec::new()),
        other => (
            "application/json",
            serde_json::to_vec(other).unwrap_or_else(|e| {
                error!(error = %e, "Failed to serialize response body");
                Vec::new()
            }),
        ),
    };

    let mut headers: Vec<(String, String)> = res
        .headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    if !body.is_empty() && res.get_header("content-type").is_none() {
        headers.push(("content-type".to_string(), default_type.to_string()));
    }

    EncodedResponse {
        status: res.status,
        headers,
        body,
    }
}
