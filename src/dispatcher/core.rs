//! Dispatcher core - handler chain types and execution.

use crate::error::{ApiError, HandlerError};
use crate::ids::{IdOrigin, RequestId, REQUEST_ID_HEADER};
use crate::router::ParamVec;
use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage; names are shared `Arc<str>`, values owned per request.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request state handed down a handler chain.
///
/// Handlers may mutate it (e.g. an auth handler filling `user_id`) before
/// calling the next handler.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Correlation id, reused from `X-Request-Id` when acceptable
    pub request_id: RequestId,
    pub method: Method,
    /// Path without the query string
    pub path: String,
    /// Original request target, query string included
    pub url: String,
    pub remote_addr: Option<SocketAddr>,
    /// Path parameters bound by the matched route pattern
    pub path_params: ParamVec,
    pub query_params: ParamVec,
    /// Headers with lowercase names
    pub headers: HeaderVec,
    /// Parsed JSON body, if one was sent
    pub body: Option<Value>,
    /// Authenticated user, set by whichever handler performs authentication
    pub user_id: Option<String>,
}

impl HandlerRequest {
    /// Build a request from a method and a request target (`/path?query`).
    #[must_use]
    pub fn new(method: Method, url: &str) -> Self {
        let (path, query) = crate::server::split_url(url);
        Self {
            request_id: RequestId::generate(),
            method,
            path: path.to_string(),
            url: url.to_string(),
            remote_addr: None,
            path_params: ParamVec::new(),
            query_params: crate::server::parse_query(query),
            headers: HeaderVec::new(),
            body: None,
            user_id: None,
        }
    }

    /// Add a header (name is lowercased). The first acceptable
    /// `X-Request-Id` replaces a generated `request_id`.
    pub fn push_header(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        if name == REQUEST_ID_HEADER && self.request_id.origin() == IdOrigin::Generated {
            if let Some(id) = RequestId::from_header_value(&value) {
                self.request_id = id;
            }
        }
        self.headers.push((Arc::from(name), value));
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.push_header(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Get a path parameter by name; the last occurrence wins.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name; the last occurrence wins.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Case-insensitive header lookup.
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn query_params_map(&self) -> HashMap<String, String> {
        self.query_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Deserialize the JSON body into `T`.
    ///
    /// A missing body or one that does not fit `T` is a schema validation
    /// failure; the serde message is attached as error data.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let body = self
            .body
            .clone()
            .ok_or_else(|| ApiError::schema_validation().with_data(Value::from("missing request body")))?;
        serde_json::from_value(body)
            .map_err(|e| ApiError::schema_validation().with_data(Value::from(e.to_string())))
    }
}

/// Response produced by a handler or by the error pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// JSON body; a `Value::String` is written as plain text
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "text/plain; charset=utf-8".to_string()));
        Self {
            status,
            headers,
            body: Value::String(body.into()),
        }
    }

    /// Case-insensitive header lookup.
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
    }
}

/// What a handler asks the chain to do next.
#[derive(Debug)]
pub enum Flow {
    /// Pass the request to the next handler in the chain
    Next,
    /// Stop the chain and send this response
    Respond(HandlerResponse),
}

pub type HandlerResult = Result<Flow, HandlerError>;

/// One link of a route's handler chain.
pub trait Handler: Send + Sync {
    fn handle(&self, req: &mut HandlerRequest) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut HandlerRequest) -> HandlerResult + Send + Sync,
{
    fn handle(&self, req: &mut HandlerRequest) -> HandlerResult {
        self(req)
    }
}

pub type BoxedHandler = Arc<dyn Handler>;

/// Box a closure or handler for use in a chain.
pub fn handler<H: Handler + 'static>(h: H) -> BoxedHandler {
    Arc::new(h)
}

/// Run `handlers` in order until one responds or fails.
///
/// Returns `Ok(None)` when every handler passed the request on. A panicking
/// handler is reported as an error instead of unwinding into the caller.
pub fn run_chain(
    handlers: &[BoxedHandler],
    req: &mut HandlerRequest,
) -> Result<Option<HandlerResponse>, HandlerError> {
    for (index, handler) in handlers.iter().enumerate() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(req)));
        match outcome {
            Ok(Ok(Flow::Next)) => continue,
            Ok(Ok(Flow::Respond(response))) => {
                debug!(
                    request_id = %req.request_id,
                    handler_index = index,
                    status = response.status,
                    "Handler responded"
                );
                return Ok(Some(response));
            }
            Ok(Err(err)) => {
                debug!(
                    request_id = %req.request_id,
                    handler_index = index,
                    error = %err,
                    "Handler failed"
                );
                return Err(err);
            }
            Err(payload) => return Err(HandlerError::from_panic(payload)),
        }
    }
    Ok(None)
}
