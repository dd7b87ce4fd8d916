//! # Server Module
//!
//! Turns wire requests into [`crate::dispatcher::HandlerRequest`]s, runs them
//! through an [`App`], and writes the result back.
//!
//! - [`App`] - routing across mounted routers, middleware, docs mount,
//!   error pipeline and the not-found fallback
//! - [`HttpServer`] - blocking HTTP/1.1 listener with worker threads
//! - [`parse_request`] / [`encode_response`] - the conversions in between

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle, DEFAULT_MAX_BODY_BYTES};
pub use request::{parse_query, parse_request, split_url, ParsedRequest, RawRequest};
pub use response::{encode_response, EncodedResponse};
pub use service::{App, NOT_FOUND_BODY};
