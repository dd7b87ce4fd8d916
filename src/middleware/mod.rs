//! Request/response middleware run by [`crate::server::App`].

mod access_log;
mod core;
mod security_headers;

pub use access_log::AccessLogMiddleware;
pub use core::Middleware;
pub use security_headers::{SecurityHeadersMiddleware, DEFAULT_SECURITY_HEADERS};
