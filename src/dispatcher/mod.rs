//! # Dispatcher Module
//!
//! Handler chains and the request/response values that flow through them.
//!
//! A route owns an ordered chain of [`Handler`]s. Each handler either passes
//! the request on ([`Flow::Next`]), answers it ([`Flow::Respond`]), or fails
//! with a [`crate::error::HandlerError`]. Failures and panics stop the chain and
//! are handed to the error pipeline by the server.
//!
//! ```rust
//! use expressive::dispatcher::{handler, Flow, HandlerRequest, HandlerResponse, HandlerResult};
//! use serde_json::json;
//!
//! let get_user = handler(|req: &mut HandlerRequest| -> HandlerResult {
//!     let id = req.get_path_param("id").unwrap_or_default().to_string();
//!     Ok(Flow::Respond(HandlerResponse::json(200, json!({ "id": id }))))
//! });
//! # let _ = get_user;
//! ```

mod core;

pub use core::{
    handler, run_chain, BoxedHandler, Flow, Handler, HandlerRequest, HandlerResponse,
    HandlerResult, HeaderVec, MAX_INLINE_HEADERS,
};
