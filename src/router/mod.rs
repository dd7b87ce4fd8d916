//! # Router Module
//!
//! Route matching plus route registration with documentation.
//!
//! ## Overview
//!
//! - [`Router`] is the in-process route table. Patterns use the colon syntax
//!   (`/users/:id`, `/files/*`) and are compiled to anchored regexes once, at
//!   registration. Matching walks the table in registration order.
//! - [`ExpressiveRouter`] wraps any [`RouteSink`] (a [`Router`] by default).
//!   Every [`Route`] added through it is handed to the sink unchanged, then
//!   described as an operation in the shared OpenAPI document.
//!
//! ## Example
//!
//! ```rust
//! use expressive::dispatcher::{handler, Flow, HandlerRequest, HandlerResponse, HandlerResult};
//! use expressive::openapi::SharedDocument;
//! use expressive::router::{ExpressiveRouter, Route};
//! use serde_json::json;
//!
//! let mut pets = ExpressiveRouter::new(SharedDocument::default());
//! pets.add_route(
//!     Route::get("/pets/:id"),
//!     vec![handler(|req: &mut HandlerRequest| -> HandlerResult {
//!         let id = req.get_path_param("id").unwrap_or_default();
//!         Ok(Flow::Respond(HandlerResponse::json(200, json!({ "id": id }))))
//!     })],
//! );
//!
//! let router = pets.into_router();
//! let matched = router.route(&http::Method::GET, "/pets/7").unwrap();
//! assert_eq!(matched.get_path_param("id"), Some("7"));
//! ```

mod core;
mod expressive;

pub use core::{ParamVec, RouteError, RouteMatch, RouteSink, Router, MAX_INLINE_PARAMS};
pub use expressive::{ExpressiveRouter, PathItemConfig, Route, RouteDoc};
