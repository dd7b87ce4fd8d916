//! # expressive
//!
//! Route registration that keeps an OpenAPI 3.1 document in step with a live
//! HTTP router, plus a uniform JSON error pipeline.
//!
//! ## Overview
//!
//! Every route added through an [`router::ExpressiveRouter`] is registered
//! with the router *and* written into a shared [`openapi::OpenApiDocument`]:
//! the path is translated (`/users/:id` → `/users/{id}`), path parameters are
//! inferred, and group defaults are merged with per-route overrides. The
//! finished document is served as Swagger UI by [`docs::DocsMount`].
//!
//! Handler failures funnel through [`error::ErrorHandler`], which classifies
//! them into the [`error::ApiError`] taxonomy and renders
//! `{status:"error", message, errorCode, errors?}`.
//!
//! ## Modules
//!
//! - **[`openapi`]** - document model, schema model, builders, path translation
//! - **[`router`]** - route table and the documenting registrar
//! - **[`dispatcher`]** - handler chains and request/response values
//! - **[`error`]** - error taxonomy and pipeline
//! - **[`server`]** - `App` and the HTTP adapter
//! - **[`middleware`]** - access log and security headers
//! - **[`docs`]** - Swagger UI and document endpoints
//! - **[`config`]**, **[`logging`]**, **[`context`]** - startup wiring
//! - **[`common`]**, **[`response`]**, **[`ids`]** - helpers
//!
//! ## Example
//!
//! ```rust
//! use expressive::config::Env;
//! use expressive::dispatcher::{handler, Flow, HandlerRequest, HandlerResponse, HandlerResult};
//! use expressive::error::{ApiError, ErrorHandler};
//! use expressive::openapi::{swg, HttpMethod, Info, Schema, SharedDocument, SwaggerBuilder};
//! use expressive::router::{ExpressiveRouter, Route, RouteDoc};
//! use expressive::server::App;
//! use serde_json::json;
//!
//! let document = SwaggerBuilder::new(SharedDocument::default())
//!     .with_info(Info::new("Users", "1.0.0"))
//!     .get();
//!
//! let mut users = ExpressiveRouter::new(document.clone());
//! users.add_route(
//!     Route::get("/users/:id").doc(
//!         RouteDoc::new().with_header_parameters(vec![swg::header_param("X-Trace", Schema::string())]),
//!     ),
//!     vec![handler(|req: &mut HandlerRequest| -> HandlerResult {
//!         match req.get_path_param("id") {
//!             Some("1") => Ok(Flow::Respond(HandlerResponse::json(200, json!({"id": 1})))),
//!             _ => Err(ApiError::not_found().into()),
//!         }
//!     })],
//! );
//!
//! let documented = document.read().operation("/users/{id}", HttpMethod::Get).cloned();
//! assert_eq!(documented.map(|op| op.parameters.len()), Some(2));
//!
//! let app = App::new(ErrorHandler::new(Env::Prod)).mount(users.into_router());
//! let res = app.call(HandlerRequest::new(http::Method::GET, "/users/2"));
//! assert_eq!(res.status, 404);
//! assert_eq!(res.body["errorCode"], "NOT_FOUND");
//! ```

pub mod common;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod docs;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod openapi;
pub mod response;
pub mod router;
pub mod server;

pub use context::AppContext;
pub use error::{ApiError, ErrorHandler, HandlerError};
pub use openapi::{SharedDocument, SwaggerBuilder};
pub use router::{ExpressiveRouter, Route, RouteDoc};
pub use server::{App, HttpServer};
