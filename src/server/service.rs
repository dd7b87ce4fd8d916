use crate::common::RequestSnapshot;
use crate::dispatcher::{run_chain, HandlerRequest, HandlerResponse};
use crate::docs::DocsMount;
use crate::error::{ErrorHandler, HandlerError};
use crate::ids::REQUEST_ID_HEADER;
use crate::middleware::Middleware;
use crate::router::Router;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Body sent when no route answers a request.
pub const NOT_FOUND_BODY: &str = "¯\\_(ツ)_/¯";

/// A complete application: mounted routers, middleware, docs and the error
/// pipeline.
///
/// Request flow:
///
/// 1. `before` middleware, in order; the first response short-circuits
/// 2. a request that failed to parse goes straight to the error pipeline
/// 3. the docs mount, when configured
/// 4. each router in mount order; within a router every matching route is
///    tried in registration order until a handler chain responds
/// 5. the not-found fallback
/// 6. `after` middleware, in order, for whatever response was produced
#[derive(Clone)]
pub struct App {
    routers: Vec<Router>,
    middleware: Vec<Arc<dyn Middleware>>,
    error_handler: ErrorHandler,
    docs: Option<DocsMount>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("routers", &self.routers)
            .field("middleware", &self.middleware.len())
            .field("error_handler", &self.error_handler)
            .field("docs", &self.docs.as_ref().map(DocsMount::mount))
            .finish()
    }
}

impl App {
    #[must_use]
    pub fn new(error_handler: ErrorHandler) -> Self {
        Self {
            routers: Vec::new(),
            middleware: Vec::new(),
            error_handler,
            docs: None,
        }
    }

    /// Mount a router after those already mounted.
    #[must_use]
    pub fn mount(mut self, router: Router) -> Self {
        self.routers.push(router);
        self
    }

    #[must_use]
    pub fn with_middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    #[must_use]
    pub fn with_docs(mut self, docs: DocsMount) -> Self {
        self.docs = Some(docs);
        self
    }

    #[must_use]
    pub fn routers(&self) -> &[Router] {
        &self.routers
    }

    #[must_use]
    pub fn error_handler(&self) -> &ErrorHandler {
        &self.error_handler
    }

    /// The terminal fallback: 404 with a fixed plain-text body.
    #[must_use]
    pub fn not_found() -> HandlerResponse {
        HandlerResponse::text(404, NOT_FOUND_BODY)
    }

    /// Handle a request whose parsing succeeded.
    pub fn call(&self, req: HandlerRequest) -> HandlerResponse {
        self.handle(req, None)
    }

    /// Run one request through the whole application.
    pub fn handle(&self, mut req: HandlerRequest, parse_error: Option<HandlerError>) -> HandlerResponse {
        let start = Instant::now();

        let mut response = match self.middleware.iter().find_map(|m| m.before(&req)) {
            Some(early) => early,
            None => match parse_error {
                Some(err) => self.fail(err, &req),
                None => self.dispatch(&mut req),
            },
        };

        let latency = start.elapsed();
        for m in &self.middleware {
            m.after(&req, &mut response, latency);
        }
        if response.get_header(REQUEST_ID_HEADER).is_none() {
            let (name, value) = req.request_id.header();
            response.set_header(name, value);
        }
        response
    }

    fn dispatch(&self, req: &mut HandlerRequest) -> HandlerResponse {
        if let Some(docs) = &self.docs {
            if let Some(res) = docs.serve(req) {
                return res;
            }
        }

        let method = req.method.clone();
        let path = req.path.clone();
        for router in &self.routers {
            for matched in router.matches(&method, &path) {
                debug!(
                    request_id = %req.request_id,
                    method = %method,
                    pattern = %matched.pattern,
                    "Route matched"
                );
                req.path_params = matched.path_params;
                match run_chain(&matched.handlers, req) {
                    Ok(Some(res)) => return res,
                    Ok(None) => continue,
                    Err(err) => return self.fail(err, req),
                }
            }
        }

        debug!(request_id = %req.request_id, method = %method, path = %path, "No route matched");
        Self::not_found()
    }

    fn fail(&self, err: HandlerError, req: &HandlerRequest) -> HandlerResponse {
        self.error_handler
            .handle(err, RequestSnapshot::from_request(req))
    }
}
