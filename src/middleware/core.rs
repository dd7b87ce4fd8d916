use std::time::Duration;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Hooks run around every request handled by [`crate::server::App`].
///
/// `before` runs in registration order and may short-circuit with a response;
/// `after` runs for every response, including errors and the not-found
/// fallback.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}
