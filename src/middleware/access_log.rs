use std::time::Duration;

use serde_json::Value;
use tracing::info;

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// One `info` line per request:
/// `<x-real-ip> <method> <url> <status> <content-length> - <ms> ms`
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLogMiddleware;

impl AccessLogMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Client address: `X-Real-IP` when a proxy set it, else the peer address.
    #[must_use]
    pub fn client_ip(req: &HandlerRequest) -> String {
        req.get_header("x-real-ip")
            .map(str::to_string)
            .or_else(|| req.remote_addr.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| "-".to_string())
    }

    #[must_use]
    pub fn format_line(req: &HandlerRequest, res: &HandlerResponse, latency: Duration) -> String {
        let length = match &res.body {
            Value::Null if res.status == 204 || res.status == 304 => "-".to_string(),
            Value::String(s) => s.len().to_string(),
            other => serde_json::to_vec(other)
                .map(|v| v.len().to_string())
                .unwrap_or_else(|_| "-".to_string()),
        };
        format!(
            "{} {} {} {} {} - {:.3} ms",
            Self::client_ip(req),
            req.method,
            req.url,
            res.status,
            length,
            latency.as_secs_f64() * 1000.0
        )
    }
}

impl Middleware for AccessLogMiddleware {
    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        info!(
            request_id = %req.request_id,
            status = res.status,
            latency_ms = latency.as_millis() as u64,
            "{}",
            Self::format_line(req, res, latency)
        );
    }
}
