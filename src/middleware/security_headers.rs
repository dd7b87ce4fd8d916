use std::sync::Arc;
use std::time::Duration;

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Default hardening headers added to every response.
///
/// No `Content-Security-Policy` by default: the bundled Swagger UI page loads
/// its assets from a CDN.
pub const DEFAULT_SECURITY_HEADERS: &[(&str, &str)] = &[
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Adds security headers to responses that do not already set them.
#[derive(Debug, Clone)]
pub struct SecurityHeadersMiddleware {
    headers: Vec<(Arc<str>, String)>,
}

impl Default for SecurityHeadersMiddleware {
    fn default() -> Self {
        Self {
            headers: DEFAULT_SECURITY_HEADERS
                .iter()
                .map(|(k, v)| (Arc::from(*k), (*v).to_string()))
                .collect(),
        }
    }
}

impl SecurityHeadersMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        self.headers.retain(|(k, _)| k.as_ref() != name);
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    /// Stop sending one header.
    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self
    }

    #[must_use]
    pub fn with_content_security_policy(self, policy: impl Into<String>) -> Self {
        self.with_header("content-security-policy", policy)
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }
}

impl Middleware for SecurityHeadersMiddleware {
    fn after(&self, _req: &HandlerRequest, res: &mut HandlerResponse, _latency: Duration) {
        for (name, value) in &self.headers {
            if res.get_header(name).is_none() {
                res.headers.push((Arc::clone(name), value.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;

    #[test]
    fn test_defaults_applied_without_overwriting() {
        let mw = SecurityHeadersMiddleware::new();
        let req = HandlerRequest::new(Method::GET, "/");
        let mut res = HandlerResponse::json(200, json!({}));
        res.set_header("X-Frame-Options", "DENY");
        mw.after(&req, &mut res, Duration::ZERO);
        assert_eq!(res.get_header("x-frame-options"), Some("DENY"));
        assert_eq!(res.get_header("x-content-type-options"), Some("nosniff"));
        assert!(res.get_header("content-security-policy").is_none());
    }

    #[test]
    fn test_overrides() {
        let mw = SecurityHeadersMiddleware::new()
            .without("Strict-Transport-Security")
            .with_content_security_policy("default-src 'self'");
        let names: Vec<_> = mw.headers().map(|(k, _)| k).collect();
        assert!(!names.contains(&"strict-transport-security"));
        assert!(names.contains(&"content-security-policy"));
    }
}
