//! Router core - route table and request matching.

use crate::dispatcher::BoxedHandler;
use crate::openapi::HttpMethod;
use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Maximum number of path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Parameter storage: `(name, value)` pairs in match order.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Anything that accepts `(method, pattern, handler chain)` registrations.
///
/// [`crate::router::ExpressiveRouter`] forwards every route here before it
/// touches the OpenAPI document.
pub trait RouteSink {
    fn register(&mut self, method: HttpMethod, path: &str, handlers: Vec<BoxedHandler>);

    /// Like [`RouteSink::register`], but hands back patterns the sink cannot
    /// serve instead of only logging them. Sinks that accept every pattern
    /// keep the default.
    fn try_register(
        &mut self,
        method: HttpMethod,
        path: &str,
        handlers: Vec<BoxedHandler>,
    ) -> Result<(), RouteError> {
        self.register(method, path, handlers);
        Ok(())
    }
}

/// A router pattern that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteError {
    pub pattern: String,
    pub reason: String,
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid route pattern '{}': {}", self.pattern, self.reason)
    }
}

impl std::error::Error for RouteError {}

struct RouteEntry {
    method: HttpMethod,
    pattern: Arc<str>,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    /// Capture group name for each entry of `param_names`
    groups: Vec<String>,
    handlers: Arc<[BoxedHandler]>,
}

fn group_name(index: usize) -> String {
    format!("__p{index}")
}

/// Result of matching a request against one registered route.
#[derive(Clone)]
pub struct RouteMatch {
    pub method: HttpMethod,
    /// The router pattern that matched (e.g. `/users/:id`)
    pub pattern: Arc<str>,
    /// Percent-decoded path parameters (e.g. `:id` → `("id", "123")`)
    pub path_params: ParamVec,
    pub handlers: Arc<[BoxedHandler]>,
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("path_params", &self.path_params)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl RouteMatch {
    /// Get a path parameter by name; the last occurrence wins.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Ordered route table using colon-style patterns.
///
/// Routes are tried in registration order; the first pattern whose method
/// and path match wins. Supported tokens: `:name` binds one segment,
/// `:name(re)` binds one match of `re`, `:name*` binds the rest of the path,
/// and `*` or `:*` bind the rest of the path under the name `*`.
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<Arc<RouteEntry>>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| format!("{} {}", r.method, r.pattern)))
            .finish()
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and append a route.
    pub fn try_add(
        &mut self,
        method: HttpMethod,
        path: &str,
        handlers: Vec<BoxedHandler>,
    ) -> Result<(), RouteError> {
        let (regex, param_names) = Self::path_to_regex(path)?;
        let groups = (0..param_names.len()).map(group_name).collect();
        self.routes.push(Arc::new(RouteEntry {
            method,
            pattern: Arc::from(path),
            regex,
            param_names,
            groups,
            handlers: handlers.into(),
        }));
        debug!(
            method = %method,
            pattern = %path,
            routes_count = self.routes.len(),
            "Route added"
        );
        Ok(())
    }

    /// Append every route of `other` after the existing ones.
    pub fn merge(&mut self, other: Router) {
        self.routes.extend(other.routes);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// `(method, pattern)` of every route in match order.
    pub fn routes(&self) -> impl Iterator<Item = (HttpMethod, &str)> {
        self.routes.iter().map(|r| (r.method, r.pattern.as_ref()))
    }

    /// Log every registered route at `info`.
    pub fn dump_routes(&self) {
        info!(routes_count = self.routes.len(), "Routing table");
        for (method, pattern) in self.routes() {
            info!(method = %method, pattern = %pattern, "Route");
        }
    }

    /// First route matching `method` and `path`.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.matches(method, path).next()
    }

    /// Every matching route, in registration order. A chain that passes the
    /// request on falls through to the next match.
    pub fn matches<'a>(
        &'a self,
        method: &'a Method,
        path: &'a str,
    ) -> impl Iterator<Item = RouteMatch> + 'a {
        let wanted = HttpMethod::from_http(method);
        self.routes
            .iter()
            .filter(move |entry| Some(entry.method) == wanted)
            .filter_map(move |entry| {
                let caps = entry.regex.captures(path)?;
                let mut path_params = ParamVec::new();
                for (name, group) in entry.param_names.iter().zip(&entry.groups) {
                    let raw = caps.name(group).map(|m| m.as_str()).unwrap_or_default();
                    let decoded = urlencoding::decode(raw)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| raw.to_string());
                    path_params.push((Arc::clone(name), decoded));
                }
                Some(RouteMatch {
                    method: entry.method,
                    pattern: Arc::clone(&entry.pattern),
                    path_params,
                    handlers: Arc::clone(&entry.handlers),
                })
            })
    }

    /// Convert a colon-style pattern into an anchored regex plus its
    /// parameter names in order.
    ///
    /// | Token | Binds |
    /// |---|---|
    /// | `:id` | one segment, `[^/]+?` |
    /// | `:id(\d+)` | one match of the given regex |
    /// | `:path*` | the rest of the path, slashes included |
    /// | `*`, `:*` | the rest of the path, under the name `*` |
    ///
    /// `/users/:id` becomes `^/users/(?P<__p0>[^/]+?)/?$` with names `["id"]`.
    pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<Arc<str>>), RouteError> {
        let invalid = |reason: String| RouteError {
            pattern: path.to_string(),
            reason,
        };
        let mut pattern = String::with_capacity(path.len() + 16);
        pattern.push('^');
        let mut param_names: Vec<Arc<str>> = Vec::with_capacity(path.matches(':').count());
        let mut push_param = |pattern: &mut String, name: &str, body: &str| {
            pattern.push_str(&format!("(?P<{}>{body})", group_name(param_names.len())));
            param_names.push(Arc::from(name));
        };

        let mut idx = 0;
        while let Some(c) = path[idx..].chars().next() {
            idx += c.len_utf8();
            match c {
                ':' => {
                    let rest = &path[idx..];
                    let ident_len = rest
                        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                        .unwrap_or(rest.len());
                    let ident = &rest[..ident_len];
                    idx += ident_len;
                    match path[idx..].chars().next() {
                        Some('*') => {
                            idx += 1;
                            let name = if ident.is_empty() { "*" } else { ident };
                            push_param(&mut pattern, name, ".*");
                        }
                        Some('(') if !ident.is_empty() => {
                            let close = constraint_end(&path[idx..]).ok_or_else(|| {
                                invalid(format!("unbalanced '(' after ':{ident}'"))
                            })?;
                            let constraint = &path[idx + 1..idx + close];
                            if constraint.is_empty() {
                                return Err(invalid(format!("empty constraint on ':{ident}'")));
                            }
                            idx += close + 1;
                            push_param(&mut pattern, ident, &format!("(?:{constraint})"));
                        }
                        _ if ident.is_empty() => pattern.push_str(&regex::escape(":")),
                        _ => push_param(&mut pattern, ident, "[^/]+?"),
                    }
                }
                '*' => push_param(&mut pattern, "*", ".*"),
                other => {
                    let mut buf = [0u8; 4];
                    pattern.push_str(&regex::escape(other.encode_utf8(&mut buf)));
                }
            }
        }

        if !path.ends_with('/') {
            pattern.push_str("/?");
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| invalid(e.to_string()))?;
        Ok((regex, param_names))
    }
}

/// Byte offset of the `)` closing the group that opens `s`, skipping
/// escaped characters and nested groups.
fn constraint_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

impl RouteSink for Router {
    /// Registration never fails outwardly; an uncompilable pattern is logged
    /// and left out of the table. Use [`RouteSink::try_register`] to see the
    /// error.
    fn register(&mut self, method: HttpMethod, path: &str, handlers: Vec<BoxedHandler>) {
        if let Err(err) = self.try_add(method, path, handlers) {
            error!(method = %method, pattern = %path, error = %err, "Route rejected");
        }
    }

    fn try_register(
        &mut self,
        method: HttpMethod,
        path: &str,
        handlers: Vec<BoxedHandler>,
    ) -> Result<(), RouteError> {
        self.try_add(method, path, handlers)
    }
}
