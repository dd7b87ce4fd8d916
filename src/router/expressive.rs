//! Route registration that keeps the router and the OpenAPI document in step.

use super::core::{RouteError, RouteSink, Router};
use crate::dispatcher::BoxedHandler;
use crate::openapi::{
    infer_path_parameters, to_openapi_path, AuthMethod, HttpMethod, Param, PathItem, RequestBody,
    Responses, Servers, SharedDocument,
};
use tracing::debug;

/// Documentation fields of an operation, every one optional.
///
/// Used both for group defaults (shared by a whole [`ExpressiveRouter`]) and
/// for call-site overrides on a single [`Route`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathItemConfig {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub operation_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub request_body: Option<RequestBody>,
    pub responses: Option<Responses>,
    pub servers: Option<Servers>,
    pub security: Option<Vec<AuthMethod>>,
    pub deprecated: Option<bool>,
}

impl PathItemConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Field-wise merge: values set on `self` win over `lower`.
    #[must_use]
    pub fn or(self, lower: &PathItemConfig) -> Self {
        Self {
            summary: self.summary.or_else(|| lower.summary.clone()),
            description: self.description.or_else(|| lower.description.clone()),
            operation_id: self.operation_id.or_else(|| lower.operation_id.clone()),
            tags: self.tags.or_else(|| lower.tags.clone()),
            request_body: self.request_body.or_else(|| lower.request_body.clone()),
            responses: self.responses.or_else(|| lower.responses.clone()),
            servers: self.servers.or_else(|| lower.servers.clone()),
            security: self.security.or_else(|| lower.security.clone()),
            deprecated: self.deprecated.or(lower.deprecated),
        }
    }

    /// Materialize into an operation; unset `responses` become `{}`.
    #[must_use]
    pub fn into_path_item(self, parameters: Vec<Param>) -> PathItem {
        PathItem {
            summary: self.summary,
            description: self.description,
            operation_id: self.operation_id,
            tags: self.tags,
            parameters,
            request_body: self.request_body,
            responses: self.responses.unwrap_or_default(),
            servers: self.servers,
            security: self.security,
            deprecated: self.deprecated,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_request_body(mut self, body: RequestBody) -> Self {
        self.request_body = Some(body);
        self
    }

    pub fn with_responses(mut self, responses: Responses) -> Self {
        self.responses = Some(responses);
        self
    }

    pub fn with_servers(mut self, servers: Servers) -> Self {
        self.servers = Some(servers);
        self
    }

    pub fn with_security(mut self, security: Vec<AuthMethod>) -> Self {
        self.security = Some(security);
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = Some(deprecated);
        self
    }
}

/// Per-route documentation block.
///
/// `path_override`, `path_parameters`, `header_parameters` and
/// `query_parameters` steer how the operation is keyed and which parameters
/// it lists; `config` holds the remaining operation fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteDoc {
    /// Literal document key used instead of the translated router path
    pub path_override: Option<String>,
    /// Explicit path parameters; when non-empty they replace inference entirely
    pub path_parameters: Vec<Param>,
    pub header_parameters: Vec<Param>,
    pub query_parameters: Vec<Param>,
    pub config: PathItemConfig,
}

impl RouteDoc {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_override(mut self, path: impl Into<String>) -> Self {
        self.path_override = Some(path.into());
        self
    }

    pub fn with_path_parameters(mut self, params: Vec<Param>) -> Self {
        self.path_parameters = params;
        self
    }

    pub fn with_header_parameters(mut self, params: Vec<Param>) -> Self {
        self.header_parameters = params;
        self
    }

    pub fn with_query_parameters(mut self, params: Vec<Param>) -> Self {
        self.query_parameters = params;
        self
    }

    pub fn with_config(mut self, config: PathItemConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.config = self.config.with_summary(summary);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.with_tags(tags);
        self
    }

    pub fn with_request_body(mut self, body: RequestBody) -> Self {
        self.config = self.config.with_request_body(body);
        self
    }

    pub fn with_responses(mut self, responses: Responses) -> Self {
        self.config = self.config.with_responses(responses);
        self
    }

    pub fn with_security(mut self, security: Vec<AuthMethod>) -> Self {
        self.config = self.config.with_security(security);
        self
    }
}

/// A route to register: verb, router-style pattern, optional documentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
    pub oapi: Option<RouteDoc>,
}

impl Route {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            oapi: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Attach documentation to the route.
    #[must_use]
    pub fn doc(mut self, oapi: RouteDoc) -> Self {
        self.oapi = Some(oapi);
        self
    }
}

/// Registers routes on an underlying router and documents each one in a
/// shared OpenAPI document.
///
/// Several registrars may share one document (one per route group); each
/// carries its own group defaults.
///
/// ```
/// use expressive::dispatcher::{handler, Flow, HandlerRequest, HandlerResult};
/// use expressive::openapi::{swg, Schema, SharedDocument};
/// use expressive::router::{ExpressiveRouter, Route, RouteDoc};
///
/// let document = SharedDocument::default();
/// let mut users = ExpressiveRouter::new(document.clone());
/// users.add_route(
///     Route::get("/users/:id").doc(
///         RouteDoc::new().with_header_parameters(vec![swg::header_param("X-Trace", Schema::string())]),
///     ),
///     vec![handler(|_req: &mut HandlerRequest| -> HandlerResult { Ok(Flow::Next) })],
/// );
/// assert!(document.read().paths.contains_key("/users/{id}"));
/// ```
#[derive(Debug)]
pub struct ExpressiveRouter<R: RouteSink = Router> {
    document: SharedDocument,
    group: PathItemConfig,
    router: R,
}

impl ExpressiveRouter<Router> {
    /// Registrar over a fresh [`Router`] with no group defaults.
    pub fn new(document: SharedDocument) -> Self {
        Self::with_router(document, PathItemConfig::default(), Router::new())
    }

    /// Registrar over a fresh [`Router`] whose routes share `group` defaults.
    pub fn with_group_defaults(document: SharedDocument, group: PathItemConfig) -> Self {
        Self::with_router(document, group, Router::new())
    }
}

impl<R: RouteSink> ExpressiveRouter<R> {
    pub fn with_router(document: SharedDocument, group: PathItemConfig, router: R) -> Self {
        Self {
            document,
            group,
            router,
        }
    }

    /// Register `route` with the router, then document it.
    ///
    /// The router always receives the route, whatever the documentation
    /// says. The operation is written to `paths[key][method]`, replacing any
    /// earlier registration for the same pair.
    pub fn add_route(&mut self, route: Route, handlers: Vec<BoxedHandler>) -> &mut R {
        self.router.register(route.method, &route.path, handlers);
        self.document_route(route);
        &mut self.router
    }

    /// Like [`ExpressiveRouter::add_route`], but a pattern the router cannot
    /// compile comes back as an error and leaves the document untouched.
    pub fn try_add_route(
        &mut self,
        route: Route,
        handlers: Vec<BoxedHandler>,
    ) -> Result<&mut R, RouteError> {
        self.router.try_register(route.method, &route.path, handlers)?;
        self.document_route(route);
        Ok(&mut self.router)
    }

    fn document_route(&self, route: Route) {
        let RouteDoc {
            path_override,
            path_parameters,
            header_parameters,
            query_parameters,
            config,
        } = route.oapi.unwrap_or_default();

        let key = path_override.unwrap_or_else(|| to_openapi_path(&route.path));

        let path_params = if path_parameters.is_empty() {
            infer_path_parameters(&key)
        } else {
            path_parameters
        };
        let mut parameters = header_parameters;
        parameters.extend(query_parameters);
        parameters.extend(path_params);

        let item = config.or(&self.group).into_path_item(parameters);

        debug!(
            method = %route.method,
            router_path = %route.path,
            document_path = %key,
            parameters = item.parameters.len(),
            "Route documented"
        );

        let mut doc = self.document.write();
        let previous = doc
            .paths
            .entry(key)
            .or_default()
            .operations
            .insert(route.method, item);
        if previous.is_some() {
            debug!(method = %route.method, router_path = %route.path, "Operation replaced");
        }
    }

    #[must_use]
    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    #[must_use]
    pub fn group_defaults(&self) -> &PathItemConfig {
        &self.group
    }

    #[must_use]
    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut R {
        &mut self.router
    }

    /// Give up registration and keep the router for mounting.
    pub fn into_router(self) -> R {
        self.router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{handler, Flow, HandlerRequest, HandlerResult};
    use crate::openapi::{swg, Content, ParamLocation, Schema};

    fn noop() -> Vec<BoxedHandler> {
        vec![handler(|_req: &mut HandlerRequest| -> HandlerResult { Ok(Flow::Next) })]
    }

    #[derive(Default)]
    struct RecordingSink(Vec<(HttpMethod, String, usize)>);

    impl RouteSink for RecordingSink {
        fn register(&mut self, method: HttpMethod, path: &str, handlers: Vec<BoxedHandler>) {
            self.0.push((method, path.to_string(), handlers.len()));
        }
    }

    #[test]
    fn test_router_receives_unmodified_path() {
        let doc = SharedDocument::default();
        let mut r =
            ExpressiveRouter::with_router(doc.clone(), PathItemConfig::default(), RecordingSink::default());
        r.add_route(
            Route::get("/files/:name").doc(RouteDoc::new().with_path_override("/files/{name}.txt")),
            noop(),
        );
        assert_eq!(
            r.router().0,
            vec![(HttpMethod::Get, "/files/:name".to_string(), 1)]
        );
        assert!(doc.read().paths.contains_key("/files/{name}.txt"));
        assert!(!doc.read().paths.contains_key("/files/{name}"));
    }

    #[test]
    fn test_route_without_doc_gets_inferred_params_and_empty_responses() {
        let doc = SharedDocument::default();
        let mut r = ExpressiveRouter::new(doc.clone());
        r.add_route(Route::delete("/pets/:petId"), noop());
        let doc = doc.read();
        let item = doc.operation("/pets/{petId}", HttpMethod::Delete).unwrap();
        assert!(item.responses.is_empty());
        assert_eq!(item.parameters.len(), 1);
        assert_eq!(item.parameters[0].location, ParamLocation::Path);
        assert_eq!(item.parameters[0].name, "petId");
    }

    #[test]
    fn test_group_defaults_fill_unset_fields() {
        let doc = SharedDocument::default();
        let group = PathItemConfig::new()
            .with_tags(["a"])
            .with_security(vec![swg::security("BearerAuth")]);
        let mut r = ExpressiveRouter::with_group_defaults(doc.clone(), group);
        r.add_route(Route::get("/x").doc(RouteDoc::new().with_tags(["b"])), noop());
        r.add_route(Route::post("/x"), noop());

        let doc = doc.read();
        let get = doc.operation("/x", HttpMethod::Get).unwrap();
        assert_eq!(get.tags, Some(vec!["b".to_string()]));
        assert_eq!(get.security, Some(vec![swg::security("BearerAuth")]));
        let post = doc.operation("/x", HttpMethod::Post).unwrap();
        assert_eq!(post.tags, Some(vec!["a".to_string()]));
    }

    #[test]
    fn test_group_responses_beat_builtin_default() {
        let doc = SharedDocument::default();
        let mut responses = Responses::new();
        responses.insert("200".into(), Content::default().with_description("ok"));
        let mut r = ExpressiveRouter::with_group_defaults(
            doc.clone(),
            PathItemConfig::new().with_responses(responses.clone()),
        );
        r.add_route(Route::get("/y"), noop());
        assert_eq!(doc.read().operation("/y", HttpMethod::Get).unwrap().responses, responses);
    }

    #[test]
    fn test_parameter_order_header_query_path() {
        let doc = SharedDocument::default();
        let mut r = ExpressiveRouter::new(doc.clone());
        r.add_route(
            Route::get("/users/:id").doc(
                RouteDoc::new()
                    .with_query_parameters(vec![swg::query_param("expand", Schema::string())])
                    .with_header_parameters(vec![swg::header_param("X-Trace", Schema::string())]),
            ),
            noop(),
        );
        let doc = doc.read();
        let names: Vec<_> = doc
            .operation("/users/{id}", HttpMethod::Get)
            .unwrap()
            .parameters
            .iter()
            .map(|p| (p.location, p.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                (ParamLocation::Header, "X-Trace"),
                (ParamLocation::Query, "expand"),
                (ParamLocation::Path, "id"),
            ]
        );
    }

    #[test]
    fn test_explicit_path_params_replace_inference() {
        let doc = SharedDocument::default();
        let mut r = ExpressiveRouter::new(doc.clone());
        let explicit = swg::path_param("id", Schema::integer()).with_description("numeric id");
        r.add_route(
            Route::get("/x/:id").doc(RouteDoc::new().with_path_parameters(vec![explicit.clone()])),
            noop(),
        );
        assert_eq!(
            doc.read().operation("/x/{id}", HttpMethod::Get).unwrap().parameters,
            vec![explicit]
        );
    }

    #[test]
    fn test_reregistration_replaces_operation() {
        let doc = SharedDocument::default();
        let mut r = ExpressiveRouter::new(doc.clone());
        r.add_route(Route::get("/a").doc(RouteDoc::new().with_summary("first")), noop());
        r.add_route(Route::get("/a").doc(RouteDoc::new().with_tags(["t"])), noop());
        let doc = doc.read();
        let item = doc.operation("/a", HttpMethod::Get).unwrap();
        assert_eq!(item.summary, None);
        assert_eq!(item.tags, Some(vec!["t".to_string()]));
        assert_eq!(doc.paths["/a"].operations.len(), 1);
    }

    #[test]
    fn test_two_registrars_share_document() {
        let doc = SharedDocument::default();
        let mut users = ExpressiveRouter::new(doc.clone());
        let mut pets = ExpressiveRouter::new(doc.clone());
        users.add_route(Route::get("/users"), noop());
        pets.add_route(Route::get("/pets"), noop());
        assert_eq!(doc.read().paths.len(), 2);
        assert_eq!(users.into_router().len(), 1);
    }

    #[test]
    fn test_rest_and_constrained_params_route_and_document() {
        let doc = SharedDocument::default();
        let mut r = ExpressiveRouter::new(doc.clone());
        r.add_route(Route::get("/files/:path*"), noop());
        r.try_add_route(Route::get(r"/users/:id(\d+)"), noop()).unwrap();
        assert_eq!(r.router().len(), 2);

        let m = r.router().route(&http::Method::GET, "/files/a/b.txt").unwrap();
        assert_eq!(m.get_path_param("path"), Some("a/b.txt"));
        let m = r.router().route(&http::Method::GET, "/users/42").unwrap();
        assert_eq!(m.get_path_param("id"), Some("42"));

        let doc = doc.read();
        let item = doc.operation("/files/{path*}", HttpMethod::Get).unwrap();
        assert_eq!(item.parameters[0].name, "path*");
    }

    #[test]
    fn test_try_add_route_rejects_without_documenting() {
        let doc = SharedDocument::default();
        let mut r = ExpressiveRouter::new(doc.clone());
        let err = r
            .try_add_route(Route::get("/users/:id(\\d+"), noop())
            .unwrap_err();
        assert_eq!(err.pattern, "/users/:id(\\d+");
        assert!(r.router().is_empty());
        assert!(doc.read().paths.is_empty());
    }
}
