use super::schema::Schema;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// OpenAPI version written into every document built by this crate.
pub const OPENAPI_VERSION: &str = "3.1.0";

/// HTTP verbs that can carry an operation in a path entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Trace,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Trace => "trace",
        }
    }

    #[must_use]
    pub fn to_http(self) -> http::Method {
        match self {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Delete => http::Method::DELETE,
            HttpMethod::Head => http::Method::HEAD,
            HttpMethod::Options => http::Method::OPTIONS,
            HttpMethod::Trace => http::Method::TRACE,
        }
    }

    /// Maps an `http::Method`; extension methods have no OpenAPI operation slot.
    #[must_use]
    pub fn from_http(method: &http::Method) -> Option<Self> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.to_http() == *method)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unsupported HTTP method '{s}'"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
}

impl Info {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
            terms_of_service: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_terms_of_service(mut self, url: impl Into<String>) -> Self {
        self.terms_of_service = Some(url.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDocs {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub type Servers = Vec<Server>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamLocation::Path => f.write_str("path"),
            ParamLocation::Query => f.write_str("query"),
            ParamLocation::Header => f.write_str("header"),
        }
    }
}

/// An operation input: one path segment, query entry or header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    #[serde(rename = "in")]
    pub location: ParamLocation,
    pub name: String,
    pub description: String,
    pub required: bool,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
}

/// `content` block keyed by media type; used for request bodies and responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

impl Content {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.content.insert(
            media_type.into(),
            MediaType {
                schema: schema.into(),
            },
        );
        self
    }
}

pub type RequestBody = Content;
pub type Responses = IndexMap<String, Content>;

/// Reference to named security schemes and the scopes each one requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthMethod(pub IndexMap<String, Vec<String>>);

impl AuthMethod {
    /// Reference a scheme without requiring any scopes.
    pub fn new(scheme: impl Into<String>) -> Self {
        Self::with_scopes(scheme, Vec::<String>::new())
    }

    pub fn with_scopes<I, S>(scheme: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = IndexMap::new();
        map.insert(scheme.into(), scopes.into_iter().map(Into::into).collect());
        Self(map)
    }

    pub fn scheme_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpAuthScheme {
    Basic,
    Bearer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCodeFlow {
    pub authorization_url: String,
    pub token_url: String,
    pub scopes: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    pub authorization_code: AuthorizationCodeFlow,
}

/// Security scheme definition registered under `components.securitySchemes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    #[serde(rename = "http")]
    Http { scheme: HttpAuthScheme },
    #[serde(rename = "apiKey")]
    ApiKey {
        #[serde(rename = "in")]
        location: ApiKeyLocation,
        name: String,
    },
    #[serde(rename = "openIdConnect")]
    OpenIdConnect {
        #[serde(rename = "openIdConnectUrl")]
        open_id_connect_url: String,
    },
    #[serde(rename = "oauth2")]
    OAuth2 { flows: OAuthFlows },
}

/// One documented operation (an OpenAPI Operation Object).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub parameters: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub responses: Responses,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<Servers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<AuthMethod>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
}

/// Everything documented under one path template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<Servers>,
    #[serde(flatten)]
    pub operations: IndexMap<HttpMethod, PathItem>,
}

impl PathEntry {
    #[must_use]
    pub fn operation(&self, method: HttpMethod) -> Option<&PathItem> {
        self.operations.get(&method)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Schema>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub security_schemes: IndexMap<String, SecurityScheme>,
}

/// The OpenAPI document shared by the builder and every registrar.
///
/// `paths` keys are always brace-style templates (`/users/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Servers,
    #[serde(default)]
    pub paths: IndexMap<String, PathEntry>,
    #[serde(default)]
    pub components: Components,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<AuthMethod>>,
}

impl Default for OpenApiDocument {
    fn default() -> Self {
        Self {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info::default(),
            external_docs: None,
            servers: Vec::new(),
            paths: IndexMap::new(),
            components: Components::default(),
            security: None,
        }
    }
}

impl OpenApiDocument {
    pub fn new(info: Info) -> Self {
        Self {
            info,
            ..Self::default()
        }
    }

    /// Look up the operation documented for `(path, method)`.
    #[must_use]
    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<&PathItem> {
        self.paths.get(path).and_then(|entry| entry.operation(method))
    }

    /// Names referenced by `AuthMethod`s (global and per-operation) that are
    /// not registered under `components.securitySchemes`.
    ///
    /// Registration never checks this; callers that want a strict document
    /// can assert on it once startup is done.
    #[must_use]
    pub fn undefined_security_references(&self) -> Vec<String> {
        let global = self.security.iter().flatten();
        let per_operation = self
            .paths
            .values()
            .flat_map(|entry| entry.operations.values())
            .filter_map(|item| item.security.as_ref())
            .flatten();
        let mut missing: Vec<String> = Vec::new();
        for name in global.chain(per_operation).flat_map(AuthMethod::scheme_names) {
            if !self.components.security_schemes.contains_key(name)
                && !missing.iter().any(|m| m == name)
            {
                missing.push(name.to_string());
            }
        }
        missing
    }
}

/// Cloneable handle to the one document instance of an application.
///
/// Every clone observes the same document; the builder, each registrar and the
/// docs endpoint hold one. Mutation is expected during startup only.
#[derive(Debug, Clone, Default)]
pub struct SharedDocument(Arc<RwLock<OpenApiDocument>>);

impl SharedDocument {
    pub fn new(document: OpenApiDocument) -> Self {
        Self(Arc::new(RwLock::new(document)))
    }

    /// Read access. A poisoned lock still yields the document: a writer that
    /// panicked mid-registration leaves at worst a partial document.
    pub fn read(&self) -> RwLockReadGuard<'_, OpenApiDocument> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, OpenApiDocument> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Owned copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> OpenApiDocument {
        self.read().clone()
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(&*self.read())
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&*self.read())
    }

    /// True when both handles point at the same document instance.
    #[must_use]
    pub fn same_instance(&self, other: &SharedDocument) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
