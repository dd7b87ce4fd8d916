use super::schema::Schema;
use super::types::{AuthMethod, ExternalDocs, Info, SecurityScheme, Servers, SharedDocument};
use indexmap::IndexMap;
use tracing::debug;

/// Fluent configuration of the shared OpenAPI document.
///
/// Each setter writes straight into the shared instance and hands the builder
/// back; no validation against the OpenAPI meta-schema is attempted.
///
/// ```
/// use expressive::openapi::{Info, SecurityScheme, SharedDocument, SwaggerBuilder, swg};
///
/// let doc = SwaggerBuilder::new(SharedDocument::default())
///     .with_info(Info::new("Pets", "1.0.0"))
///     .with_security_schemes([("BearerAuth", SecurityScheme::bearer_auth())])
///     .with_default_security(vec![swg::security("BearerAuth")])
///     .get();
/// assert_eq!(doc.read().info.title, "Pets");
/// ```
#[derive(Debug, Clone)]
pub struct SwaggerBuilder {
    document: SharedDocument,
}

impl SwaggerBuilder {
    pub fn new(document: SharedDocument) -> Self {
        Self { document }
    }

    pub fn with_info(self, info: Info) -> Self {
        debug!(title = %info.title, version = %info.version, "Document info set");
        self.document.write().info = info;
        self
    }

    pub fn with_external_docs(self, docs: ExternalDocs) -> Self {
        self.document.write().external_docs = Some(docs);
        self
    }

    pub fn with_servers(self, servers: Servers) -> Self {
        self.document.write().servers = servers;
        self
    }

    /// Replaces the whole `components.securitySchemes` mapping.
    pub fn with_security_schemes<I, K>(self, schemes: I) -> Self
    where
        I: IntoIterator<Item = (K, SecurityScheme)>,
        K: Into<String>,
    {
        let schemes: IndexMap<String, SecurityScheme> =
            schemes.into_iter().map(|(k, v)| (k.into(), v)).collect();
        debug!(count = schemes.len(), "Security schemes set");
        self.document.write().components.security_schemes = schemes;
        self
    }

    /// Replaces the whole `components.schemas` mapping.
    pub fn with_schemas<I, K>(self, schemas: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        let schemas: IndexMap<String, Schema> =
            schemas.into_iter().map(|(k, v)| (k.into(), v)).collect();
        debug!(count = schemas.len(), "Component schemas set");
        self.document.write().components.schemas = schemas;
        self
    }

    /// Replaces the top-level `security` requirement list.
    pub fn with_default_security(self, auth_methods: Vec<AuthMethod>) -> Self {
        self.document.write().security = Some(auth_methods);
        self
    }

    /// Handle to the live document. Not a copy: later registrations show up
    /// through it. Use [`SharedDocument::snapshot`] for a frozen copy.
    #[must_use]
    pub fn get(&self) -> SharedDocument {
        self.document.clone()
    }
}
