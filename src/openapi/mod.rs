//! # OpenAPI Module
//!
//! In-memory OpenAPI 3.1 document model and the pieces that build it:
//!
//! - [`schema`] - the recursive Schema Object model
//! - [`types`] - document, path entries, operations, parameters, security
//! - [`swg`] - constructors for parameters, security schemes and JSON content
//! - [`path`] - router-pattern to path-template translation and parameter inference
//! - [`builder`] - fluent configuration of the shared document
//!
//! Routes are added to the document by [`crate::router::ExpressiveRouter`], which
//! writes one [`PathItem`] per `(path, method)` as routes are registered.

mod builder;
mod path;
pub mod schema;
pub mod swg;
mod types;

pub use builder::SwaggerBuilder;
pub use path::{infer_path_parameters, template_parameter_names, to_openapi_path};
pub use schema::{
    AdditionalProperties, ArraySchema, BaseSchema, Composition, NumericSchema, ObjectSchema,
    Reference, Schema, SchemaKind, StringSchema, TypedSchema,
};
pub use types::{
    ApiKeyLocation, AuthMethod, AuthorizationCodeFlow, Components, Content, ExternalDocs,
    HttpAuthScheme, HttpMethod, Info, MediaType, OAuthFlows, OpenApiDocument, Param,
    ParamLocation, PathEntry, PathItem, RequestBody, Responses, SecurityScheme, Server, Servers,
    SharedDocument, OPENAPI_VERSION,
};
