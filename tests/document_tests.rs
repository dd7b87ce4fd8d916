//! Integration tests for the OpenAPI document as a whole
//!
//! Builds a document the way an application would at startup (builder,
//! component schemas, security schemes, a couple of routers) and checks the
//! serialized JSON and YAML forms.

use expressive::config::{AppConfig, Env};
use expressive::context::AppContext;
use expressive::dispatcher::{handler, Flow, HandlerRequest, HandlerResult};
use expressive::openapi::{
    swg, HttpMethod, Info, ObjectSchema, OpenApiDocument, Schema, SecurityScheme, Server,
    SharedDocument, OPENAPI_VERSION,
};
use expressive::router::{PathItemConfig, Route, RouteDoc};
use serde_json::json;

fn noop() -> expressive::dispatcher::BoxedHandler {
    handler(|_req: &mut HandlerRequest| -> HandlerResult { Ok(Flow::Next) })
}

fn context() -> AppContext {
    let config = AppConfig::from_lookup(|name| match name {
        "ENV" => Some("development".to_string()),
        "APP_NAME" => Some("pets".to_string()),
        _ => None,
    })
    .unwrap();
    AppContext::new(config, SharedDocument::default())
}

fn pet_schema() -> Schema {
    Schema::object(
        ObjectSchema::new()
            .required_property("id", Schema::integer())
            .required_property("name", Schema::string())
            .property("tag", Schema::string().nullable()),
    )
}

#[test]
fn test_context_wires_shared_document() {
    let ctx = context();
    assert_eq!(ctx.config.env, Env::Dev);

    ctx.swagger()
        .with_info(Info::new("Pets", "2.0.0").with_description("Pet store"))
        .with_servers(vec![Server::new("https://api.example.com")])
        .with_security_schemes([("BearerAuth", SecurityScheme::bearer_auth())])
        .with_schemas([("Pet", pet_schema())])
        .with_default_security(vec![swg::security("BearerAuth")]);

    let mut pets = ctx.router(PathItemConfig::new().with_tags(["pets"]));
    pets.add_route(
        Route::get("/pets/:id").doc(RouteDoc::new().with_responses(
            [("200".to_string(), swg::json_schema_ref("Pet").with_description("A pet"))]
                .into_iter()
                .collect(),
        )),
        vec![noop()],
    );

    let json = ctx.document.to_json().unwrap();
    assert_eq!(json["openapi"], OPENAPI_VERSION);
    assert_eq!(json["info"], json!({"title": "Pets", "version": "2.0.0", "description": "Pet store"}));
    assert_eq!(json["servers"], json!([{"url": "https://api.example.com"}]));
    assert_eq!(json["security"], json!([{"BearerAuth": []}]));
    assert_eq!(
        json["components"]["securitySchemes"]["BearerAuth"],
        json!({"type": "http", "scheme": "bearer"})
    );
    assert_eq!(
        json["components"]["schemas"]["Pet"],
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "name": {"type": "string"},
                "tag": {"type": "string", "nullable": true}
            },
            "required": ["id", "name"]
        })
    );
    assert_eq!(
        json["paths"]["/pets/{id}"]["get"]["responses"]["200"],
        json!({
            "description": "A pet",
            "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}
        })
    );
    assert_eq!(json["paths"]["/pets/{id}"]["get"]["tags"], json!(["pets"]));
}

#[test]
fn test_composition_schemas_serialize_with_keyword() {
    let ctx = context();
    let dog = Schema::all_of(vec![
        Schema::reference("Pet"),
        Schema::object(ObjectSchema::new().required_property("barks", Schema::boolean())),
    ]);
    let id = Schema::one_of(vec![Schema::integer(), Schema::formatted_string("uuid")]);
    ctx.swagger().with_schemas([("Dog", dog), ("Id", id)]);

    let json = ctx.document.to_json().unwrap();
    assert_eq!(
        json["components"]["schemas"]["Dog"],
        json!({"allOf": [
            {"$ref": "#/components/schemas/Pet"},
            {"type": "object", "properties": {"barks": {"type": "boolean"}}, "required": ["barks"]}
        ]})
    );
    assert_eq!(
        json["components"]["schemas"]["Id"],
        json!({"oneOf": [{"type": "integer"}, {"type": "string", "format": "uuid"}]})
    );
}

#[test]
fn test_yaml_output_reads_back_as_same_document() {
    let ctx = context();
    ctx.swagger().with_info(Info::new("Pets", "1.0.0"));
    let mut pets = ctx.router(PathItemConfig::new());
    pets.add_route(
        Route::post("/pets").doc(RouteDoc::new().with_request_body(swg::json_schema_ref("Pet"))),
        vec![noop()],
    );

    let yaml = ctx.document.to_yaml().unwrap();
    assert!(yaml.contains("/pets:"));
    assert!(yaml.contains("requestBody:"));

    let reparsed: OpenApiDocument = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(reparsed, ctx.document.snapshot());
}

#[test]
fn test_undefined_security_reference_is_reported_not_rejected() {
    let ctx = context();
    ctx.swagger()
        .with_security_schemes([("BearerAuth", SecurityScheme::bearer_auth())]);
    let mut admin = ctx.router(PathItemConfig::new().with_security(vec![swg::security("ApiKey")]));
    admin.add_route(Route::delete("/pets/:id"), vec![noop()]);

    let doc = ctx.document.snapshot();
    assert!(doc.operation("/pets/{id}", HttpMethod::Delete).is_some());
    assert_eq!(doc.undefined_security_references(), vec!["ApiKey".to_string()]);
}

#[test]
fn test_reregistration_overwrites_operation() {
    let ctx = context();
    let mut pets = ctx.router(PathItemConfig::new());
    pets.add_route(Route::get("/pets").doc(RouteDoc::new().with_summary("first")), vec![noop()]);
    pets.add_route(Route::get("/pets").doc(RouteDoc::new().with_summary("second")), vec![noop()]);

    let doc = ctx.document.snapshot();
    let op = doc.operation("/pets", HttpMethod::Get).unwrap();
    assert_eq!(op.summary.as_deref(), Some("second"));
    assert_eq!(pets.router().len(), 2);
}
