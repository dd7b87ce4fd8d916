use anyhow::Context;
use clap::Parser;
use expressive::common::{parse_default_pagination, parse_id_or_fail, PaginationQuery};
use expressive::config::AppConfig;
use expressive::dispatcher::{handler, Flow, HandlerRequest, HandlerResult};
use expressive::error::{ApiError, HandlerError};
use expressive::logging::init_logging;
use expressive::middleware::{AccessLogMiddleware, SecurityHeadersMiddleware};
use expressive::openapi::{
    swg, Content, Info, ObjectSchema, Responses, Schema, SecurityScheme, Server, SharedDocument,
};
use expressive::response::ApiResponse;
use expressive::router::{PathItemConfig, Route, RouteDoc};
use expressive::{App, AppContext, HttpServer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Demo users API with live Swagger docs
#[derive(Parser)]
#[command(name = "expressive-demo", version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "ADDR", default_value = "127.0.0.1:8080")]
    addr: String,

    /// Where to mount the Swagger UI
    #[arg(long, default_value = "/docs")]
    docs_path: String,

    /// Worker threads (defaults to available parallelism)
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
struct User {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct NewUser {
    name: String,
}

#[derive(Default)]
struct UserStore {
    next_id: u64,
    users: BTreeMap<u64, User>,
}

type SharedStore = Arc<Mutex<UserStore>>;

fn lock(store: &SharedStore) -> Result<MutexGuard<'_, UserStore>, HandlerError> {
    store
        .lock()
        .map_err(|_| HandlerError::msg("user store lock poisoned"))
}

fn user_schema() -> Schema {
    Schema::object(
        ObjectSchema::new()
            .required_property("id", Schema::integer())
            .required_property("name", Schema::string()),
    )
}

fn ok_response(description: &str, schema: Schema) -> Responses {
    let mut responses = Responses::new();
    responses.insert(
        "200".to_string(),
        Content::default()
            .with_description(description)
            .with_media_type(swg::APPLICATION_JSON, schema),
    );
    responses
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let _log_guard = init_logging(&config.log_config())?;

    let ctx = AppContext::new(config, SharedDocument::default());
    ctx.swagger()
        .with_info(
            Info::new("Users API", env!("CARGO_PKG_VERSION")).with_description("expressive demo"),
        )
        .with_servers(vec![Server::new(format!("http://{}", cli.addr))])
        .with_security_schemes([("BearerAuth", SecurityScheme::bearer_auth())])
        .with_schemas([("User", user_schema())]);

    let store: SharedStore = Arc::new(Mutex::new(UserStore::default()));
    let mut users = ctx.router(PathItemConfig::new().with_tags(["users"]));

    let list_store = Arc::clone(&store);
    users.add_route(
        Route::get("/users").doc(
            RouteDoc::new()
                .with_summary("List users")
                .with_query_parameters(vec![
                    swg::query_param("limit", Schema::integer()).optional(),
                    swg::query_param("page", Schema::integer()).optional(),
                ])
                .with_responses(ok_response("Users", Schema::array(Schema::reference("User")))),
        ),
        vec![handler(move |req: &mut HandlerRequest| -> HandlerResult {
            let page = parse_default_pagination(&PaginationQuery::from_request(req));
            let store = lock(&list_store)?;
            let listed: Vec<User> = store
                .users
                .values()
                .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
                .take(usize::try_from(page.limit).unwrap_or(usize::MAX))
                .cloned()
                .collect();
            Ok(Flow::Respond(ApiResponse::ok(listed).into_response(200)?))
        })],
    );

    let get_store = Arc::clone(&store);
    users.add_route(
        Route::get("/users/:id").doc(
            RouteDoc::new()
                .with_summary("Get a user")
                .with_header_parameters(vec![
                    swg::header_param("X-Trace", Schema::string()).optional()
                ])
                .with_responses(ok_response("User", Schema::reference("User"))),
        ),
        vec![handler(move |req: &mut HandlerRequest| -> HandlerResult {
            let id = parse_id_or_fail(req.get_path_param("id").unwrap_or_default())?;
            let user = lock(&get_store)?
                .users
                .get(&id)
                .cloned()
                .ok_or_else(ApiError::not_found)?;
            Ok(Flow::Respond(ApiResponse::ok(user).into_response(200)?))
        })],
    );

    let create_store = Arc::clone(&store);
    users.add_route(
        Route::post("/users").doc(
            RouteDoc::new()
                .with_summary("Create a user")
                .with_security(vec![swg::security("BearerAuth")])
                .with_request_body(swg::json_schema(Schema::object(
                    ObjectSchema::new().required_property("name", Schema::string()),
                ))),
        ),
        vec![
            handler(|req: &mut HandlerRequest| -> HandlerResult {
                match req.get_header("authorization") {
                    Some(value) if value.starts_with("Bearer ") => {
                        req.user_id = Some(value.trim_start_matches("Bearer ").to_string());
                        Ok(Flow::Next)
                    }
                    _ => Err(ApiError::user_unauthorized().into()),
                }
            }),
            handler(move |req: &mut HandlerRequest| -> HandlerResult {
                let new_user: NewUser = req.body_as()?;
                let mut store = lock(&create_store)?;
                if store.users.values().any(|u| u.name == new_user.name) {
                    return Err(ApiError::duplicate().into());
                }
                store.next_id += 1;
                let user = User {
                    id: store.next_id,
                    name: new_user.name,
                };
                store.users.insert(user.id, user.clone());
                info!(user_id = user.id, created_by = ?req.user_id, "User created");
                Ok(Flow::Respond(ApiResponse::ok(user).into_response(201)?))
            }),
        ],
    );

    let docs = ctx.docs(&cli.docs_path).context("Failed to render docs page")?;
    let app = App::new(ctx.error_handler())
        .with_middleware(AccessLogMiddleware::new())
        .with_middleware(SecurityHeadersMiddleware::new())
        .with_docs(docs)
        .mount(users.into_router());

    let mut server = HttpServer::new(app);
    if let Some(workers) = cli.workers {
        server = server.with_workers(workers);
    }
    let handle = server
        .start(cli.addr.as_str())
        .with_context(|| format!("Failed to bind {}", cli.addr))?;
    info!(addr = %handle.addr(), docs = %cli.docs_path, "Demo listening");

    handle
        .join()
        .map_err(|_| anyhow::anyhow!("HTTP worker panicked"))?;
    Ok(())
}
