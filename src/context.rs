//! Application context: the shared document, configuration and alerting,
//! created once at startup and handed to whatever needs them.

use crate::config::AppConfig;
use crate::docs::DocsMount;
use crate::error::{AlertHandler, ErrorHandler};
use crate::openapi::{SharedDocument, SwaggerBuilder};
use crate::router::{ExpressiveRouter, PathItemConfig};
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub document: SharedDocument,
    alert_handler: Option<Arc<dyn AlertHandler>>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("alert_handler", &self.alert_handler.is_some())
            .finish_non_exhaustive()
    }
}

impl AppContext {
    #[must_use]
    pub fn new(config: AppConfig, document: SharedDocument) -> Self {
        Self {
            config,
            document,
            alert_handler: None,
        }
    }

    #[must_use]
    pub fn with_alert_handler(mut self, handler: Arc<dyn AlertHandler>) -> Self {
        self.alert_handler = Some(handler);
        self
    }

    /// Builder over the context's document.
    #[must_use]
    pub fn swagger(&self) -> SwaggerBuilder {
        SwaggerBuilder::new(self.document.clone())
    }

    /// A route group documenting into the context's document.
    #[must_use]
    pub fn router(&self, group: PathItemConfig) -> ExpressiveRouter {
        ExpressiveRouter::with_group_defaults(self.document.clone(), group)
    }

    /// Error pipeline for the configured environment, with the alert handler
    /// attached when one is set.
    #[must_use]
    pub fn error_handler(&self) -> ErrorHandler {
        let handler = ErrorHandler::new(self.config.env.clone());
        match &self.alert_handler {
            Some(alert) => handler.with_alert_handler(Arc::clone(alert)),
            None => handler,
        }
    }

    pub fn docs(&self, mount: &str) -> Result<DocsMount, minijinja::Error> {
        DocsMount::new(mount, self.document.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Env;
    use crate::openapi::{HttpMethod, Info};
    use crate::router::Route;

    fn config(env: &str) -> AppConfig {
        AppConfig::from_lookup(|name| (name == "ENV").then(|| env.to_string())).unwrap()
    }

    #[test]
    fn test_everything_shares_one_document() {
        let ctx = AppContext::new(config("dev"), SharedDocument::default());
        let doc = ctx.swagger().with_info(Info::new("Svc", "2.0.0")).get();
        assert!(doc.same_instance(&ctx.document));

        let mut users = ctx.router(PathItemConfig::new().with_tags(["users"]));
        users.add_route(Route::get("/users"), Vec::new());
        assert_eq!(
            ctx.document.read().operation("/users", HttpMethod::Get).unwrap().tags,
            Some(vec!["users".to_string()])
        );
    }

    #[test]
    fn test_error_handler_follows_env() {
        let ctx = AppContext::new(config("prod"), SharedDocument::default());
        assert_eq!(ctx.error_handler().env(), &Env::Prod);
    }
}
